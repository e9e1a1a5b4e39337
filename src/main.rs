//! ChronoLens
//!
//! A desktop app for comparing generated timelines of historical topics side by side.

mod api;
mod app;
mod settings;
mod store;
mod theme;
mod timeline;

use eframe::egui;

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("ChronoLens"),
        persist_window: true, // Persist window state and egui memory between sessions
        ..Default::default()
    };

    eframe::run_native(
        "ChronoLens",
        options,
        Box::new(|cc| Ok(Box::new(app::ChronoLensApp::new(cc)))),
    )
}
