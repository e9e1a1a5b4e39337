//! Color palette and sizing constants for the timeline board.

use egui::Color32;

/// Background colors for different layers
pub mod bg {
    use super::*;

    /// Board background - darkest layer
    pub const BOARD: Color32 = Color32::from_rgb(14, 17, 23);

    /// Header panel background
    pub const PANEL: Color32 = Color32::from_rgb(20, 22, 28);

    /// Event card background
    pub const CARD: Color32 = Color32::from_rgb(28, 30, 38);

    /// Card background under the pointer
    pub const CARD_HOVER: Color32 = Color32::from_rgb(38, 41, 52);

    /// Column title bar
    pub const COLUMN_HEADER: Color32 = Color32::from_rgb(35, 38, 48);

    /// Notification background
    pub const TOAST: Color32 = Color32::from_rgb(60, 24, 28);
}

/// Accent colors
pub mod accent {
    use super::*;

    /// Cursor line and label
    pub const ORANGE: Color32 = Color32::from_rgb(255, 149, 0);

    /// Cursor line, translucent
    pub fn orange_subtle() -> Color32 {
        Color32::from_rgba_unmultiplied(255, 149, 0, 90)
    }

    /// Errors and destructive actions
    pub const RED: Color32 = Color32::from_rgb(239, 68, 68);
}

/// Text colors at different emphasis levels
pub mod text {
    use super::*;

    pub const PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);

    pub const SECONDARY: Color32 = Color32::from_rgb(180, 180, 190);

    /// Scale labels, dates, gap markers
    pub const MUTED: Color32 = Color32::from_rgb(120, 125, 135);
}

/// Lines and borders
pub mod border {
    use super::*;

    /// Background grid lines at scale ticks
    pub const GRID: Color32 = Color32::from_rgb(30, 33, 41);

    /// Column axis lines and card outlines
    pub const DEFAULT: Color32 = Color32::from_rgb(55, 58, 65);

    /// Dashed edges of compressed gaps
    pub const GAP: Color32 = Color32::from_rgb(80, 85, 95);
}

/// Board geometry in pixels
pub mod size {
    /// Width of the year scale on the left
    pub const SCALE_WIDTH: f32 = 96.0;

    /// Horizontal space between columns
    pub const COLUMN_GAP: f32 = 32.0;

    /// Height of the sticky column title bar
    pub const HEADER_HEIGHT: f32 = 44.0;

    /// Space between the title bar and the start of the axis
    pub const AXIS_TOP_MARGIN: f32 = 24.0;

    /// Space below the last card
    pub const BOTTOM_MARGIN: f32 = 48.0;

    /// Gap between a column's axis line and its cards
    pub const CARD_INSET: f32 = 14.0;

    pub const DOT_RADIUS: f32 = 4.5;
}

/// Accent color for the column at `index`, spread around the hue wheel.
pub fn column_color(index: usize) -> Color32 {
    // Golden angle keeps neighbouring columns distinct
    let hue = (index as f32 * 137.5 + 30.0) % 360.0;
    hsl_to_rgb(hue, 0.7, 0.55)
}

/// Convert HSL to RGB color
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color32 {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Color32::from_rgb(
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}
