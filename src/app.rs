//! Main application state and UI.

use crate::api::{EventSource, FetchError, GenerativeClient};
use crate::settings::{Settings, MAX_ZOOM, MIN_ZOOM};
use crate::store::TimelineStore;
use crate::theme::{self, accent, bg, border, size, text};
use crate::timeline::{PositionedEvent, RawEvent, Side, Timeline, TimelineFrame};
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, RichText, Sense, Shape, Stroke, Vec2};
use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

const ZOOM_STEP: f32 = 1.5;

/// How long a notification stays up unless dismissed
const NOTIFICATION_TTL: Duration = Duration::from_secs(8);

pub fn zoom_in(zoom: f32) -> f32 {
    (zoom * ZOOM_STEP).min(MAX_ZOOM)
}

pub fn zoom_out(zoom: f32) -> f32 {
    (zoom / ZOOM_STEP).max(MIN_ZOOM)
}

pub fn can_zoom_in(zoom: f32) -> bool {
    zoom < MAX_ZOOM
}

pub fn can_zoom_out(zoom: f32) -> bool {
    zoom > MIN_ZOOM
}

/// Why a topic did not become a timeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AddTimelineError {
    #[error("Topic cannot be empty.")]
    EmptyTopic,
    #[error("A timeline for \"{0}\" is already on display.")]
    Duplicate(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl AddTimelineError {
    pub fn title(&self) -> &'static str {
        match self {
            AddTimelineError::Duplicate(_) => "Timeline exists",
            AddTimelineError::EmptyTopic | AddTimelineError::Fetch(_) => "Error",
        }
    }

    pub fn description(&self) -> String {
        match self {
            AddTimelineError::Fetch(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Displayed timelines plus the topics still being fetched.
///
/// Pure state: no I/O, no threads. The app drives it and persists the result.
#[derive(Debug, Default)]
pub struct Board {
    timelines: Vec<Timeline>,
    pending: Vec<String>,
}

impl Board {
    pub fn new(timelines: Vec<Timeline>) -> Self {
        Self {
            timelines,
            pending: Vec::new(),
        }
    }

    pub fn timelines(&self) -> &[Timeline] {
        &self.timelines
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn is_fetching(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Validate a topic and mark it pending. Returns the trimmed topic to fetch.
    pub fn begin_fetch(&mut self, topic: &str) -> Result<String, AddTimelineError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AddTimelineError::EmptyTopic);
        }
        if self.has_topic(topic) || self.pending.iter().any(|p| same_topic(p, topic)) {
            return Err(AddTimelineError::Duplicate(topic.to_string()));
        }
        self.pending.push(topic.to_string());
        Ok(topic.to_string())
    }

    /// Resolve a pending fetch. On success the new timeline's id is returned;
    /// on any failure the displayed timelines are left untouched.
    pub fn complete_fetch(
        &mut self,
        topic: &str,
        result: Result<Vec<RawEvent>, FetchError>,
        now_millis: i64,
    ) -> Result<String, AddTimelineError> {
        if let Some(index) = self.pending.iter().position(|p| p == topic) {
            self.pending.remove(index);
        }

        let events = result?;
        if events.is_empty() {
            return Err(FetchError::NoEvents.into());
        }
        // A timeline may have been restored or added while this one was in flight
        if self.has_topic(topic) {
            return Err(AddTimelineError::Duplicate(topic.to_string()));
        }

        let id = self.unique_id(&format!("{}{}", topic.to_lowercase(), now_millis));
        self.timelines.push(Timeline {
            id: id.clone(),
            title: topic.to_string(),
            events,
        });
        Ok(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Timeline> {
        let index = self.timelines.iter().position(|t| t.id == id)?;
        Some(self.timelines.remove(index))
    }

    pub fn clear(&mut self) {
        self.timelines.clear();
    }

    fn has_topic(&self, topic: &str) -> bool {
        self.timelines.iter().any(|t| same_topic(&t.title, topic))
    }

    fn unique_id(&self, base: &str) -> String {
        let taken = |id: &str| self.timelines.iter().any(|t| t.id == id);
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}-{}", base, n))
            .find(|id| !taken(id.as_str()))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Topics compare case-insensitively, Unicode included.
fn same_topic(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// One event card, stable across frames while its timeline is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardKey {
    pub timeline_id: String,
    /// Position in the column's chronological order
    pub index: usize,
}

/// A dismissible message in the corner of the window.
#[derive(Debug, Clone)]
pub struct Notification {
    pub title: String,
    pub description: String,
    created: Instant,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            created: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created) >= NOTIFICATION_TTL
    }
}

/// Something clicked on the canvas, applied after painting
enum BoardAction {
    Remove(String),
    ToggleCard(CardKey),
}

/// A fetch running on a worker thread
struct PendingFetch {
    topic: String,
    receiver: Receiver<Result<Vec<RawEvent>, FetchError>>,
}

pub struct ChronoLensApp {
    board: Board,
    source: Arc<dyn EventSource>,
    store: TimelineStore,
    pending: Vec<PendingFetch>,
    /// Topic fetched automatically on first launch, if any
    seed_topic: Option<String>,

    // Derived layout, rebuilt after any input change
    frame: Option<TimelineFrame>,
    /// Cards showing their description
    expanded_cards: HashSet<CardKey>,

    // Header state
    topic_input: String,
    notifications: Vec<Notification>,

    // Settings persistence
    settings: Settings,
    settings_dirty: bool,
    last_settings_save: Instant,
}

impl ChronoLensApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::load();
        let source = GenerativeClient::from_env(settings.api_base_url.clone(), settings.model.clone());
        Self::with_source(settings, TimelineStore::new(), Arc::new(source))
    }

    pub fn with_source(settings: Settings, store: TimelineStore, source: Arc<dyn EventSource>) -> Self {
        let stored = store.load();
        let first_launch = stored.is_none() && !store.exists();

        let mut app = Self {
            board: Board::new(stored.unwrap_or_default()),
            source,
            store,
            pending: Vec::new(),
            seed_topic: None,
            frame: None,
            expanded_cards: HashSet::new(),
            topic_input: String::new(),
            notifications: Vec::new(),
            settings,
            settings_dirty: false,
            last_settings_save: Instant::now(),
        };

        if first_launch {
            if let Some(topic) = app.settings.seed_topic.clone() {
                tracing::info!("No stored timelines, fetching seed topic {:?}", topic);
                app.seed_topic = Some(topic.clone());
                app.add_timeline(&topic);
            }
        }

        app
    }

    #[cfg(test)]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    #[cfg(test)]
    pub fn zoom(&self) -> f32 {
        self.settings.zoom
    }

    /// Start fetching a topic. Returns false if the topic was rejected up front.
    pub fn add_timeline(&mut self, topic: &str) -> bool {
        let topic = match self.board.begin_fetch(topic) {
            Ok(topic) => topic,
            Err(e) => {
                tracing::debug!("Rejected topic {:?}: {}", topic, e);
                self.notify(e.title(), e.description());
                return false;
            }
        };

        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let fetch_topic = topic.clone();
        std::thread::spawn(move || {
            let result = source.fetch_events(&fetch_topic);
            let _ = tx.send(result);
        });

        tracing::info!("Fetching timeline for {:?}", topic);
        self.pending.push(PendingFetch { topic, receiver: rx });
        true
    }

    /// Collect finished fetches. Returns true while any are still running.
    pub fn poll_fetches(&mut self) -> bool {
        let mut finished = Vec::new();
        self.pending.retain(|fetch| match fetch.receiver.try_recv() {
            Ok(result) => {
                finished.push((fetch.topic.clone(), result));
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                finished.push((
                    fetch.topic.clone(),
                    Err(FetchError::Request("fetch worker exited".to_string())),
                ));
                false
            }
        });

        for (topic, result) in finished {
            self.finish_fetch(&topic, result);
        }
        !self.pending.is_empty()
    }

    fn finish_fetch(&mut self, topic: &str, result: Result<Vec<RawEvent>, FetchError>) {
        let now_millis = chrono::Utc::now().timestamp_millis();
        let is_seed = self.seed_topic.as_deref() == Some(topic);
        if is_seed {
            self.seed_topic = None;
        }

        match self.board.complete_fetch(topic, result, now_millis) {
            Ok(id) => {
                tracing::info!("Added timeline {:?} ({})", topic, id);
                self.timelines_changed();
            }
            Err(e) => {
                tracing::warn!("Could not add timeline {:?}: {}", topic, e);
                let title = if is_seed { "Could not load initial timeline" } else { e.title() };
                self.notify(title, e.description());
            }
        }
    }

    pub fn remove_timeline(&mut self, id: &str) {
        if let Some(removed) = self.board.remove(id) {
            tracing::info!("Removed timeline {:?}", removed.title);
            self.expanded_cards.retain(|key| key.timeline_id != id);
            self.timelines_changed();
        }
    }

    pub fn clear_all(&mut self) {
        self.board.clear();
        self.store.clear();
        self.expanded_cards.clear();
        self.frame = None;
    }

    /// Expand a collapsed card or collapse an expanded one.
    pub fn toggle_card(&mut self, key: CardKey) {
        if !self.expanded_cards.remove(&key) {
            self.expanded_cards.insert(key);
        }
    }

    pub fn is_expanded(&self, key: &CardKey) -> bool {
        self.expanded_cards.contains(key)
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if zoom != self.settings.zoom {
            self.settings.zoom = zoom;
            self.frame = None;
            self.mark_settings_dirty();
        }
    }

    fn timelines_changed(&mut self) {
        self.store.save(self.board.timelines());
        self.frame = None;
    }

    fn notify(&mut self, title: &str, description: String) {
        self.notifications.push(Notification::new(title, description));
    }

    fn expire_notifications(&mut self) {
        let now = Instant::now();
        self.notifications.retain(|n| !n.is_expired(now));
    }

    /// Mark settings as needing to be saved
    fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    /// Save settings if dirty and enough time has passed (debounce)
    fn maybe_save_settings(&mut self) {
        if self.settings_dirty && self.last_settings_save.elapsed().as_secs() >= 2 {
            self.settings.save();
            self.settings_dirty = false;
            self.last_settings_save = Instant::now();
        }
    }

    fn derive_frame(&self) -> TimelineFrame {
        TimelineFrame::derive(
            self.board.timelines(),
            self.settings.zoom,
            self.settings.layout_config(),
        )
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(RichText::new("ChronoLens").strong().color(text::PRIMARY));
            ui.add_space(16.0);

            let input = ui.add(
                egui::TextEdit::singleline(&mut self.topic_input)
                    .hint_text("Add timeline (e.g., 'Albert Einstein')")
                    .desired_width(280.0),
            );
            let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Add").clicked() || submitted {
                let topic = self.topic_input.clone();
                if self.add_timeline(&topic) {
                    self.topic_input.clear();
                }
            }

            if self.board.is_fetching() {
                ui.spinner();
                ui.label(
                    RichText::new(format!("Generating {}", self.board.pending().join(", ")))
                        .color(text::MUTED),
                );
            }

            ui.separator();

            let zoom = self.settings.zoom;
            if ui
                .add_enabled(can_zoom_out(zoom), egui::Button::new("➖"))
                .on_hover_text("Zoom out")
                .clicked()
            {
                self.set_zoom(zoom_out(zoom));
            }
            ui.label(format!("{:.0}%", self.settings.zoom * 100.0));
            if ui
                .add_enabled(can_zoom_in(zoom), egui::Button::new("➕"))
                .on_hover_text("Zoom in")
                .clicked()
            {
                self.set_zoom(zoom_in(zoom));
            }

            ui.separator();

            if ui
                .checkbox(&mut self.settings.compress_gaps, "Compress gaps")
                .on_hover_text(format!(
                    "Squeeze stretches longer than {:.0} years with no events",
                    self.settings.gap_threshold_years
                ))
                .changed()
            {
                self.frame = None;
                self.mark_settings_dirty();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if !self.board.is_empty() && ui.button("Clear All").clicked() {
                    self.clear_all();
                }
            });
        });
    }

    fn render_board(&mut self, ui: &mut egui::Ui) {
        if self.board.is_empty() {
            if self.board.is_fetching() {
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() / 3.0);
                    ui.spinner();
                    ui.label(RichText::new("Generating timeline...").color(text::MUTED));
                });
            } else {
                render_empty_state(ui);
            }
            return;
        }

        let frame = match self.frame.take() {
            Some(frame) => frame,
            None => self.derive_frame(),
        };
        let action = self.paint_board(ui, &frame);
        self.frame = Some(frame);

        match action {
            Some(BoardAction::Remove(id)) => self.remove_timeline(&id),
            Some(BoardAction::ToggleCard(key)) => self.toggle_card(key),
            None => {}
        }
    }

    /// Paint the whole board and report what was clicked.
    fn paint_board(&self, ui: &mut egui::Ui, frame: &TimelineFrame) -> Option<BoardAction> {
        let column_width = self.settings.column_width;
        let card_height = frame.config.cards.card_height as f32;
        let axis_offset = size::HEADER_HEIGHT + size::AXIS_TOP_MARGIN;
        let content_width =
            size::SCALE_WIDTH + frame.columns.len() as f32 * (column_width + size::COLUMN_GAP);
        let content_height = axis_offset + frame.content_height() as f32 + size::BOTTOM_MARGIN;

        let mut action = None;

        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show_viewport(ui, |ui, viewport| {
                let desired = Vec2::new(
                    content_width.max(ui.available_width()),
                    content_height.max(ui.available_height()),
                );
                let (response, painter) = ui.allocate_painter(desired, Sense::click());
                let origin = response.rect.min;
                let clip = ui.clip_rect();
                let axis_top = origin.y + axis_offset;
                let pointer = response.hover_pos();

                // Only ticks inside the viewport are computed
                let visible_top = (viewport.min.y - axis_offset) as f64;
                let visible_bottom = (viewport.max.y - axis_offset) as f64;
                let ticks = frame.ticks_between(visible_top, visible_bottom);

                for (y, _) in &ticks {
                    painter.hline(clip.x_range(), axis_top + *y as f32, Stroke::new(1.0, border::GRID));
                }

                for marker in frame.gap_markers() {
                    let top = axis_top + marker.y as f32;
                    let height = marker.height as f32;
                    let bottom = top + height;
                    painter.rect_filled(
                        Rect::from_x_y_ranges(clip.x_range(), top..=bottom),
                        0.0,
                        bg::PANEL,
                    );
                    for y in [top, bottom] {
                        painter.extend(Shape::dashed_line(
                            &[Pos2::new(clip.left(), y), Pos2::new(clip.right(), y)],
                            Stroke::new(1.0, border::GAP),
                            6.0,
                            4.0,
                        ));
                    }
                    painter.text(
                        Pos2::new(clip.center().x, top + height / 2.0),
                        Align2::CENTER_CENTER,
                        marker.label(),
                        FontId::proportional(13.0),
                        text::MUTED,
                    );
                }

                // Expanded cards are painted last so they sit on top
                let mut card_hits: Vec<(Rect, CardKey)> = Vec::new();
                let mut expanded = Vec::new();
                for (column_index, column) in frame.columns.iter().enumerate() {
                    let color = theme::column_color(column_index);
                    let left = origin.x
                        + size::SCALE_WIDTH
                        + column_index as f32 * (column_width + size::COLUMN_GAP);
                    let axis_x = left + column_width / 2.0;
                    let geometry = EventGeometry {
                        axis_x,
                        axis_top,
                        card_width: column_width / 2.0 - size::CARD_INSET - 4.0,
                        card_height,
                        color,
                    };

                    painter.vline(
                        axis_x,
                        axis_top..=axis_top + frame.axis_height() as f32,
                        Stroke::new(2.0, border::DEFAULT),
                    );

                    for (index, event) in column.events.iter().enumerate() {
                        let key = CardKey {
                            timeline_id: column.timeline_id.clone(),
                            index,
                        };
                        if self.is_expanded(&key) {
                            expanded.push((key, event, geometry));
                        } else if let Some(rect) = paint_event(&painter, clip, pointer, event, geometry, false) {
                            card_hits.push((rect, key));
                        }
                    }
                }
                for (key, event, geometry) in expanded {
                    if let Some(rect) = paint_event(&painter, clip, pointer, event, geometry, true) {
                        card_hits.push((rect, key));
                    }
                }

                if response.clicked() {
                    if let Some(click) = response.interact_pointer_pos() {
                        action = card_hits
                            .into_iter()
                            .rev()
                            .find(|(rect, _)| rect.contains(click))
                            .map(|(_, key)| BoardAction::ToggleCard(key));
                    }
                }

                // Scale gutter stays pinned to the left edge
                let gutter = Rect::from_x_y_ranges(
                    clip.left()..=clip.left() + size::SCALE_WIDTH - 8.0,
                    clip.y_range(),
                );
                painter.rect_filled(gutter, 0.0, bg::BOARD);
                for (y, tick) in &ticks {
                    painter.text(
                        Pos2::new(gutter.right() - 8.0, axis_top + *y as f32),
                        Align2::RIGHT_CENTER,
                        &tick.label,
                        FontId::proportional(12.0),
                        text::MUTED,
                    );
                }

                // Column headers stick to the top of the viewport
                let header_top = origin.y.max(clip.top());
                for (index, column) in frame.columns.iter().enumerate() {
                    let left = origin.x
                        + size::SCALE_WIDTH
                        + index as f32 * (column_width + size::COLUMN_GAP);
                    let header = Rect::from_min_size(
                        Pos2::new(left, header_top + 4.0),
                        Vec2::new(column_width, size::HEADER_HEIGHT - 8.0),
                    );
                    painter.rect_filled(header, 6.0, bg::COLUMN_HEADER);
                    painter.rect_filled(
                        Rect::from_min_size(header.min, Vec2::new(4.0, header.height())),
                        2.0,
                        theme::column_color(index),
                    );

                    let mut subtitle = format!("{} events", column.events.len());
                    if column.dropped > 0 {
                        subtitle.push_str(&format!(", {} undated", column.dropped));
                    }
                    let title = painter.layout(
                        column.title.clone(),
                        FontId::proportional(15.0),
                        text::PRIMARY,
                        column_width - 60.0,
                    );
                    painter.with_clip_rect(header.shrink(2.0)).galley(
                        Pos2::new(header.left() + 14.0, header.top() + 3.0),
                        title,
                        text::PRIMARY,
                    );
                    painter.text(
                        Pos2::new(header.left() + 14.0, header.bottom() - 4.0),
                        Align2::LEFT_BOTTOM,
                        subtitle,
                        FontId::proportional(11.0),
                        text::MUTED,
                    );

                    let button_rect = Rect::from_center_size(
                        Pos2::new(header.right() - 18.0, header.center().y),
                        Vec2::splat(22.0),
                    );
                    if ui
                        .put(button_rect, egui::Button::new("✕").frame(false))
                        .on_hover_text("Remove timeline")
                        .clicked()
                    {
                        action = Some(BoardAction::Remove(column.timeline_id.clone()));
                    }
                }

                if let Some(pointer) = pointer {
                    let y = (pointer.y - axis_top) as f64;
                    if (0.0..=frame.axis_height()).contains(&y) {
                        painter.hline(
                            clip.x_range(),
                            pointer.y,
                            Stroke::new(1.0, accent::orange_subtle()),
                        );
                        let label = painter.layout_no_wrap(
                            frame.cursor_label(y),
                            FontId::proportional(12.0),
                            accent::ORANGE,
                        );
                        let pos = Pos2::new(clip.left() + 6.0, pointer.y - label.size().y - 4.0);
                        painter.rect_filled(
                            Rect::from_min_size(pos, label.size()).expand(3.0),
                            3.0,
                            bg::PANEL,
                        );
                        painter.galley(pos, label, accent::ORANGE);
                    }
                }
            });

        action
    }

    fn render_notifications(&mut self, ctx: &egui::Context) {
        if self.notifications.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("notifications"))
            .anchor(Align2::RIGHT_BOTTOM, Vec2::new(-16.0, -16.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for (index, notification) in self.notifications.iter().enumerate() {
                    egui::Frame::none()
                        .fill(bg::TOAST)
                        .stroke(Stroke::new(1.0, accent::RED))
                        .rounding(6.0)
                        .inner_margin(egui::Margin::same(10.0))
                        .show(ui, |ui| {
                            ui.set_max_width(340.0);
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(&notification.title).strong().color(text::PRIMARY));
                                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                    if ui.small_button("✕").clicked() {
                                        dismissed = Some(index);
                                    }
                                });
                            });
                            ui.label(RichText::new(&notification.description).color(text::SECONDARY));
                        });
                    ui.add_space(6.0);
                }
            });

        if let Some(index) = dismissed {
            self.notifications.remove(index);
        }
    }
}

/// Where one column's cards go on screen
#[derive(Clone, Copy)]
struct EventGeometry {
    axis_x: f32,
    axis_top: f32,
    card_width: f32,
    card_height: f32,
    color: Color32,
}

/// Paint one event's dot, connector and card. Returns the card's rect when visible.
///
/// Collapsed cards show the date and title at the layout height; expanded
/// cards grow to fit the description.
fn paint_event(
    painter: &egui::Painter,
    clip: Rect,
    pointer: Option<Pos2>,
    event: &PositionedEvent,
    geometry: EventGeometry,
    expanded: bool,
) -> Option<Rect> {
    const PADDING: f32 = 8.0;
    const CHEVRON_WIDTH: f32 = 16.0;

    let anchor = Pos2::new(geometry.axis_x, geometry.axis_top + event.event_y as f32);
    let card_top = geometry.axis_top + event.card_y as f32;
    let card_left = match event.side {
        Side::Left => geometry.axis_x - size::CARD_INSET - geometry.card_width,
        Side::Right => geometry.axis_x + size::CARD_INSET,
    };
    let collapsed = Rect::from_min_size(
        Pos2::new(card_left, card_top),
        Vec2::new(geometry.card_width, geometry.card_height),
    );
    let dot = Rect::from_center_size(anchor, Vec2::splat(size::DOT_RADIUS * 2.0));
    if !expanded && !clip.intersects(collapsed.union(dot)) {
        return None;
    }

    let text_width = geometry.card_width - 2.0 * PADDING;
    let date = painter.layout_no_wrap(event.raw.date.clone(), FontId::proportional(11.0), geometry.color);
    let title = painter.layout(
        event.raw.title.clone(),
        FontId::proportional(14.0),
        text::PRIMARY,
        text_width - CHEVRON_WIDTH,
    );
    let body = expanded.then(|| {
        painter.layout(
            event.raw.event.clone(),
            FontId::proportional(12.0),
            text::SECONDARY,
            text_width,
        )
    });

    let title_top = card_top + PADDING + date.size().y + 2.0;
    let body_top = title_top + title.size().y + 6.0;
    let height = match &body {
        Some(body) => (body_top + body.size().y + PADDING - card_top).max(geometry.card_height),
        None => geometry.card_height,
    };
    let card = Rect::from_min_size(collapsed.min, Vec2::new(geometry.card_width, height));
    if !clip.intersects(card.union(dot)) {
        return None;
    }

    let attach = match event.side {
        Side::Left => Pos2::new(card.right(), card.top() + 14.0),
        Side::Right => Pos2::new(card.left(), card.top() + 14.0),
    };
    painter.line_segment([anchor, attach], Stroke::new(1.0, geometry.color.gamma_multiply(0.6)));
    painter.circle_filled(anchor, size::DOT_RADIUS, geometry.color);

    let hovered = pointer.is_some_and(|p| card.contains(p));
    let (fill, outline) = if hovered || expanded {
        (bg::CARD_HOVER, geometry.color)
    } else {
        (bg::CARD, border::DEFAULT)
    };
    painter.rect(card, 6.0, fill, Stroke::new(1.0, outline));

    let inner = card.shrink(PADDING);
    let clipped = painter.with_clip_rect(inner.intersect(clip));
    clipped.galley(inner.min, date, geometry.color);
    clipped.galley(Pos2::new(inner.left(), title_top), title, text::PRIMARY);
    clipped.text(
        Pos2::new(inner.right(), inner.top()),
        Align2::RIGHT_TOP,
        if expanded { "⏶" } else { "⏷" },
        FontId::proportional(12.0),
        text::MUTED,
    );
    if let Some(body) = body {
        clipped.galley(Pos2::new(inner.left(), body_top), body, text::SECONDARY);
    }

    Some(card)
}

fn render_empty_state(ui: &mut egui::Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() / 3.0);
        ui.label(RichText::new("Nothing to see here... yet.").size(24.0).color(text::SECONDARY));
        ui.add_space(8.0);
        ui.label(
            RichText::new(
                "Use the search bar above to add a timeline for a person, country, \
                 or historical event to begin your journey through time.",
            )
            .color(text::MUTED),
        );
    });
}

impl eframe::App for ChronoLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.maybe_save_settings();
        self.expire_notifications();

        if self.poll_fetches() {
            // Still loading, check again shortly
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        if !self.notifications.is_empty() {
            ctx.request_repaint_after(Duration::from_secs(1));
        }

        // Dark theme
        ctx.set_visuals(egui::Visuals::dark());

        egui::TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(bg::PANEL)
                    .inner_margin(egui::Margin::symmetric(16.0, 10.0)),
            )
            .show(ctx, |ui| {
                self.render_header(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(bg::BOARD))
            .show(ctx, |ui| {
                self.render_board(ui);
            });

        self.render_notifications(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Force save settings on exit
        if self.settings_dirty {
            self.settings.save();
        }
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
