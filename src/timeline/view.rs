//! Per-frame derivation of the whole board layout.
//!
//! [`TimelineFrame::derive`] is a pure function of the displayed timelines,
//! the zoom factor and the layout settings. The app rebuilds it whenever any
//! of those change and never patches an existing frame.

use super::date_parser;
use super::gaps::{GapCompression, GapMarker, TimeAxis};
use super::layout::{self, CardLayout};
use super::scale::{self, TickMark};
use super::types::{PositionedEvent, RawEvent, Timeline};

/// Visible year range when no event date can be parsed
pub const FALLBACK_YEAR_RANGE: (f64, f64) = (1990.0, 2030.0);

/// Fraction of the event span added above and below
const RANGE_PADDING: f64 = 0.05;

/// Padding in years when every event falls on the same instant
const MIN_PADDING_YEARS: f64 = 5.0;

/// Global visible range and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub min_year: f64,
    pub max_year: f64,
    pub zoom: f32,
}

impl ViewState {
    /// Range covering every parsed year plus padding, or the fallback range.
    pub fn from_years(years: impl IntoIterator<Item = f64>, zoom: f32) -> Self {
        let bounds = years.into_iter().fold(None, |acc: Option<(f64, f64)>, year| match acc {
            Some((min, max)) => Some((min.min(year), max.max(year))),
            None => Some((year, year)),
        });

        let (min_year, max_year) = match bounds {
            Some((min, max)) => {
                let padding = (max - min) * RANGE_PADDING;
                let padding = if padding > 0.0 { padding } else { MIN_PADDING_YEARS };
                (min - padding, max + padding)
            }
            None => FALLBACK_YEAR_RANGE,
        };

        Self { min_year, max_year, zoom }
    }

    #[cfg(test)]
    pub fn from_timelines(timelines: &[Timeline], zoom: f32) -> Self {
        let years = timelines
            .iter()
            .flat_map(|t| t.events.iter())
            .filter_map(|e| date_parser::parse_fractional_year(&e.date));
        Self::from_years(years, zoom)
    }

    pub fn pixels_per_year(&self, base_pixels_per_year: f64) -> f64 {
        base_pixels_per_year * self.zoom as f64
    }
}

/// Settings that shape the derived layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Vertical pixels per year at zoom 1
    pub pixels_per_year: f64,
    /// Minimum spacing between scale ticks
    pub min_tick_spacing: f64,
    pub cards: CardLayout,
    /// `None` disables gap compression
    pub gaps: Option<GapCompression>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            pixels_per_year: 100.0,
            min_tick_spacing: 80.0,
            cards: CardLayout::default(),
            gaps: None,
        }
    }
}

/// One laid-out timeline column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub timeline_id: String,
    pub title: String,
    /// Events with parseable dates, in chronological order
    pub events: Vec<PositionedEvent>,
    /// Events dropped because their date could not be parsed
    pub dropped: usize,
}

impl ColumnLayout {
    /// Lowest pixel any card in this column reaches.
    pub fn content_bottom(&self, card_height: f64) -> f64 {
        self.events
            .iter()
            .map(|e| e.card_y + card_height)
            .fold(0.0, f64::max)
    }
}

/// Everything needed to paint one frame of the board.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineFrame {
    pub view: ViewState,
    pub axis: TimeAxis,
    pub columns: Vec<ColumnLayout>,
    pub config: LayoutConfig,
}

impl TimelineFrame {
    pub fn derive(timelines: &[Timeline], zoom: f32, config: LayoutConfig) -> Self {
        let parsed: Vec<(&Timeline, Vec<(RawEvent, f64)>)> = timelines
            .iter()
            .map(|timeline| (timeline, sorted_parsed_events(&timeline.events)))
            .collect();

        let view = ViewState::from_years(
            parsed.iter().flat_map(|(_, events)| events.iter().map(|(_, year)| *year)),
            zoom,
        );
        let pixels_per_year = view.pixels_per_year(config.pixels_per_year);

        let axis = match config.gaps {
            Some(compression) => {
                // Breaks are shared so columns stay comparable
                let mut all_years: Vec<f64> = parsed
                    .iter()
                    .flat_map(|(_, events)| events.iter().map(|(_, year)| *year))
                    .collect();
                all_years.sort_by(|a, b| a.total_cmp(b));
                TimeAxis::compressed(&all_years, view.min_year, pixels_per_year, compression)
            }
            None => TimeAxis::linear(view.min_year, pixels_per_year),
        };

        let columns = parsed
            .into_iter()
            .map(|(timeline, events)| {
                let dropped = timeline.events.len() - events.len();
                let positioned = events
                    .into_iter()
                    .enumerate()
                    .map(|(index, (raw, year))| PositionedEvent::new(raw, year, index, 0.0))
                    .collect();
                let events = layout::place(axis.apply(positioned), config.cards);

                if dropped > 0 {
                    tracing::debug!(timeline = %timeline.title, dropped, "skipped events with unparseable dates");
                }

                ColumnLayout {
                    timeline_id: timeline.id.clone(),
                    title: timeline.title.clone(),
                    events,
                    dropped,
                }
            })
            .collect();

        Self {
            view,
            axis,
            columns,
            config,
        }
    }

    pub fn pixels_per_year(&self) -> f64 {
        self.axis.pixels_per_year()
    }

    /// Height of the time axis, not counting cards that spill past the end.
    pub fn axis_height(&self) -> f64 {
        self.axis.y_for_year(self.view.max_year).max(0.0)
    }

    /// Height needed to show the axis and every card.
    pub fn content_height(&self) -> f64 {
        self.columns
            .iter()
            .map(|c| c.content_bottom(self.config.cards.card_height))
            .fold(self.axis_height(), f64::max)
    }

    pub fn gap_markers(&self) -> &[GapMarker] {
        self.axis.markers()
    }

    /// Ticks visible between two display offsets, paired with their offset.
    pub fn ticks_between(&self, top: f64, bottom: f64) -> Vec<(f64, TickMark)> {
        let from = self.axis.year_at(top.max(0.0)).max(self.view.min_year);
        let to = self.axis.year_at(bottom).min(self.view.max_year);
        scale::ticks(from, to, self.pixels_per_year(), self.config.min_tick_spacing)
            .into_iter()
            .filter(|tick| !self.axis.is_compressed(tick.year_value))
            .map(|tick| (self.axis.y_for_year(tick.year_value), tick))
            .collect()
    }

    pub fn year_at(&self, y: f64) -> f64 {
        self.axis.year_at(y)
    }

    /// Day-granular label for a display offset, used by the pointer indicator.
    pub fn cursor_label(&self, y: f64) -> String {
        scale::cursor_label(self.year_at(y))
    }
}

/// Parse, drop unparseable and sort chronologically (stable for ties).
fn sorted_parsed_events(events: &[RawEvent]) -> Vec<(RawEvent, f64)> {
    let mut parsed: Vec<(RawEvent, f64)> = events
        .iter()
        .filter_map(|event| {
            date_parser::parse_fractional_year(&event.date).map(|year| (event.clone(), year))
        })
        .collect();
    parsed.sort_by(|a, b| a.1.total_cmp(&b.1));
    parsed
}
