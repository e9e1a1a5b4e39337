//! Card stacking for a single timeline column.
//!
//! Each event keeps its true `event_y`; only the card is pushed down when it
//! would collide with the previous card on the same side. One greedy pass,
//! O(n), and cards never move above their ideal position.

use super::types::{PositionedEvent, Side};

/// Card geometry used by the overlap pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    /// Height of one card in pixels
    pub card_height: f64,
    /// Minimum vertical gap between stacked cards on the same side
    pub spacing: f64,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            card_height: 84.0,
            spacing: 8.0,
        }
    }
}

/// Assign sides and non-overlapping card offsets to chronologically sorted events.
pub fn place(sorted_events: Vec<PositionedEvent>, layout: CardLayout) -> Vec<PositionedEvent> {
    let mut left_bottom = f64::NEG_INFINITY;
    let mut right_bottom = f64::NEG_INFINITY;

    sorted_events
        .into_iter()
        .enumerate()
        .map(|(index, mut event)| {
            event.side = Side::for_index(index);
            let last_bottom = match event.side {
                Side::Left => &mut left_bottom,
                Side::Right => &mut right_bottom,
            };

            event.card_y = event.event_y.max(*last_bottom + layout.spacing);
            *last_bottom = event.card_y + layout.card_height;
            event
        })
        .collect()
}
