//! Timeline data types shared by the parser, scale and layout passes.

use serde::{Deserialize, Serialize};

/// A dated event as returned by the event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub date: String,
    #[serde(default)]
    pub title: String,
    pub event: String,
}

impl RawEvent {
    #[cfg(test)]
    pub fn new(date: impl Into<String>, title: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            title: title.into(),
            event: event.into(),
        }
    }
}

/// One column on the board: a topic and its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub id: String,
    pub title: String,
    pub events: Vec<RawEvent>,
}

/// Which side of a column's axis a card sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Alternate sides by chronological index, starting on the left.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// An event mapped onto the vertical axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedEvent {
    pub raw: RawEvent,
    pub fractional_year: f64,
    pub side: Side,
    /// Pixel offset of the event's true point in time (where connectors point)
    pub event_y: f64,
    /// Pixel offset of the top of the card, shifted down to avoid overlap
    pub card_y: f64,
}

impl PositionedEvent {
    /// Create an event anchored at `event_y`, with its card at the same offset.
    pub fn new(raw: RawEvent, fractional_year: f64, index: usize, event_y: f64) -> Self {
        Self {
            raw,
            fractional_year,
            side: Side::for_index(index),
            event_y,
            card_y: event_y,
        }
    }
}
