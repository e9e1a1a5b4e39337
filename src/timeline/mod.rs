//! Date parsing, scale markers and card layout for the timeline board.

pub mod date_parser;
pub mod gaps;
pub mod layout;
pub mod scale;
pub mod types;
pub mod view;

pub use gaps::GapCompression;
pub use layout::CardLayout;
pub use types::{PositionedEvent, RawEvent, Side, Timeline};
pub use view::{LayoutConfig, TimelineFrame};
