//! Event source for new timelines.

mod client;
mod source;

pub use client::{GenerativeClient, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use source::{EventSource, FetchError};
