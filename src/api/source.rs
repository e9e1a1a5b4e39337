//! The event source seam: topic in, dated events out.

use crate::timeline::RawEvent;

/// Failure to produce events for a topic.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Topic cannot be empty.")]
    EmptyTopic,
    #[error("No API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("Request failed: {0}")]
    Request(String),
    #[error("API error: {0}")]
    Status(u16),
    #[error("Failed to parse response: {0}")]
    Decode(String),
    #[error("No events returned")]
    NoEvents,
}

impl FetchError {
    /// Message shown to the user in a notification.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::EmptyTopic => self.to_string(),
            FetchError::MissingApiKey => {
                "No API key is configured. Set GEMINI_API_KEY and restart.".to_string()
            }
            FetchError::NoEvents => "Failed to generate timeline. The topic might not be found or lacks significant events.".to_string(),
            FetchError::Request(_) | FetchError::Status(_) | FetchError::Decode(_) => {
                "An unexpected error occurred while fetching timeline data.".to_string()
            }
        }
    }
}

/// Anything that can turn a topic into a list of dated events.
///
/// Implementations block; callers run them off the UI thread.
pub trait EventSource: Send + Sync {
    fn fetch_events(&self, topic: &str) -> Result<Vec<RawEvent>, FetchError>;
}
