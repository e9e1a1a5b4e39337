//! HTTP client for the generative event-extraction service.

use crate::timeline::RawEvent;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::source::{EventSource, FetchError};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Environment variables checked for an API key, in order
const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Structured output requested from the model
#[derive(Debug, Deserialize)]
struct EventsPayload {
    #[serde(default)]
    events: Vec<RawEvent>,
}

pub struct GenerativeClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GenerativeClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    /// Client using the API key from the environment.
    pub fn from_env(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|key| !key.is_empty()));
        if api_key.is_none() {
            tracing::warn!("No API key found in {:?}; fetching timelines will fail", API_KEY_VARS);
        }
        Self::new(base_url, model, api_key)
    }

    fn prompt(topic: &str) -> String {
        format!(
            "Generate a timeline of significant events for the topic: {}. \
             For each event, provide the date, a short title (5-7 words), \
             and a one-sentence description.",
            topic
        )
    }

    fn request_body(topic: &str) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": Self::prompt(topic) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "events": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "date": { "type": "STRING" },
                                    "title": { "type": "STRING" },
                                    "event": { "type": "STRING" }
                                },
                                "required": ["date", "title", "event"]
                            }
                        }
                    },
                    "required": ["events"]
                }
            }
        })
    }
}

impl EventSource for GenerativeClient {
    fn fetch_events(&self, topic: &str) -> Result<Vec<RawEvent>, FetchError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(FetchError::EmptyTopic);
        }
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        tracing::info!(topic, model = %self.model, "requesting timeline events");
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(topic))
            .timeout(Duration::from_secs(60)) // Generation can be slow
            .send()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let body: GenerateResponse = resp
            .json()
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let events = parse_events(&body)?;
        tracing::info!(topic, count = events.len(), "received timeline events");
        Ok(events)
    }
}

/// Pull the events out of the first candidate's text.
fn parse_events(body: &GenerateResponse) -> Result<Vec<RawEvent>, FetchError> {
    let text: String = body
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(FetchError::NoEvents);
    }

    let payload: EventsPayload = serde_json::from_str(strip_code_fence(&text))
        .map_err(|e| FetchError::Decode(e.to_string()))?;

    if payload.events.is_empty() {
        return Err(FetchError::NoEvents);
    }
    Ok(payload.events)
}

/// Models occasionally wrap JSON in a ```json fence despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(text: &str) -> GenerateResponse {
        serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
        .unwrap()
    }

    #[test]
    fn parses_structured_events() {
        let body = response(
            r#"{"events": [
                {"date": "1969", "title": "ARPANET goes live", "event": "First message sent."},
                {"date": "1983-01-01", "title": "TCP/IP adopted", "event": "Flag day."}
            ]}"#,
        );
        let events = parse_events(&body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "ARPANET goes live");
        assert_eq!(events[1].date, "1983-01-01");
    }

    #[test]
    fn accepts_fenced_json() {
        let body = response("```json\n{\"events\": [{\"date\": \"1991\", \"title\": \"WWW\", \"event\": \"Web released.\"}]}\n```");
        assert_eq!(parse_events(&body).unwrap().len(), 1);
    }

    #[test]
    fn empty_results_are_no_events() {
        assert_eq!(parse_events(&response(r#"{"events": []}"#)), Err(FetchError::NoEvents));
        assert_eq!(parse_events(&response("   ")), Err(FetchError::NoEvents));

        let no_candidates: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parse_events(&no_candidates), Err(FetchError::NoEvents));
    }

    #[test]
    fn malformed_text_is_a_decode_error() {
        assert!(matches!(parse_events(&response("not json")), Err(FetchError::Decode(_))));
    }

    #[test]
    fn empty_topic_rejected_before_network() {
        let client = GenerativeClient::new("http://127.0.0.1:9", DEFAULT_MODEL, Some("key".into()));
        assert_eq!(client.fetch_events("   "), Err(FetchError::EmptyTopic));
    }

    #[test]
    fn missing_key_rejected_before_network() {
        let client = GenerativeClient::new("http://127.0.0.1:9", DEFAULT_MODEL, None);
        assert_eq!(client.fetch_events("Moon landing"), Err(FetchError::MissingApiKey));
    }
}
