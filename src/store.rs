//! On-disk list of displayed timelines.
//!
//! The whole board is one JSON document. Unreadable or corrupt data is
//! logged and reported as absent; it never stops the app from starting.

use crate::settings::Settings;
use crate::timeline::Timeline;
use std::path::{Path, PathBuf};

const TIMELINES_FILE: &str = "timelines.json";

pub struct TimelineStore {
    path: Option<PathBuf>,
}

impl TimelineStore {
    /// Store in the platform config directory
    pub fn new() -> Self {
        let path = Settings::config_dir().map(|dir| dir.join(TIMELINES_FILE));
        if path.is_none() {
            tracing::warn!("Could not determine config directory, timelines will not be saved");
        }
        Self { path }
    }

    #[cfg(test)]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// True when something is stored, readable or not.
    pub fn exists(&self) -> bool {
        self.path.as_deref().is_some_and(Path::exists)
    }

    /// Stored timelines, or `None` when nothing usable is stored.
    pub fn load(&self) -> Option<Vec<Timeline>> {
        let path = self.path.as_deref()?;
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<Timeline>>(&contents) {
            Ok(timelines) => {
                tracing::info!("Loaded {} timelines from {:?}", timelines.len(), path);
                Some(timelines)
            }
            Err(e) => {
                tracing::warn!("Failed to parse stored timelines: {}, starting empty", e);
                None
            }
        }
    }

    pub fn save(&self, timelines: &[Timeline]) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create config directory: {}", e);
                return;
            }
        }

        match serde_json::to_string(timelines) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!("Failed to write timelines: {}", e);
                } else {
                    tracing::debug!("Saved {} timelines to {:?}", timelines.len(), path);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize timelines: {}", e),
        }
    }

    pub fn clear(&self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        match std::fs::remove_file(path) {
            Ok(()) => tracing::info!("Cleared stored timelines"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {:?}: {}", path, e),
        }
    }
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::RawEvent;

    fn sample() -> Vec<Timeline> {
        vec![Timeline {
            id: "apollo 111700000000000".into(),
            title: "Apollo 11".into(),
            events: vec![RawEvent::new("July 16, 1969", "Launch", "Saturn V lifts off.")],
        }]
    }

    #[test]
    fn absent_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimelineStore::at(dir.path().join(TIMELINES_FILE));
        assert!(!store.exists());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimelineStore::at(dir.path().join("sub").join(TIMELINES_FILE));
        store.save(&sample());
        assert!(store.exists());
        assert_eq!(store.load(), Some(sample()));
    }

    #[test]
    fn empty_list_is_not_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimelineStore::at(dir.path().join(TIMELINES_FILE));
        store.save(&[]);
        assert_eq!(store.load(), Some(Vec::new()));
    }

    #[test]
    fn corrupt_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TIMELINES_FILE);
        std::fs::write(&path, "[{\"id\": 3").unwrap();

        let store = TimelineStore::at(&path);
        assert!(store.exists());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimelineStore::at(dir.path().join(TIMELINES_FILE));
        store.save(&sample());
        store.clear();
        assert!(!store.exists());
        // Clearing twice is fine
        store.clear();
    }
}
