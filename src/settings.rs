//! Persistent settings for the timeline board.

use crate::api::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::timeline::{CardLayout, GapCompression, LayoutConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the platform config dir holding settings and timelines
pub const APP_DIR: &str = "chronolens";

/// Topic fetched on first launch when nothing has been stored yet
pub const DEFAULT_SEED_TOPIC: &str = "History of the Internet";

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 20.0;

/// All persistable UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // View
    #[serde(default = "default_zoom")]
    pub zoom: f32,
    #[serde(default)]
    pub compress_gaps: bool,

    // Scale
    #[serde(default = "default_pixels_per_year")]
    pub pixels_per_year: f64,
    #[serde(default = "default_min_tick_spacing")]
    pub min_tick_spacing: f64,

    // Cards
    #[serde(default = "default_card_height")]
    pub card_height: f64,
    #[serde(default = "default_card_spacing")]
    pub card_spacing: f64,
    #[serde(default = "default_column_width")]
    pub column_width: f32,

    // Gap compression
    #[serde(default = "default_gap_threshold_years")]
    pub gap_threshold_years: f64,
    #[serde(default = "default_gap_compressed_height")]
    pub gap_compressed_height: f64,

    // Event source
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_seed_topic")]
    pub seed_topic: Option<String>,
}

fn default_zoom() -> f32 {
    1.0
}

fn default_pixels_per_year() -> f64 {
    100.0
}

fn default_min_tick_spacing() -> f64 {
    80.0
}

fn default_card_height() -> f64 {
    CardLayout::default().card_height
}

fn default_card_spacing() -> f64 {
    CardLayout::default().spacing
}

fn default_column_width() -> f32 {
    320.0
}

fn default_gap_threshold_years() -> f64 {
    GapCompression::default().threshold_years
}

fn default_gap_compressed_height() -> f64 {
    GapCompression::default().compressed_height
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_seed_topic() -> Option<String> {
    Some(DEFAULT_SEED_TOPIC.to_string())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            compress_gaps: false,
            pixels_per_year: default_pixels_per_year(),
            min_tick_spacing: default_min_tick_spacing(),
            card_height: default_card_height(),
            card_spacing: default_card_spacing(),
            column_width: default_column_width(),
            gap_threshold_years: default_gap_threshold_years(),
            gap_compressed_height: default_gap_compressed_height(),
            api_base_url: default_api_base_url(),
            model: default_model(),
            seed_topic: default_seed_topic(),
        }
    }
}

impl Settings {
    /// Directory holding all ChronoLens state
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push(APP_DIR);
            p
        })
    }

    /// Get the path to the settings file
    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Layout parameters for frame derivation
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            pixels_per_year: self.pixels_per_year,
            min_tick_spacing: self.min_tick_spacing,
            cards: CardLayout {
                card_height: self.card_height,
                spacing: self.card_spacing,
            },
            gaps: self.compress_gaps.then_some(GapCompression {
                threshold_years: self.gap_threshold_years,
                compressed_height: self.gap_compressed_height,
            }),
        }
    }

    /// Replace values the layout cannot work with.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !self.zoom.is_finite() {
            self.zoom = defaults.zoom;
        }
        self.zoom = self.zoom.clamp(MIN_ZOOM, MAX_ZOOM);

        fn positive(value: &mut f64, default: f64, name: &str) {
            if !(value.is_finite() && *value > 0.0) {
                tracing::warn!("Invalid {} {}, using {}", name, value, default);
                *value = default;
            }
        }
        positive(&mut self.pixels_per_year, defaults.pixels_per_year, "pixels_per_year");
        positive(&mut self.min_tick_spacing, defaults.min_tick_spacing, "min_tick_spacing");
        positive(&mut self.card_height, defaults.card_height, "card_height");
        positive(&mut self.gap_threshold_years, defaults.gap_threshold_years, "gap_threshold_years");
        positive(&mut self.gap_compressed_height, defaults.gap_compressed_height, "gap_compressed_height");

        if !(self.card_spacing.is_finite() && self.card_spacing >= 0.0) {
            self.card_spacing = defaults.card_spacing;
        }
        if !(self.column_width.is_finite() && self.column_width > 0.0) {
            self.column_width = defaults.column_width;
        }
        self
    }

    /// Load settings from disk, returning defaults if file doesn't exist or is invalid
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    tracing::info!("Loaded settings from {:?}", path);
                    Self::sanitized(settings)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                // File doesn't exist yet, that's fine
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, settings not saved");
            return;
        };
        if let Err(e) = self.save_to(&path) {
            tracing::warn!("{}", e);
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write settings file: {}", e))?;
        tracing::debug!("Saved settings to {:?}", path);
        Ok(())
    }
}
