//! Engine configuration loaded from the platform config directory
//!
//! Missing or malformed files fall back to defaults with a logged
//! warning; configuration problems are never fatal.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::viewer::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_LOOKAHEAD, DEFAULT_RENDER_WORKERS, MAGNETIC_THRESHOLD_PX,
    ZOOM_DEBOUNCE,
};

const APP_NAME: &str = "pageflow";
const SETTINGS_FILENAME: &str = "config.yaml";

/// Tunables for the viewer engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of resident rendered pages.
    pub cache_capacity: usize,
    /// Pages rendered beyond the visible range in each direction.
    pub lookahead: usize,
    /// Render worker threads.
    pub render_workers: usize,
    /// Zoom commit debounce, milliseconds.
    pub zoom_debounce_ms: u64,
    /// Snapping radius for glyph hit-testing, screen pixels.
    pub magnetic_threshold_px: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            lookahead: DEFAULT_LOOKAHEAD,
            render_workers: DEFAULT_RENDER_WORKERS,
            zoom_debounce_ms: ZOOM_DEBOUNCE.as_millis() as u64,
            magnetic_threshold_px: MAGNETIC_THRESHOLD_PX,
        }
    }
}

impl Settings {
    /// Load from the default config path.
    #[must_use]
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific file; defaults when absent or invalid.
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_yaml::from_str(&raw) {
            Ok(settings) => {
                info!("loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("ignoring malformed settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    fn config_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(APP_NAME).join(SETTINGS_FILENAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.yaml"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "cache_capacity: [not a number").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "cache_capacity: 24\nlookahead: 5\n").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.cache_capacity, 24);
        assert_eq!(settings.lookahead, 5);
        assert_eq!(settings.render_workers, Settings::default().render_workers);
    }

    #[test]
    fn settings_round_trip_through_yaml() {
        let settings = Settings {
            cache_capacity: 8,
            lookahead: 2,
            render_workers: 4,
            zoom_debounce_ms: 150,
            magnetic_threshold_px: 20.0,
        };
        let raw = serde_yaml::to_string(&settings).unwrap();
        assert_eq!(serde_yaml::from_str::<Settings>(&raw).unwrap(), settings);
    }
}
