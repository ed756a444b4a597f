// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnredactError};

/// Default mean brightness (0-255) at or below which an image is treated as
/// a redaction box.
pub const DEFAULT_BRIGHTNESS_THRESHOLD: f64 = 15.0;

/// Default placement height (page units) at or below which an image
/// placement is ignored as a decorative rule.
pub const DEFAULT_MIN_PLACEMENT_HEIGHT: f64 = 10.0;

/// Settings for one reconstruction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Discard near-black raster images (redaction boxes).
    pub remove_boxes: bool,
    /// Render recovered text in red instead of black.
    pub highlight_text: bool,
    /// Mean sample value at or below which an image is discarded.
    pub brightness_threshold: f64,
    /// Placements this tall or shorter are never drawn.
    pub min_placement_height: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            remove_boxes: true,
            highlight_text: true,
            brightness_threshold: DEFAULT_BRIGHTNESS_THRESHOLD,
            min_placement_height: DEFAULT_MIN_PLACEMENT_HEIGHT,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that cannot be compared meaningfully.
    pub fn validate(&self) -> Result<()> {
        if !self.brightness_threshold.is_finite() || self.brightness_threshold < 0.0 {
            return Err(UnredactError::Config(format!(
                "brightness threshold must be a non-negative number, got {}",
                self.brightness_threshold
            )));
        }
        if !self.min_placement_height.is_finite() || self.min_placement_height < 0.0 {
            return Err(UnredactError::Config(format!(
                "minimum placement height must be a non-negative number, got {}",
                self.min_placement_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_tool() {
        let config = EngineConfig::default();
        assert!(config.remove_boxes);
        assert!(config.highlight_text);
        assert_eq!(config.brightness_threshold, 15.0);
        assert_eq!(config.min_placement_height, 10.0);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "highlight_text": false, "brightness_threshold": 40 }"#)
            .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert!(config.remove_boxes);
        assert!(!config.highlight_text);
        assert_eq!(config.brightness_threshold, 40.0);
        assert_eq!(config.min_placement_height, 10.0);
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let config = EngineConfig {
            brightness_threshold: -1.0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(UnredactError::Config(_))));
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, "{ remove_boxes: yes").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(UnredactError::Serialization(_))
        ));
    }
}
