use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use subliminal_core::{Rgba, Vec3};
use subliminal_timing::DEFAULT_REFRESH_HZ;

use crate::error::ConfigError;

/// Session-wide settings. Per-trial values are snapshotted into a
/// `TrialConfig` when a trial starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Inclusive range the inter-trial wait is drawn from.
    #[serde(default = "ExperimentConfig::default_wait_range_ms")]
    pub wait_range_ms: (u64, u64),
    #[serde(default = "ExperimentConfig::default_processing_delay_ms")]
    pub processing_delay_ms: u64,
    #[serde(default = "MaskBounds::forward")]
    pub forward_mask: MaskBounds,
    #[serde(default = "MaskBounds::backward")]
    pub backward_mask: MaskBounds,
    #[serde(default = "ExperimentConfig::default_refresh_hz")]
    pub default_refresh_hz: f32,
    #[serde(default = "ExperimentConfig::default_vocabulary")]
    pub vocabulary: Vec<String>,
    #[serde(default)]
    pub mask: MaskGeometry,
    #[serde(default)]
    pub placement: Placement,
    /// Capacity of each outgoing queue (presentation events, results).
    #[serde(default = "ExperimentConfig::default_queue_capacity")]
    pub queue_capacity: usize,
}

impl ExperimentConfig {
    fn default_wait_range_ms() -> (u64, u64) {
        (4000, 7000)
    }
    fn default_processing_delay_ms() -> u64 {
        2000
    }
    fn default_refresh_hz() -> f32 {
        DEFAULT_REFRESH_HZ
    }
    fn default_vocabulary() -> Vec<String> {
        [
            "APPLE", "BANANA", "CHERRY", "DOG", "ELEPHANT", "FLOWER", "GRAPE", "HOUSE", "ISLAND",
            "JOKER",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    fn default_queue_capacity() -> usize {
        64
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (wait_min, wait_max) = self.wait_range_ms;
        if wait_min > wait_max {
            return Err(ConfigError::InvalidRange {
                field: "wait_range_ms",
                min: wait_min as f64,
                max: wait_max as f64,
            });
        }
        self.forward_mask.validate("forward_mask")?;
        self.backward_mask.validate("backward_mask")?;

        if !(self.default_refresh_hz.is_finite() && self.default_refresh_hz > 0.0) {
            return Err(ConfigError::InvalidRefreshRate(self.default_refresh_hz));
        }

        let distinct: HashSet<&str> = self.vocabulary.iter().map(String::as_str).collect();
        if distinct.len() < 3 {
            return Err(ConfigError::VocabularyTooSmall(distinct.len()));
        }

        self.mask.validate()?;

        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            wait_range_ms: Self::default_wait_range_ms(),
            processing_delay_ms: Self::default_processing_delay_ms(),
            forward_mask: MaskBounds::forward(),
            backward_mask: MaskBounds::backward(),
            default_refresh_hz: Self::default_refresh_hz(),
            vocabulary: Self::default_vocabulary(),
            mask: MaskGeometry::default(),
            placement: Placement::default(),
            queue_capacity: Self::default_queue_capacity(),
        }
    }
}

/// Allowed range of a mask duration slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskBounds {
    pub min_ms: u32,
    pub max_ms: u32,
    pub default_ms: u32,
}

impl MaskBounds {
    pub fn forward() -> Self {
        Self {
            min_ms: 10,
            max_ms: 200,
            default_ms: 50,
        }
    }

    pub fn backward() -> Self {
        Self {
            min_ms: 10,
            max_ms: 250,
            default_ms: 150,
        }
    }

    pub fn clamp(&self, ms: u32) -> u32 {
        ms.clamp(self.min_ms, self.max_ms)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms || !(self.min_ms..=self.max_ms).contains(&self.default_ms) {
            return Err(ConfigError::InvalidRange {
                field,
                min: f64::from(self.min_ms),
                max: f64::from(self.max_ms),
            });
        }
        Ok(())
    }
}

/// Mondrian mask generation parameters, in stimulus-panel meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskGeometry {
    pub tile_count: usize,
    pub panel_width: f32,
    pub panel_height: f32,
    /// Tile width as a fraction of the panel width.
    pub tile_width_fraction: (f32, f32),
    /// Tile height as a fraction of the panel height.
    pub tile_height_fraction: (f32, f32),
    pub palette: Vec<Rgba>,
}

impl MaskGeometry {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        for (field, (lo, hi)) in [
            ("mask.tile_width_fraction", self.tile_width_fraction),
            ("mask.tile_height_fraction", self.tile_height_fraction),
        ] {
            for value in [lo, hi] {
                if !(value > 0.0 && value <= 1.0) {
                    return Err(ConfigError::InvalidFraction { field, value });
                }
            }
            if lo > hi {
                return Err(ConfigError::InvalidRange {
                    field,
                    min: f64::from(lo),
                    max: f64::from(hi),
                });
            }
        }
        for (field, value) in [
            ("mask.panel_width", self.panel_width),
            ("mask.panel_height", self.panel_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidRange {
                    field,
                    min: f64::from(value),
                    max: f64::from(value),
                });
            }
        }
        Ok(())
    }
}

impl Default for MaskGeometry {
    fn default() -> Self {
        Self {
            tile_count: 40,
            panel_width: 1.2,
            panel_height: 0.6,
            tile_width_fraction: (0.08, 0.35),
            tile_height_fraction: (0.2, 0.45),
            palette: vec![
                Rgba::WHITE,
                Rgba::BLACK,
                Rgba::rgb(230, 26, 26),
                Rgba::rgb(26, 26, 230),
                Rgba::rgb(242, 230, 26),
                Rgba::rgb(26, 204, 179),
            ],
        }
    }
}

/// Relative placement of the head-locked representations. Layers sit at
/// distinct depths so they never z-fight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub stimulus_depth: f32,
    pub mask_depth: f32,
    pub fixation_depth: f32,
    /// Per-bar offsets of the fixation cross, relative to its depth.
    pub fixation_bars: Vec<Vec3>,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            stimulus_depth: 1.10,
            mask_depth: 1.08,
            fixation_depth: 1.05,
            fixation_bars: vec![Vec3::new(-0.15, -0.01, 0.0), Vec3::new(-0.01, -0.15, 0.001)],
        }
    }
}
