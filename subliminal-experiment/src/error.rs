//! Error types for the trial controller and its configuration.

use std::path::PathBuf;

use subliminal_core::Phase;
use thiserror::Error;

/// A control-surface call the controller refused. Always recoverable: the
/// controller state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// Requested stimulus duration below one millisecond.
    #[error("flash duration must be at least 1 ms, got {0}")]
    InvalidFlashDuration(u32),

    /// Zero repetitions requested.
    #[error("repetition count must be at least 1, got {0}")]
    InvalidRepetitions(u32),

    /// A trial is already running.
    #[error("cannot start a trial while in phase {0}")]
    TrialInProgress(Phase),

    /// The vocabulary cannot supply a target and two decoys.
    #[error("vocabulary cannot supply a target and two distinct decoys")]
    NoChoices,

    /// A guess arrived while no guess was expected.
    #[error("guess ignored in phase {0}")]
    NotGuessing(Phase),
}

/// Configuration loading or validation error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// `min > max`, or a default outside its bounds.
    #[error("{field}: invalid range {min}..={max}")]
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("vocabulary needs at least 3 distinct words, got {0}")]
    VocabularyTooSmall(usize),

    #[error("mask palette is empty")]
    EmptyPalette,

    #[error("{field}: fraction {value} outside (0, 1]")]
    InvalidFraction { field: &'static str, value: f32 },

    #[error("default refresh rate must be positive, got {0}")]
    InvalidRefreshRate(f32),

    #[error("queue capacity must be non-zero")]
    ZeroQueueCapacity,
}
