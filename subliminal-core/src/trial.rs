use serde::{Deserialize, Serialize};

use crate::stimulus::DisplayMode;

/// Per-trial snapshot taken by `start_experiment`. Never mutated while the
/// trial runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    pub flash_ms: u32,
    pub repetitions: u32,
    pub background: String,
    pub display_descriptor: String,
    pub display_mode: DisplayMode,
    pub forward_mask_ms: u32,
    pub backward_mask_ms: u32,
}

/// Recorded result per completed trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_index: u32,
    pub started_at_epoch_ms: u64,
    pub background: String,
    pub display_descriptor: String,
    /// Background label actually in effect while the stimulus was shown.
    pub flash_background: String,
    pub flash_duration_target_ms: u32,
    pub forward_mask_ms: u32,
    pub backward_mask_ms: u32,
    pub repetitions: u32,
    /// One entry per repetition, in order.
    pub wait_durations_ms: Vec<u64>,
    /// Measured, not scheduled, stimulus durations; one per repetition.
    pub flash_durations_ms: Vec<f64>,
    pub target_word: String,
    pub choices: [String; 3],
    pub guess: String,
    pub correct: bool,
    pub response_time_ms: u64,
}
