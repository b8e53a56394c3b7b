use subliminal_core::{FlashVisuals, MaskLayout, Phase};

use crate::randomizer::WordSet;

/// Mutable state of the running trial, owned by the phase controller.
/// `Default` is the clean Menu state a new trial starts from.
#[derive(Debug, Clone, Default)]
pub struct TrialRuntimeState {
    pub phase: Phase,
    pub timestamps: TrialTimestamps,
    /// Frames left to show after the current one; Flashing only.
    pub frames_remaining: u32,
    /// Always below the trial's repetition count.
    pub current_repetition: u32,
    /// Wait drawn on the latest Waiting entry.
    pub wait_ms: u64,
    pub samples: TrialSamples,
    pub words: Option<WordSet>,
    pub visuals: Option<FlashVisuals>,
    /// Background label captured when the stimulus was last shown.
    pub flash_background: Option<String>,
    pub mask_layout: MaskLayout,
}

/// Monotonic instants are nanoseconds from the controller's timer.
#[derive(Debug, Clone, Default)]
pub struct TrialTimestamps {
    pub started_at_epoch_ms: u64,
    pub phase_entered_ns: u64,
    pub flash_started_ns: Option<u64>,
    pub guess_started_ns: Option<u64>,
}

/// Realized per-repetition measurements, in repetition order.
#[derive(Debug, Clone, Default)]
pub struct TrialSamples {
    pub wait_durations_ms: Vec<u64>,
    pub flash_durations_ms: Vec<f64>,
}
