use serde::{Deserialize, Serialize};

/// Stage of a subliminal trial. Exactly one is active at a time and it alone
/// decides what the host shows.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Menu,
    Waiting,
    ForwardMasking,
    Flashing,
    BackwardMasking,
    Processing,
    Guessing,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Menu,
        Phase::Waiting,
        Phase::ForwardMasking,
        Phase::Flashing,
        Phase::BackwardMasking,
        Phase::Processing,
        Phase::Guessing,
    ];

    pub fn is_masking(&self) -> bool {
        matches!(self, Self::ForwardMasking | Self::BackwardMasking)
    }

    pub fn shows_stimulus(&self) -> bool {
        matches!(self, Self::Flashing)
    }

    pub fn shows_fixation(&self) -> bool {
        matches!(self, Self::Waiting | Self::Processing)
    }

    pub fn allows_guess(&self) -> bool {
        matches!(self, Self::Guessing)
    }

    /// True between `start_experiment` and the end of the trial.
    pub fn is_trial_active(&self) -> bool {
        !matches!(self, Self::Menu)
    }

    /// Compact encoding for lock-free mirrors.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Menu => "menu",
            Phase::Waiting => "waiting",
            Phase::ForwardMasking => "forward_masking",
            Phase::Flashing => "flashing",
            Phase::BackwardMasking => "backward_masking",
            Phase::Processing => "processing",
            Phase::Guessing => "guessing",
        };
        f.write_str(name)
    }
}
