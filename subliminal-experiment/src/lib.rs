pub mod config;
pub mod error;
pub mod outbox;
pub mod randomizer;
pub mod shared;
pub mod state;
pub mod trial;
pub mod visual;

pub use config::{ExperimentConfig, MaskBounds, MaskGeometry, Placement};
pub use error::{ConfigError, ControllerError};
pub use outbox::{Outbox, PresentationEvent};
pub use randomizer::{TrialRandomizer, WordSet};
pub use shared::{CommandOutcome, ControlCommand, SharedController};
pub use state::PhaseController;
pub use trial::{TrialRuntimeState, TrialSamples, TrialTimestamps};
