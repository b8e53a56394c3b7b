pub mod frame;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use frame::{FixationInstruction, FrameInstructions, MaskTileInstruction, StimulusInstruction};
pub use phase::Phase;
pub use stimulus::{DisplayMode, FlashVisuals, MaskLayout, MaskTile, Rgba, TextColor, Vec3};
pub use trial::{TrialConfig, TrialResult};
