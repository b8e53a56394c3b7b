//! Per-frame output of the phase controller.
//!
//! The host owns every scene entity and the viewer pose. It applies these
//! instructions by head-locking each representation at the given offset;
//! entities it does not have are simply skipped.

use serde::{Deserialize, Serialize};

use crate::phase::Phase;
use crate::stimulus::{FlashVisuals, Rgba, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInstructions {
    pub phase: Phase,
    pub stimulus: StimulusInstruction,
    pub mask_tiles: Vec<MaskTileInstruction>,
    pub fixation: FixationInstruction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusInstruction {
    pub visible: bool,
    pub offset: Vec3,
    /// Target word; only set while it is visible.
    pub word: Option<String>,
    pub visuals: Option<FlashVisuals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskTileInstruction {
    pub visible: bool,
    pub offset: Vec3,
    pub width: f32,
    pub height: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationInstruction {
    pub visible: bool,
    /// One offset per fixation bar.
    pub offsets: Vec<Vec3>,
}

impl FrameInstructions {
    pub fn mask_visible(&self) -> bool {
        self.mask_tiles.iter().any(|t| t.visible)
    }
}
