//! Stimulus panel colors for a display mode.

use subliminal_core::{DisplayMode, FlashVisuals, Rgba};

/// Text and panel colors for `mode`, carrying the ambient background label
/// through unchanged. Pure: identical inputs give identical outputs.
pub fn resolve(mode: DisplayMode, background: &str) -> FlashVisuals {
    let (text_color, panel_color) = match mode {
        DisplayMode::BlackVoid => (Rgba::WHITE, Rgba::BLACK),
        DisplayMode::WhiteVoid => (Rgba::BLACK, Rgba::WHITE),
        DisplayMode::TextOnly(color) => (color.rgba(), Rgba::TRANSPARENT),
    };
    FlashVisuals {
        text_color,
        panel_color,
        background_label: background.to_string(),
    }
}

/// [`resolve`] for a raw operator descriptor.
pub fn resolve_descriptor(descriptor: &str, background: &str) -> FlashVisuals {
    resolve(DisplayMode::from_descriptor(descriptor), background)
}
