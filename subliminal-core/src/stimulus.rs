use serde::{Deserialize, Serialize};

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba([r, g, b, 255])
    }

    pub fn is_transparent(&self) -> bool {
        self.0[3] == 0
    }
}

/// Offset relative to the viewer's tracked pose, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextColor {
    White,
    Black,
}

impl TextColor {
    pub fn rgba(self) -> Rgba {
        match self {
            TextColor::White => Rgba::WHITE,
            TextColor::Black => Rgba::BLACK,
        }
    }
}

/// How the stimulus panel is drawn during Flashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Opaque black panel, white letters.
    #[default]
    BlackVoid,
    /// Opaque white panel, black letters.
    WhiteVoid,
    /// Transparent panel over the ambient background.
    TextOnly(TextColor),
}

impl DisplayMode {
    /// Decodes an operator-facing descriptor such as
    /// `"Black void, white letters"`. Matching is case-insensitive on
    /// substrings; the void variants win over the letter color, and
    /// anything unrecognised is white text on a transparent panel.
    pub fn from_descriptor(descriptor: &str) -> Self {
        let normalized = descriptor.to_lowercase();
        if normalized.contains("black void") {
            DisplayMode::BlackVoid
        } else if normalized.contains("white void") {
            DisplayMode::WhiteVoid
        } else if normalized.contains("white letters") {
            DisplayMode::TextOnly(TextColor::White)
        } else if normalized.contains("black letters") {
            DisplayMode::TextOnly(TextColor::Black)
        } else {
            DisplayMode::TextOnly(TextColor::White)
        }
    }
}

/// Colors applied to the stimulus panel, plus the ambient background that
/// stays visible around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashVisuals {
    pub text_color: Rgba,
    pub panel_color: Rgba,
    pub background_label: String,
}

/// One rectangle of a Mondrian mask, positioned in stimulus-panel space with
/// its origin at the panel's bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskTile {
    pub offset: Vec3,
    pub width: f32,
    pub height: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaskLayout {
    pub tiles: Vec<MaskTile>,
}

impl MaskLayout {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
