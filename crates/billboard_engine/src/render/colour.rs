//! Colour values and packed vertex colours

use serde::{Deserialize, Serialize};

/// Floating-point RGBA colour, channels nominally in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColourValue {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel
    pub a: f32,
}

impl Default for ColourValue {
    fn default() -> Self {
        Self::WHITE
    }
}

impl ColourValue {
    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque red
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    /// Opaque green
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    /// Opaque blue
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Create a colour from its four channels
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Pack as `0xAARRGGBB`
    pub fn as_argb(&self) -> u32 {
        let [r, g, b, a] = self.channels_u8();
        u32::from_be_bytes([a, r, g, b])
    }

    /// Pack as `0xAABBGGRR`; in little-endian memory the bytes read R, G, B, A
    pub fn as_abgr(&self) -> u32 {
        let [r, g, b, a] = self.channels_u8();
        u32::from_be_bytes([a, b, g, r])
    }

    fn channels_u8(&self) -> [u8; 4] {
        // Truncating conversion, channel values are clamped first
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }
}

/// Channel order a render system expects for packed vertex colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VertexColourFormat {
    /// `0xAARRGGBB` (D3D style)
    Argb,
    /// `0xAABBGGRR` (GL / Vulkan style, RGBA byte order in memory)
    #[default]
    Abgr,
}

impl VertexColourFormat {
    /// Pack a colour in this channel order
    pub fn pack(self, colour: &ColourValue) -> u32 {
        match self {
            Self::Argb => colour.as_argb(),
            Self::Abgr => colour.as_abgr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_orders() {
        let colour = ColourValue::new(1.0, 0.0, 0.5, 1.0);

        assert_eq!(colour.as_argb(), 0xFF_FF_00_7F);
        assert_eq!(colour.as_abgr(), 0xFF_7F_00_FF);
        assert_eq!(VertexColourFormat::Abgr.pack(&colour).to_le_bytes(), [0xFF, 0x00, 0x7F, 0xFF]);
    }

    #[test]
    fn test_out_of_range_channels_are_clamped() {
        let colour = ColourValue::new(2.0, -1.0, 0.0, 1.0);
        assert_eq!(colour.as_argb(), 0xFF_FF_00_00);
    }
}
