use crate::paint::color::{premultiply, unpremultiply};

/// Memory layout of destination pixels.
///
/// Both are packed `0xAARRGGBB` words; they differ in whether color
/// channels are premultiplied by alpha.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    /// Premultiplied alpha. Blends read and write it directly.
    #[default]
    ArgbPre,
    /// Straight alpha. Converted on every load and store.
    Argb,
}

impl PixelFormat {
    /// Stored pixel to premultiplied ARGB.
    #[inline]
    pub fn load(self, stored: u32) -> u32 {
        match self {
            PixelFormat::ArgbPre => stored,
            PixelFormat::Argb => premultiply(stored),
        }
    }

    /// Premultiplied ARGB to the stored representation.
    #[inline]
    pub fn store(self, premultiplied: u32) -> u32 {
        match self {
            PixelFormat::ArgbPre => premultiplied,
            PixelFormat::Argb => unpremultiply(premultiplied),
        }
    }

    #[inline]
    pub fn is_premultiplied(self) -> bool {
        self == PixelFormat::ArgbPre
    }
}
