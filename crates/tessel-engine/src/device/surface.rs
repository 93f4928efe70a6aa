use crate::render::RenderError;

use super::PixelFormat;

/// Destination pixel buffer the renderer draws into.
///
/// The renderer brackets every write with `acquire`/`release` (through
/// [`SurfaceLock`](super::SurfaceLock)) and only calls `pixels_mut` in
/// between. Implementations backed by shared or foreign memory use the
/// bracket to pin it.
pub trait Surface {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    /// Pixels between the starts of consecutive rows.
    fn stride(&self) -> usize {
        self.width().max(0) as usize
    }

    fn format(&self) -> PixelFormat {
        PixelFormat::ArgbPre
    }

    fn acquire(&mut self);

    /// At least `stride * (height - 1) + width` pixels.
    fn pixels_mut(&mut self) -> &mut [u32];

    fn release(&mut self);
}

/// Owned in-memory surface.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: i32,
    height: i32,
    format: PixelFormat,
    pixels: Vec<u32>,
    locked: bool,
}

impl PixelSurface {
    /// Zeroed premultiplied surface.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        Self::with_format(width, height, PixelFormat::ArgbPre)
    }

    pub fn with_format(width: u32, height: u32, format: PixelFormat) -> Result<Self, RenderError> {
        let too_large = RenderError::SurfaceTooLarge { width, height };
        let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
            return Err(too_large);
        };
        let len = (width as usize).checked_mul(height as usize).ok_or(too_large)?;

        let mut pixels = Vec::new();
        if pixels.try_reserve_exact(len).is_err() {
            log::warn!("surface allocation of {width}x{height} failed");
            return Err(RenderError::AllocationFailed { requested: len });
        }
        pixels.resize(len, 0);

        log::debug!("surface created: {width}x{height} {format:?}");
        Ok(Self { width: w, height: h, format, pixels, locked: false })
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Stored value at `(x, y)`; panics when out of bounds.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> u32 {
        assert!(x >= 0 && x < self.width && y >= 0 && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Raw pixel words as native-endian bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn fill(&mut self, argb: u32) {
        self.pixels.fill(argb);
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Surface for PixelSurface {
    #[inline]
    fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn format(&self) -> PixelFormat {
        self.format
    }

    fn acquire(&mut self) {
        debug_assert!(!self.locked, "surface acquired twice");
        self.locked = true;
    }

    #[inline]
    fn pixels_mut(&mut self) -> &mut [u32] {
        debug_assert!(self.locked, "surface written outside acquire/release");
        &mut self.pixels
    }

    fn release(&mut self) {
        self.locked = false;
    }
}
