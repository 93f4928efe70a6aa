use std::fmt;

use crate::coords::fixed::{float_to_fixed, FIXED_SHIFT, FRACTION_MASK};
use crate::coords::{FixedTransform, PixelRect, Transform, TransformKind};
use crate::render::RenderError;

use super::Span;

const OPAQUE: u32 = 0xFF00_0000;

/// Borrowed view of caller pixels, row-major premultiplied ARGB.
///
/// Row `y` starts at `offset + y * stride`.
#[derive(Debug, Copy, Clone)]
pub struct ImageData<'a> {
    pub pixels: &'a [u32],
    pub width: i32,
    pub height: i32,
    pub offset: usize,
    pub stride: usize,
}

impl<'a> ImageData<'a> {
    /// Tightly packed image starting at index 0.
    pub fn packed(pixels: &'a [u32], width: i32, height: i32) -> Self {
        Self { pixels, width, height, offset: 0, stride: width.max(0) as usize }
    }
}

// ── pixel interpolation ──────────────────────────────────────────────────

/// Per-channel `c0 + ((c1 - c0) * frac) >> 16`, truncating.
///
/// `frac` is a 0.16 weight in `[0, 0x10000]`.
#[inline]
pub fn interpolate_2_points(p0: u32, p1: u32, frac: i32) -> u32 {
    let ch = |shift: u32| -> u32 {
        let c0 = ((p0 >> shift) & 0xFF) as i32;
        let c1 = ((p1 >> shift) & 0xFF) as i32;
        ((c0 + (((c1 - c0) * frac) >> FIXED_SHIFT)) as u32 & 0xFF) << shift
    };
    ch(24) | ch(16) | ch(8) | ch(0)
}

/// Bilinear blend: horizontal on both rows, then vertical.
///
/// `p00`/`p01` are the top-left/top-right taps, `p10`/`p11` the bottom ones.
#[inline]
pub fn interpolate_4_points(p00: u32, p01: u32, p10: u32, p11: u32, hfrac: i32, vfrac: i32) -> u32 {
    let top = interpolate_2_points(p00, p01, hfrac);
    let bottom = interpolate_2_points(p10, p11, hfrac);
    interpolate_2_points(top, bottom, vfrac)
}

/// [`interpolate_4_points`] for textures without alpha: output alpha is 0xFF.
#[inline]
pub fn interpolate_4_points_opaque(p00: u32, p01: u32, p10: u32, p11: u32, hfrac: i32, vfrac: i32) -> u32 {
    interpolate_4_points(p00, p01, p10, p11, hfrac, vfrac) | OPAQUE
}

// ── texture paint ────────────────────────────────────────────────────────

/// Owned copy of a source image plus the device -> texture mapping.
#[derive(Clone, PartialEq)]
pub struct Texture {
    pixels: Vec<u32>,
    width: i32,
    height: i32,
    /// Device -> texture in 16.16 with the sampling offset folded into the
    /// translation; `None` when the caller's transform is singular.
    inverse: Option<FixedTransform>,
    kind: TransformKind,
    repeat: bool,
    interpolate: bool,
    has_alpha: bool,
    bounds: PixelRect,
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("kind", &self.kind)
            .field("repeat", &self.repeat)
            .field("interpolate", &self.interpolate)
            .field("has_alpha", &self.has_alpha)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl Texture {
    /// Copies `image` and compiles `transform` (texture -> device).
    ///
    /// Bilinear filtering is used when `smooth` is set and the transform is
    /// more than a whole-pixel translation.
    pub fn new(
        image: ImageData<'_>,
        transform: Transform,
        repeat: bool,
        has_alpha: bool,
        smooth: bool,
    ) -> Result<Self, RenderError> {
        let width = image.width.max(0);
        let height = image.height.max(0);
        let pixels = copy_pixels(&image)?;

        let inverse = transform.invert();
        let kind = inverse.map_or(TransformKind::Generic, |inv| inv.to_fixed().kind());
        let interpolate = smooth && kind != TransformKind::Identity;
        if inverse.is_none() {
            log::debug!("texture transform is singular; texture paints transparent");
        }

        Ok(Self {
            pixels,
            width,
            height,
            inverse: inverse.map(|inv| sampling_transform(inv, interpolate)),
            kind,
            repeat,
            interpolate,
            has_alpha,
            bounds: PixelRect::from_xywh(0, 0, width, height),
        })
    }

    /// Restricts sampling to `bounds` (texture pixels, inclusive) when not
    /// repeating. Clamped to the texture.
    pub fn with_interpolation_bounds(mut self, bounds: PixelRect) -> Self {
        self.bounds = bounds.intersect(PixelRect::from_xywh(0, 0, self.width, self.height));
        self
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    #[inline]
    pub fn interpolates(&self) -> bool {
        self.interpolate
    }

    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Writes premultiplied texture samples for `span` into `out`.
    pub fn generate(&self, out: &mut [u32], span: &Span) {
        if span.is_empty() {
            return;
        }
        let out = &mut out[..span.len()];
        let Some(m) = self.inverse.filter(|_| !self.pixels.is_empty()) else {
            out.fill(0);
            return;
        };
        match self.kind {
            TransformKind::Identity => self.copy_rows(out, span, &m),
            TransformKind::Translate => self.translate_rows(out, span, &m),
            TransformKind::Generic => self.transform_rows(out, span, &m),
        }
    }

    fn copy_rows(&self, out: &mut [u32], span: &Span, m: &FixedTransform) {
        let (tx, ty) = (m.m02 >> FIXED_SHIFT, m.m12 >> FIXED_SHIFT);
        let w = self.width as usize;
        let start_x = span.x as i64 + tx as i64;

        for (row, line) in out.chunks_exact_mut(span.width).enumerate() {
            let sy = span.y as i64 + row as i64 + ty as i64;

            if self.repeat {
                let sy = sy.rem_euclid(self.height as i64) as usize;
                let src = &self.pixels[sy * w..(sy + 1) * w];
                let mut sx = start_x.rem_euclid(w as i64) as usize;
                let mut filled = 0;
                while filled < line.len() {
                    let n = (w - sx).min(line.len() - filled);
                    line[filled..filled + n].copy_from_slice(&src[sx..sx + n]);
                    filled += n;
                    sx = 0;
                }
                self.force_alpha(line);
                continue;
            }

            let b = self.bounds;
            if b.is_empty() || sy < b.min_y as i64 || sy > b.max_y as i64 {
                line.fill(0);
                continue;
            }
            let src = &self.pixels[sy as usize * w..(sy as usize + 1) * w];
            let len = line.len() as i64;
            let lo = (b.min_x as i64 - start_x).clamp(0, len) as usize;
            let hi = (b.max_x as i64 + 1 - start_x).clamp(lo as i64, len) as usize;
            line[..lo].fill(0);
            line[hi..].fill(0);
            if lo < hi {
                let sx = (start_x + lo as i64) as usize;
                line[lo..hi].copy_from_slice(&src[sx..sx + (hi - lo)]);
                self.force_alpha(&mut line[lo..hi]);
            }
        }
    }

    fn translate_rows(&self, out: &mut [u32], span: &Span, m: &FixedTransform) {
        for (row, line) in out.chunks_exact_mut(span.width).enumerate() {
            let mut ltx = ((span.x as i64) << FIXED_SHIFT) + m.m02 as i64;
            let lty = ((span.y as i64 + row as i64) << FIXED_SHIFT) + m.m12 as i64;
            for px in line {
                *px = self.sample(ltx, lty);
                ltx += 1 << FIXED_SHIFT;
            }
        }
    }

    fn transform_rows(&self, out: &mut [u32], span: &Span, m: &FixedTransform) {
        let (x, m00, m10) = (span.x as i64, m.m00 as i64, m.m10 as i64);
        for (row, line) in out.chunks_exact_mut(span.width).enumerate() {
            let y = span.y as i64 + row as i64;
            let mut ltx = m00 * x + m.m01 as i64 * y + m.m02 as i64;
            let mut lty = m10 * x + m.m11 as i64 * y + m.m12 as i64;
            for px in line {
                *px = self.sample(ltx, lty);
                ltx += m00;
                lty += m10;
            }
        }
    }

    /// Sample at a 16.16 texture coordinate (already offset for the filter).
    #[inline]
    fn sample(&self, ltx: i64, lty: i64) -> u32 {
        let ix = (ltx >> FIXED_SHIFT) as i32;
        let iy = (lty >> FIXED_SHIFT) as i32;
        if self.interpolate {
            let hfrac = (ltx & FRACTION_MASK as i64) as i32;
            let vfrac = (lty & FRACTION_MASK as i64) as i32;
            self.sample_bilinear(ix, iy, hfrac, vfrac)
        } else {
            self.sample_nearest(ix, iy)
        }
    }

    fn sample_nearest(&self, ix: i32, iy: i32) -> u32 {
        if self.repeat {
            self.texel(ix.rem_euclid(self.width), iy.rem_euclid(self.height))
        } else if self.bounds.contains(ix, iy) {
            self.texel(ix, iy)
        } else {
            0
        }
    }

    fn sample_bilinear(&self, ix: i32, iy: i32, hfrac: i32, vfrac: i32) -> u32 {
        let (x0, x1, y0, y1) = if self.repeat {
            let x0 = ix.rem_euclid(self.width);
            let y0 = iy.rem_euclid(self.height);
            (x0, wrap_next(x0, self.width), y0, wrap_next(y0, self.height))
        } else {
            let b = self.bounds;
            // The filter footprint of [min - 1, max] still overlaps the bounds.
            if b.is_empty() || ix < b.min_x - 1 || ix > b.max_x || iy < b.min_y - 1 || iy > b.max_y {
                return 0;
            }
            (ix.max(b.min_x), (ix + 1).min(b.max_x), iy.max(b.min_y), (iy + 1).min(b.max_y))
        };

        let p00 = self.texel(x0, y0);
        let p01 = self.texel(x1, y0);
        let p10 = self.texel(x0, y1);
        let p11 = self.texel(x1, y1);
        if self.has_alpha {
            interpolate_4_points(p00, p01, p10, p11, hfrac, vfrac)
        } else {
            interpolate_4_points_opaque(p00, p01, p10, p11, hfrac, vfrac)
        }
    }

    #[inline]
    fn texel(&self, x: i32, y: i32) -> u32 {
        let p = self.pixels[(y * self.width + x) as usize];
        if self.has_alpha { p } else { p | OPAQUE }
    }

    fn force_alpha(&self, line: &mut [u32]) {
        if !self.has_alpha {
            line.iter_mut().for_each(|p| *p |= OPAQUE);
        }
    }
}

#[inline]
fn wrap_next(i: i32, size: i32) -> i32 {
    if i + 1 == size { 0 } else { i + 1 }
}

/// Samples land on pixel centers; bilinear taps sit half a texel earlier.
fn sampling_transform(inv: Transform, interpolate: bool) -> FixedTransform {
    let filter = if interpolate { 0.5 } else { 0.0 };
    let origin = |m0: f32, m1: f32, m2: f32| {
        let v = m2 as f64 + 0.5 * (m0 as f64 + m1 as f64) - filter;
        float_to_fixed(v as f32)
    };
    FixedTransform {
        m00: float_to_fixed(inv.m00),
        m01: float_to_fixed(inv.m01),
        m02: origin(inv.m00, inv.m01, inv.m02),
        m10: float_to_fixed(inv.m10),
        m11: float_to_fixed(inv.m11),
        m12: origin(inv.m10, inv.m11, inv.m12),
    }
}

fn copy_pixels(image: &ImageData<'_>) -> Result<Vec<u32>, RenderError> {
    let w = image.width.max(0) as usize;
    let h = image.height.max(0) as usize;
    let len = w.checked_mul(h).ok_or(RenderError::AllocationFailed { requested: usize::MAX })?;

    let mut pixels = Vec::new();
    if pixels.try_reserve_exact(len).is_err() {
        log::warn!("texture copy of {len} pixels failed to allocate");
        return Err(RenderError::AllocationFailed { requested: len });
    }
    for row in 0..h {
        let start = image.offset + row * image.stride;
        pixels.extend_from_slice(&image.pixels[start..start + w]);
    }
    Ok(pixels)
}
