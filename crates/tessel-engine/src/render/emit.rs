//! Scanline emission: writes paint x coverage into destination rows.
//!
//! Each entry point handles one coverage source (fractional rectangle edges,
//! 8-bit mask, LCD mask, alpha-delta row) for a block of rows whose paint
//! has already been generated.

use crate::coords::fixed::{FIXED_ONE, FIXED_SHIFT};
use crate::device::PixelFormat;
use crate::paint::color::{alpha, unpremultiply};
use crate::paint::Span;

use super::alpha_map::AlphaMap;
use super::blend::{blend, blend_lcd, blend_straight, lcd_coverage, CompositeRule, LcdGamma};

/// Destination rows locked for one emission call.
pub(crate) struct Target<'a> {
    pixels: &'a mut [u32],
    stride: usize,
    format: PixelFormat,
    rule: CompositeRule,
}

impl<'a> Target<'a> {
    pub(crate) fn new(pixels: &'a mut [u32], stride: usize, format: PixelFormat, rule: CompositeRule) -> Self {
        Self { pixels, stride, format, rule }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.stride + x as usize
    }

    /// Blends premultiplied `src` at `idx` with 8-bit `coverage`.
    #[inline]
    fn put(&mut self, idx: usize, src: u32, coverage: u32) {
        if coverage == 0 {
            return;
        }
        let px = &mut self.pixels[idx];
        if coverage == 255 && self.rule.overwrites(src) {
            *px = self.format.store(src);
        } else if self.format.is_premultiplied() {
            *px = blend(self.rule, *px, src, coverage);
        } else {
            *px = blend_straight(self.rule, *px, src, coverage);
        }
    }

    /// Zeroes `len` pixels starting at `(x, y)`.
    pub(crate) fn clear_run(&mut self, x: i32, y: i32, len: usize) {
        let start = self.index(x, y);
        self.pixels[start..start + len].fill(0);
    }
}

/// Premultiplied paint for a block of rows.
#[derive(Debug, Copy, Clone)]
pub(crate) enum Source<'a> {
    Solid(u32),
    Paint { pixels: &'a [u32], stride: usize },
}

impl<'a> Source<'a> {
    #[inline]
    fn at(&self, row: usize, col: usize) -> u32 {
        match *self {
            Source::Solid(c) => c,
            Source::Paint { pixels, stride } => pixels[row * stride + col],
        }
    }

    /// The same source starting `row` rows further down.
    #[inline]
    pub(crate) fn row(self, row: usize) -> Source<'a> {
        match self {
            Source::Solid(c) => Source::Solid(c),
            Source::Paint { pixels, stride } => Source::Paint { pixels: &pixels[row * stride..], stride },
        }
    }
}

/// Fractional coverage of the first and last column of a rectangle row.
///
/// Zero means the column is fully covered. A single-column rectangle keeps
/// its combined coverage in `left` with `right` zero.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub(crate) struct Edges {
    pub left: i32,
    pub right: i32,
}

impl Edges {
    #[inline]
    fn column(&self, col: usize, width: usize) -> i32 {
        if col == 0 && self.left != 0 {
            self.left
        } else if col + 1 == width && self.right != 0 {
            self.right
        } else {
            FIXED_ONE
        }
    }
}

/// 16.16 row and column fractions to 8-bit coverage.
#[inline]
pub(crate) fn coverage8(row_frac: i32, col_frac: i32) -> u32 {
    let c = (row_frac as i64 * col_frac as i64) >> FIXED_SHIFT;
    if c >= FIXED_ONE as i64 { 255 } else { (c.max(0) >> 8) as u32 }
}

/// Rectangle rows: every pixel gets `row_frac` times its column fraction.
pub(crate) fn emit_rect_rows(target: &mut Target<'_>, source: Source<'_>, span: &Span, row_frac: i32, edges: Edges) {
    let width = span.width;
    // Interior columns share one coverage value.
    let first = usize::from(edges.left != 0);
    let last = if edges.right != 0 && width > first { width - 1 } else { width };
    let interior = coverage8(row_frac, FIXED_ONE);

    for row in 0..span.rows {
        let base = target.index(span.x, span.y + row as i32);
        let src = source.row(row);

        if first == 1 {
            target.put(base, src.at(0, 0), coverage8(row_frac, edges.column(0, width)));
        }
        match src {
            Source::Solid(c) if interior == 255 && target.rule.overwrites(c) => {
                let stored = target.format.store(c);
                target.pixels[base + first..base + last].fill(stored);
            }
            _ => {
                for col in first..last {
                    target.put(base + col, src.at(0, col), interior);
                }
            }
        }
        if last < width {
            target.put(base + last, src.at(0, last), coverage8(row_frac, edges.column(last, width)));
        }
    }
}

/// Rows covered by an 8-bit mask; `mask[offset + row * stride + col]`.
pub(crate) fn emit_mask_rows(
    target: &mut Target<'_>,
    source: Source<'_>,
    span: &Span,
    mask: &[u8],
    offset: usize,
    stride: usize,
) {
    for row in 0..span.rows {
        let base = target.index(span.x, span.y + row as i32);
        let coverage = &mask[offset + row * stride..][..span.width];
        for (col, &a) in coverage.iter().enumerate() {
            target.put(base + col, source.at(row, col), a as u32);
        }
    }
}

/// Subpixel channels an LCD mask covers in its first and last column.
///
/// Glyphs positioned at a third of a pixel start part-way into their first
/// pixel and stop part-way into their last one.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct SubpixelEdges {
    pub lead: [bool; 3],
    pub trail: [bool; 3],
}

impl SubpixelEdges {
    pub(crate) const FULL: SubpixelEdges = SubpixelEdges { lead: [true; 3], trail: [true; 3] };

    /// Decodes `sub_pos_x`: bits 2..4 hold the leading offset, bits 0..2 the
    /// trailing one.
    ///
    /// A leading offset of 1 leaves red uncovered, 2 leaves red and green.
    /// A trailing offset of 1 covers only red, 2 covers red and green.
    /// Offsets of 0 or 3 cover the whole pixel.
    pub(crate) fn from_sub_pos(sub_pos_x: u8) -> Self {
        let lead = match (sub_pos_x >> 2) & 3 {
            1 => [false, true, true],
            2 => [false, false, true],
            _ => [true; 3],
        };
        let trail = match sub_pos_x & 3 {
            1 => [true, false, false],
            2 => [true, true, false],
            _ => [true; 3],
        };
        Self { lead, trail }
    }

    #[inline]
    fn apply(&self, rgb: [u8; 3], col: usize, width: usize) -> [u8; 3] {
        let (first, last) = (col == 0, col + 1 == width);
        std::array::from_fn(|ch| {
            let keep = (!first || self.lead[ch]) && (!last || self.trail[ch]);
            if keep { rgb[ch] } else { 0 }
        })
    }
}

/// Rows covered by an LCD mask of three bytes per pixel (red, green, blue
/// subpixels); `mask[offset + row * stride + 3 * col + channel]`.
///
/// Only source-over has a subpixel blend. Other rules use the mean of the
/// three coverages through the regular path.
#[allow(clippy::too_many_arguments)]
pub(crate) fn emit_lcd_rows(
    target: &mut Target<'_>,
    source: Source<'_>,
    span: &Span,
    mask: &[u8],
    offset: usize,
    stride: usize,
    edges: SubpixelEdges,
    gamma: &LcdGamma,
) {
    let subpixel = target.rule == CompositeRule::SrcOver;
    for row in 0..span.rows {
        let base = target.index(span.x, span.y + row as i32);
        let coverage = &mask[offset + row * stride..][..3 * span.width];
        for (col, rgb) in coverage.chunks_exact(3).enumerate() {
            let rgb = edges.apply([rgb[0], rgb[1], rgb[2]], col, span.width);
            if rgb == [0; 3] {
                continue;
            }
            let src = source.at(row, col);
            if !subpixel {
                let mean = (rgb.iter().map(|&c| c as u32).sum::<u32>() + 1) / 3;
                target.put(base + col, src, mean);
                continue;
            }
            let straight = unpremultiply(src);
            let cov = lcd_coverage(rgb, alpha(straight));
            if cov == [0; 3] {
                continue;
            }
            let idx = base + col;
            let dst = target.format.load(target.pixels[idx]);
            target.pixels[idx] = target.format.store(blend_lcd(dst, straight, cov, gamma));
        }
    }
}

/// One row from accumulated coverage deltas.
///
/// The running sum starts at `sum`, adds `deltas[col]` before pixel `col`
/// and maps through `alpha_map`. Consumed deltas are zeroed.
pub(crate) fn emit_alpha_row(
    target: &mut Target<'_>,
    source: Source<'_>,
    span: &Span,
    deltas: &mut [i32],
    mut sum: i32,
    alpha_map: &AlphaMap,
) {
    let base = target.index(span.x, span.y);
    for (col, delta) in deltas[..span.width].iter_mut().enumerate() {
        sum = sum.wrapping_add(*delta);
        *delta = 0;
        target.put(base + col, source.at(0, col), alpha_map.coverage(sum));
    }
}
