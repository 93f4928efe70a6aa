use std::fmt;

use crate::coords::fixed::{pad, FIXED_SHIFT};
use crate::coords::CycleMethod;

use super::color::{alpha, blue, green, pack, red};
use super::Color;

/// log2 of the ramp table size.
pub const GRADIENT_MAP_SIZE_LG: u32 = 8;
/// Number of entries in a gradient ramp.
pub const GRADIENT_MAP_SIZE: usize = 1 << GRADIENT_MAP_SIZE_LG;

/// A single gradient stop.
///
/// `offset` is expected in [0, 1]; stops outside that range still take part in
/// interpolation but only the [0, 1] part of the ramp is ever sampled.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Color,
}

impl ColorStop {
    #[inline]
    pub const fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Precomputed gradient lookup table of straight ARGB colors.
///
/// Indexed by a 16.16 gradient fraction after [`pad`], shifted down to
/// `GRADIENT_MAP_SIZE_LG` bits.
#[derive(Clone, PartialEq, Eq)]
pub struct GradientRamp {
    colors: Box<[u32; GRADIENT_MAP_SIZE]>,
}

impl fmt::Debug for GradientRamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientRamp")
            .field("first", &format_args!("{:#010x}", self.colors[0]))
            .field("last", &format_args!("{:#010x}", self.colors[GRADIENT_MAP_SIZE - 1]))
            .finish()
    }
}

impl GradientRamp {
    pub fn from_colors(colors: &[u32; GRADIENT_MAP_SIZE]) -> Self {
        Self { colors: Box::new(*colors) }
    }

    pub fn solid(color: Color) -> Self {
        Self { colors: Box::new([color.to_argb(); GRADIENT_MAP_SIZE]) }
    }

    /// Builds the ramp by interpolating between stops in straight ARGB.
    ///
    /// Stops are sorted by offset first. Positions before the first stop take
    /// its color, positions after the last take the last. No stops yields a
    /// transparent ramp.
    pub fn from_stops(stops: &[ColorStop]) -> Self {
        let mut sorted: Vec<ColorStop> = stops.to_vec();
        sorted.sort_by(|a, b| a.offset.total_cmp(&b.offset));

        let mut colors = Box::new([0u32; GRADIENT_MAP_SIZE]);
        let (Some(first), Some(last)) = (sorted.first().copied(), sorted.last().copied()) else {
            return Self { colors };
        };

        let mut next = 0usize;
        for (i, slot) in colors.iter_mut().enumerate() {
            let t = i as f32 / (GRADIENT_MAP_SIZE - 1) as f32;
            while next < sorted.len() && sorted[next].offset <= t {
                next += 1;
            }
            *slot = if next == 0 {
                first.color.to_argb()
            } else if next == sorted.len() {
                last.color.to_argb()
            } else {
                let lo = sorted[next - 1];
                let hi = sorted[next];
                let span = hi.offset - lo.offset;
                let w = if span > 0.0 { (t - lo.offset) / span } else { 0.0 };
                lerp_argb(lo.color.to_argb(), hi.color.to_argb(), w)
            };
        }
        Self { colors }
    }

    #[inline]
    pub fn colors(&self) -> &[u32; GRADIENT_MAP_SIZE] {
        &self.colors
    }

    /// Color for a 16.16 fraction folded by `cycle`.
    #[inline]
    pub fn lookup(&self, fraction: i32, cycle: CycleMethod) -> u32 {
        let index = pad(fraction, cycle) >> (FIXED_SHIFT - GRADIENT_MAP_SIZE_LG);
        self.colors[index as usize]
    }

    #[inline]
    pub fn last(&self) -> u32 {
        self.colors[GRADIENT_MAP_SIZE - 1]
    }
}

fn lerp_argb(c0: u32, c1: u32, w: f32) -> u32 {
    let ch = |a: u32, b: u32| -> u32 {
        let v = a as f32 + (b as f32 - a as f32) * w;
        (v + 0.5).clamp(0.0, 255.0) as u32
    };
    pack(
        ch(alpha(c0), alpha(c1)),
        ch(red(c0), red(c1)),
        ch(green(c0), green(c1)),
        ch(blue(c0), blue(c1)),
    )
}

/// Narrows an `i64` gradient accumulator to the `i32` fraction `pad` expects.
///
/// `Repeat` and `Reflect` only look at the low 17 bits, so wrapping keeps
/// them exact; `None` saturates so far-away pixels still clamp to the edge.
#[inline]
pub(crate) fn narrow_fraction(fraction: i64, cycle: CycleMethod) -> i32 {
    match cycle {
        CycleMethod::None => fraction.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        CycleMethod::Repeat | CycleMethod::Reflect => fraction as i32,
    }
}
