use crate::coords::fixed::{float_to_fixed, FRACTION_MASK};
use crate::coords::{CycleMethod, Transform};

use super::gradient::{narrow_fraction, GradientRamp};
use super::Span;

/// Linear gradient compiled to device space.
///
/// The gradient position of pixel `(x, y)` is `x * mx + y * my + b` in 16.16,
/// with `b` already biased to the pixel center.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    mx: i32,
    my: i32,
    b: i32,
    cycle: CycleMethod,
    ramp: GradientRamp,
}

impl LinearGradient {
    /// `(x0, y0)` maps to position 0 and `(x1, y1)` to position 1, both in
    /// gradient space; `transform` maps gradient space to device space.
    pub fn new(
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        ramp: GradientRamp,
        cycle: CycleMethod,
        transform: Transform,
    ) -> Self {
        let (dx, dy) = (x1 as f64 - x0 as f64, y1 as f64 - y0 as f64);
        let dss = dx * dx + dy * dy;
        let inverse = transform.invert();

        let Some(inv) = inverse.filter(|_| dss > 0.0) else {
            log::debug!("degenerate linear gradient (axis length² {dss}, invertible {})", inverse.is_some());
            return Self { mx: 0, my: 0, b: FRACTION_MASK, cycle, ramp };
        };

        // Position along the axis in gradient space.
        let gx = dx / dss;
        let gy = dy / dss;
        let gb = -(x0 as f64 * gx + y0 as f64 * gy);

        // Fold in the device -> gradient mapping.
        let mx = gx * inv.m00 as f64 + gy * inv.m10 as f64;
        let my = gx * inv.m01 as f64 + gy * inv.m11 as f64;
        let b = gx * inv.m02 as f64 + gy * inv.m12 as f64 + gb + 0.5 * (mx + my);

        Self {
            mx: float_to_fixed(mx as f32),
            my: float_to_fixed(my as f32),
            b: float_to_fixed(b as f32),
            cycle,
            ramp,
        }
    }

    #[inline]
    pub fn cycle(&self) -> CycleMethod {
        self.cycle
    }

    /// Unpadded 16.16 gradient position at the center of pixel `(x, y)`.
    #[inline]
    pub fn fraction_at(&self, x: i32, y: i32) -> i64 {
        x as i64 * self.mx as i64 + y as i64 * self.my as i64 + self.b as i64
    }

    /// Writes straight ARGB ramp colors for `span` into `out`.
    pub fn generate(&self, out: &mut [u32], span: &Span) {
        if span.is_empty() {
            return;
        }
        let mx = self.mx as i64;
        for (row, line) in out.chunks_exact_mut(span.width).take(span.rows).enumerate() {
            // Row start recomputed, not accumulated.
            let mut fraction = self.fraction_at(span.x, span.y + row as i32);
            for px in line {
                *px = self.ramp.lookup(narrow_fraction(fraction, self.cycle), self.cycle);
                fraction += mx;
            }
        }
    }
}
