use crate::coords::fixed::FIXED_ONE;
use crate::coords::{CycleMethod, Transform};

use super::gradient::{narrow_fraction, GradientRamp};
use super::Span;

/// Focus may not sit closer to the circle than this fraction of the radius.
const MAX_FOCUS_RATIO: f64 = 0.99;

/// Focal radial gradient compiled to device space.
///
/// For a sample point `P` in gradient space, with `e = F - C` and `d = P - F`,
/// the gradient position is `g = U + sqrt(V)` where
///
/// ```text
/// U = (e·d) / c        V = ((e·d)² + |d|² c) / c²        c = r² - |e|²
/// ```
///
/// Along a row `d` advances by `(a00, a10)`, so `U` is linear and `V` is
/// quadratic in `x`; both are stepped with forward differences.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    a00: f64,
    a01: f64,
    a02: f64,
    a10: f64,
    a11: f64,
    a12: f64,
    cx: f64,
    cy: f64,
    fx: f64,
    fy: f64,
    r: f64,
    rsq: f64,
    a00a00: f64,
    a10a10: f64,
    a00a10: f64,
    degenerate: bool,
    cycle: CycleMethod,
    ramp: GradientRamp,
}

impl RadialGradient {
    /// `transform` maps gradient space to device space.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cx: f32,
        cy: f32,
        fx: f32,
        fy: f32,
        radius: f32,
        ramp: GradientRamp,
        cycle: CycleMethod,
        transform: Transform,
    ) -> Self {
        let (cx, cy, r) = (cx as f64, cy as f64, radius as f64);
        let (mut fx, mut fy) = (fx as f64, fy as f64);

        let inverse = transform.invert();
        let degenerate = !(r > 0.0 && r.is_finite()) || inverse.is_none();
        if degenerate {
            log::debug!("degenerate radial gradient (radius {r}, invertible {})", inverse.is_some());
        } else {
            let (ex, ey) = (fx - cx, fy - cy);
            let dist = ex.hypot(ey);
            let limit = r * MAX_FOCUS_RATIO;
            if dist > limit {
                let k = limit / dist;
                fx = cx + ex * k;
                fy = cy + ey * k;
                log::debug!("radial focus pulled inside the circle to ({fx}, {fy})");
            }
        }

        let inv = inverse.unwrap_or(Transform::IDENTITY);
        let (a00, a01, a02) = (inv.m00 as f64, inv.m01 as f64, inv.m02 as f64);
        let (a10, a11, a12) = (inv.m10 as f64, inv.m11 as f64, inv.m12 as f64);

        Self {
            a00,
            a01,
            a02,
            a10,
            a11,
            a12,
            cx,
            cy,
            fx,
            fy,
            r,
            rsq: r * r,
            a00a00: a00 * a00,
            a10a10: a10 * a10,
            a00a10: a00 * a10,
            degenerate,
            cycle,
            ramp,
        }
    }

    #[inline]
    pub fn cycle(&self) -> CycleMethod {
        self.cycle
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.r as f32
    }

    /// Focus after clamping into the circle.
    #[inline]
    pub fn focus(&self) -> (f32, f32) {
        (self.fx as f32, self.fy as f32)
    }

    /// Writes straight ARGB ramp colors for `span` into `out`.
    pub fn generate(&self, out: &mut [u32], span: &Span) {
        if span.is_empty() {
            return;
        }
        let rows = out.chunks_exact_mut(span.width).take(span.rows);
        if self.degenerate {
            let last = self.ramp.last();
            rows.for_each(|line| line.fill(last));
            return;
        }

        let (ex, ey) = (self.fx - self.cx, self.fy - self.cy);
        let c = self.rsq - (ex * ex + ey * ey);
        let inv_c = 1.0 / c;
        let inv_c2 = inv_c * inv_c;

        // Per-pixel step of d and its projections; identical for every row.
        let step_sq = self.a00a00 + self.a10a10;
        let e_step = ex * self.a00 + ey * self.a10;
        let e_step_sq = ex * ex * self.a00a00 + 2.0 * ex * ey * self.a00a10 + ey * ey * self.a10a10;
        let du = e_step * inv_c;
        let ddv = 2.0 * (e_step_sq + step_sq * c) * inv_c2;

        for (row, line) in rows.enumerate() {
            let (dx, dy) = self.offset_from_focus(span.x, span.y + row as i32);
            let ed = ex * dx + ey * dy;
            let d_step = dx * self.a00 + dy * self.a10;

            let mut u = ed * inv_c;
            let mut v = (ed * ed + (dx * dx + dy * dy) * c) * inv_c2;
            let mut dv = (2.0 * ed * e_step + e_step_sq + (2.0 * d_step + step_sq) * c) * inv_c2;

            for px in line {
                *px = self.color_at(gradient_position(u, v));
                u += du;
                v += dv;
                dv += ddv;
            }
        }
    }

    /// `d = P - F` for the center of device pixel `(x, y)`.
    #[inline]
    fn offset_from_focus(&self, x: i32, y: i32) -> (f64, f64) {
        let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
        (
            self.a00 * px + self.a01 * py + self.a02 - self.fx,
            self.a10 * px + self.a11 * py + self.a12 - self.fy,
        )
    }

    #[inline]
    fn color_at(&self, position: f64) -> u32 {
        let fraction = (position * FIXED_ONE as f64) as i64;
        self.ramp.lookup(narrow_fraction(fraction, self.cycle), self.cycle)
    }

    /// Closed-form position at a device pixel, for checking the stepped one.
    #[cfg(test)]
    fn position_direct(&self, x: i32, y: i32) -> f64 {
        let (ex, ey) = (self.fx - self.cx, self.fy - self.cy);
        let c = self.rsq - (ex * ex + ey * ey);
        let (dx, dy) = self.offset_from_focus(x, y);
        let ed = ex * dx + ey * dy;
        let v = (ed * ed + (dx * dx + dy * dy) * c) / (c * c);
        gradient_position(ed / c, v)
    }
}

/// `U + sqrt(V)`, with `V` clamped at 0 against rounding near the focus.
#[inline]
fn gradient_position(u: f64, v: f64) -> f64 {
    u + v.max(0.0).sqrt()
}
