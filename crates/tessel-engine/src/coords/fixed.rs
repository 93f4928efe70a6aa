//! 16.16 fixed-point helpers shared by the paint generators and the emitter.
//!
//! Everything that runs per pixel works on `i32` raw values where
//! `real = raw / 65536`. Accumulators that multiply coordinates by
//! coefficients widen to `i64` before shifting back.

pub const FIXED_SHIFT: u32 = 16;
pub const FIXED_ONE: i32 = 1 << FIXED_SHIFT;
pub const FIXED_HALF: i32 = 1 << (FIXED_SHIFT - 1);
pub const FRACTION_MASK: i32 = FIXED_ONE - 1;

/// Policy for mapping a gradient position outside `[0, 1)` back into range.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CycleMethod {
    /// Clamp to the edge colors.
    #[default]
    None,
    /// Wrap around (sawtooth).
    Repeat,
    /// Fold back and forth (triangle wave).
    Reflect,
}

/// Rounding linear interpolation in S15.16: `a + ((b - a) * frac + 0.5) >> 16`.
///
/// `frac` is a 0.16 weight in `[0, 0x10000]`. Used for cursor and opacity math;
/// pixel color blends use the truncating
/// [`interpolate_2_points`](crate::paint::texture::interpolate_2_points) instead.
#[inline]
pub fn interp(a: i32, b: i32, frac: i32) -> i32 {
    let delta = (b as i64 - a as i64) * frac as i64 + FIXED_HALF as i64;
    (a as i64 + (delta >> FIXED_SHIFT)) as i32
}

/// Folds a 16.16 gradient fraction into `[0, 0xFFFF]` according to `cycle`.
#[inline]
pub fn pad(fraction: i32, cycle: CycleMethod) -> i32 {
    match cycle {
        CycleMethod::None => fraction.clamp(0, FRACTION_MASK),
        CycleMethod::Repeat => fraction & FRACTION_MASK,
        CycleMethod::Reflect => {
            let folded = fraction & 0x1FFFF;
            if folded > FRACTION_MASK {
                // 0x10000 itself mirrors onto 0x10000; keep it in range.
                (0x20000 - folded).min(FRACTION_MASK)
            } else {
                folded
            }
        }
    }
}

/// Converts an `f32` to S15.16 by decomposing the IEEE-754 bit pattern.
///
/// The result truncates toward zero. Magnitudes of 32768 and above wrap.
/// NaN and the infinities have no defined mapping: callers must not rely on
/// whatever this returns for them. Zero of either sign and subnormals map to 0.
pub fn float_to_fixed(value: f32) -> i32 {
    let bits = value.to_bits();
    let exponent = ((bits >> 23) & 0xFF) as i32;
    if exponent == 0 {
        return 0;
    }

    // value = mantissa * 2^(exponent - 150), fixed = value * 2^16
    let mantissa = ((bits & 0x7F_FFFF) | 0x80_0000) as i64;
    let shift = exponent - 134;
    let magnitude = if shift >= 0 {
        mantissa << shift.min(39)
    } else if shift > -40 {
        mantissa >> -shift
    } else {
        0
    };

    let fixed = magnitude as i32;
    if bits >> 31 != 0 { fixed.wrapping_neg() } else { fixed }
}

#[inline]
pub fn fixed_to_f32(value: i32) -> f32 {
    value as f32 / FIXED_ONE as f32
}

/// Integer part, rounding toward negative infinity.
#[inline]
pub const fn floor_to_int(value: i32) -> i32 {
    value >> FIXED_SHIFT
}

/// Smallest integer not below `value`.
#[inline]
pub const fn ceil_to_int(value: i32) -> i32 {
    ((value as i64 + FRACTION_MASK as i64) >> FIXED_SHIFT) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::texture::interpolate_2_points;

    // ── interp ────────────────────────────────────────────────────────────

    #[test]
    fn interp_hits_endpoints() {
        assert_eq!(interp(10, 200, 0), 10);
        assert_eq!(interp(10, 200, FIXED_ONE), 200);
        assert_eq!(interp(-300, 5, FIXED_ONE), 5);
    }

    #[test]
    fn interp_is_monotonic_in_frac() {
        let (a, b) = (3, 250);
        let mut prev = interp(a, b, 0);
        for frac in (0..=FIXED_ONE).step_by(97) {
            let v = interp(a, b, frac);
            assert!(v >= prev, "interp dropped at frac {frac:#x}: {v} < {prev}");
            prev = v;
        }
        assert_eq!(interp(a, b, FIXED_ONE), b);
    }

    #[test]
    fn interp_rounds_but_color_blend_truncates() {
        // Halfway between 0 and 1: the cursor helper rounds up,
        // the pixel helper truncates.
        assert_eq!(interp(0, 1, FIXED_HALF), 1);
        assert_eq!(interp_channel(0, 1, FIXED_HALF), 0);

        assert_eq!(interp(0, 255, 0x0101), 1);
        assert_eq!(interp_channel(0, 255, 0x0101), 0);
    }

    fn interp_channel(a: u32, b: u32, frac: i32) -> u32 {
        interpolate_2_points(a, b, frac) & 0xFF
    }

    // ── pad ───────────────────────────────────────────────────────────────

    const SAMPLES: [i32; 14] = [
        0, 1, 0x7FFF, 0xFFFF, 0x10000, 0x10001, 0x18000, 0x1FFFF, 0x20000, 0x2ABCD,
        0x7FFF_FFFF, -1, -0x10000, i32::MIN + 1,
    ];

    #[test]
    fn pad_none_clamps() {
        assert_eq!(pad(-5, CycleMethod::None), 0);
        assert_eq!(pad(0x8000, CycleMethod::None), 0x8000);
        assert_eq!(pad(0x12345, CycleMethod::None), 0xFFFF);
    }

    #[test]
    fn pad_repeat_is_idempotent_and_in_range() {
        for &f in &SAMPLES {
            let once = pad(f, CycleMethod::Repeat);
            assert!((0..=0xFFFF).contains(&once));
            assert_eq!(pad(once, CycleMethod::Repeat), once);
        }
        assert_eq!(pad(0x18000, CycleMethod::Repeat), 0x8000);
        assert_eq!(pad(-0x4000, CycleMethod::Repeat), 0xC000);
    }

    #[test]
    fn pad_reflect_is_symmetric() {
        for &f in &SAMPLES {
            assert_eq!(
                pad(f, CycleMethod::Reflect),
                pad(f.wrapping_neg(), CycleMethod::Reflect),
                "reflect asymmetric at {f:#x}"
            );
        }
        for f in (-0x40000..0x40000).step_by(0x1111) {
            assert_eq!(pad(f, CycleMethod::Reflect), pad(-f, CycleMethod::Reflect));
        }
    }

    #[test]
    fn pad_reflect_folds_triangle() {
        assert_eq!(pad(0x4000, CycleMethod::Reflect), 0x4000);
        assert_eq!(pad(0x1C000, CycleMethod::Reflect), 0x4000);
        assert_eq!(pad(0x10000, CycleMethod::Reflect), 0xFFFF);
        assert_eq!(pad(0x20000, CycleMethod::Reflect), 0);
        for &f in &SAMPLES {
            assert!((0..=0xFFFF).contains(&pad(f, CycleMethod::Reflect)));
        }
    }

    // ── float_to_fixed ────────────────────────────────────────────────────

    #[test]
    fn float_to_fixed_exact_values() {
        assert_eq!(float_to_fixed(1.0), 0x10000);
        assert_eq!(float_to_fixed(0.5), 0x8000);
        assert_eq!(float_to_fixed(-2.5), -0x28000);
        assert_eq!(float_to_fixed(100.25), 0x64_4000);
        assert_eq!(float_to_fixed(0.0), 0);
    }

    #[test]
    fn float_to_fixed_truncates_toward_zero() {
        assert_eq!(float_to_fixed(1.0 / 3.0), 0x5555);
        assert_eq!(float_to_fixed(-1.0 / 3.0), -0x5555);
        assert_eq!(float_to_fixed(1.0e-7), 0);
    }

    #[test]
    fn float_to_fixed_round_trips_representable_values() {
        for raw in [-0x7FFF_0000, -0x1_2345, -1, 1, 0x8000, 0x7FFF_1234] {
            assert_eq!(float_to_fixed(fixed_to_f32(raw)), raw_as_f32_exact(raw));
        }
    }

    // f32 keeps 24 significant bits, so large raws lose their low bits first.
    fn raw_as_f32_exact(raw: i32) -> i32 {
        let f = fixed_to_f32(raw) as f64 * FIXED_ONE as f64;
        f.trunc() as i32
    }

    // ── floor / ceil ──────────────────────────────────────────────────────

    #[test]
    fn floor_and_ceil() {
        assert_eq!(floor_to_int(0x18000), 1);
        assert_eq!(ceil_to_int(0x18000), 2);
        assert_eq!(ceil_to_int(0x20000), 2);
        assert_eq!(floor_to_int(-0x8000), -1);
        assert_eq!(ceil_to_int(-0x8000), 0);
    }
}
