//! Per-pixel compositing in premultiplied ARGB.
//!
//! `coverage` is the 8-bit geometric or mask coverage of the pixel; the
//! source alpha scales it further through premultiplication.

use crate::paint::color::{alpha, blue, div255, green, pack, red, scale, unpremultiply};

/// Porter-Duff operator applied during emission.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum CompositeRule {
    /// Removes the covered part of the destination.
    Clear,
    /// Replaces the destination in proportion to coverage.
    Src,
    /// Source over destination.
    #[default]
    SrcOver,
}

impl CompositeRule {
    /// Whether a fully covered pixel can be stored without reading the
    /// destination.
    #[inline]
    pub fn overwrites(self, src: u32) -> bool {
        match self {
            CompositeRule::Clear => false,
            CompositeRule::Src => true,
            CompositeRule::SrcOver => alpha(src) == 0xFF,
        }
    }
}

/// Composites premultiplied `src` onto premultiplied `dst`.
#[inline]
pub fn blend(rule: CompositeRule, dst: u32, src: u32, coverage: u32) -> u32 {
    match rule {
        CompositeRule::Clear => scale(dst, 255 - coverage),
        CompositeRule::Src => {
            let inv = 255 - coverage;
            let ch = |s: u32, d: u32| div255(s * coverage + d * inv);
            pack(
                ch(alpha(src), alpha(dst)),
                ch(red(src), red(dst)),
                ch(green(src), green(dst)),
                ch(blue(src), blue(dst)),
            )
        }
        CompositeRule::SrcOver => {
            let s = if coverage == 255 { src } else { scale(src, coverage) };
            let inv = 255 - alpha(s);
            let ch = |s: u32, d: u32| (s + div255(d * inv)).min(255);
            pack(
                ch(alpha(s), alpha(dst)),
                ch(red(s), red(dst)),
                ch(green(s), green(dst)),
                ch(blue(s), blue(dst)),
            )
        }
    }
}

/// 255^3, the common denominator of the straight-alpha blend.
const CUBE_255: i64 = 255 * 255 * 255;

/// Composites premultiplied `src` onto a straight-alpha `dst`, returning
/// straight alpha.
///
/// Works on straight channels directly so a destination with little alpha
/// keeps its color precision. The source contributes `src_weight` and the
/// destination `dst_weight * dst_alpha`; channels are the weighted mean.
pub fn blend_straight(rule: CompositeRule, dst: u32, src: u32, coverage: u32) -> u32 {
    let src_alpha = div255(alpha(src) * coverage);
    let (src_weight, dst_keep) = match rule {
        CompositeRule::Clear => (0, 255 - coverage),
        CompositeRule::Src => (src_alpha, 255 - coverage),
        CompositeRule::SrcOver => (src_alpha, 255 - src_alpha),
    };
    let dst_alpha = alpha(dst);
    let denom = (255 * src_weight + dst_alpha * dst_keep) as i64;
    if denom == 0 {
        return 0;
    }

    let s = unpremultiply(src);
    let recip = CUBE_255 / denom;
    let fa = dst_keep as i64 * dst_alpha as i64 * recip;
    let fb = 255 * src_weight as i64 * recip;
    let ch = |d: u32, s: u32| (((fa * d as i64 + fb * s as i64 + CUBE_255 / 2) / CUBE_255) as u32).min(255);
    pack(
        (denom / 255) as u32,
        ch(red(dst), red(s)),
        ch(green(dst), green(s)),
        ch(blue(dst), blue(s)),
    )
}

/// Gamma pair for subpixel (LCD) text blending.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LcdGamma {
    gamma: f32,
    inv_gamma: f32,
}

impl LcdGamma {
    pub fn new(gamma: f32) -> Self {
        let gamma = if gamma > 0.0 && gamma.is_finite() { gamma } else { 1.0 };
        Self { gamma, inv_gamma: 1.0 / gamma }
    }

    #[inline]
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    // Both directions round so that a gamma of 1 is an exact identity.
    #[inline]
    fn decode(&self, c: u32) -> u32 {
        (255.0 * (c as f32 / 255.0).powf(self.inv_gamma) + 0.5) as u32
    }

    #[inline]
    fn encode(&self, o: u32) -> u32 {
        ((255.0 * (o as f32 / 65025.0).powf(self.gamma) + 0.5) as u32).min(255)
    }
}

/// Per-channel source-over for LCD coverage.
///
/// `dst` is premultiplied, `src` is the straight source color, `cov` holds
/// red/green/blue subpixel coverage already scaled by the source alpha. The
/// destination is assumed opaque and the result always is.
#[inline]
pub fn blend_lcd(dst: u32, src: u32, cov: [u32; 3], gamma: &LcdGamma) -> u32 {
    if cov == [255; 3] {
        return 0xFF00_0000 | (src & 0x00FF_FFFF);
    }
    let ch = |a: u32, s: u32, d: u32| gamma.encode(a * s + (255 - a) * gamma.decode(d));
    pack(
        0xFF,
        ch(cov[0], red(src), red(dst)),
        ch(cov[1], green(src), green(dst)),
        ch(cov[2], blue(src), blue(dst)),
    )
}

/// Scales subpixel coverage by the source alpha; identity when opaque.
#[inline]
pub fn lcd_coverage(cov: [u8; 3], src_alpha: u32) -> [u32; 3] {
    let c = cov.map(u32::from);
    if src_alpha >= 255 {
        c
    } else {
        c.map(|a| ((a + 1) * src_alpha) >> 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: u32 = 0xFFFF_0000;

    // ── src-over ──────────────────────────────────────────────────────────

    #[test]
    fn src_over_full_coverage_opaque_replaces() {
        assert_eq!(blend(CompositeRule::SrcOver, 0xFF12_3456, RED, 255), RED);
    }

    #[test]
    fn src_over_zero_coverage_keeps_destination() {
        assert_eq!(blend(CompositeRule::SrcOver, 0xFF12_3456, RED, 0), 0xFF12_3456);
    }

    #[test]
    fn src_over_partial_on_transparent() {
        assert_eq!(blend(CompositeRule::SrcOver, 0, RED, 64), 0x4040_0000);
        assert_eq!(blend(CompositeRule::SrcOver, 0, RED, 128), 0x8080_0000);
    }

    #[test]
    fn src_over_translucent_on_opaque() {
        let out = blend(CompositeRule::SrcOver, 0xFF00_00FF, 0x8080_0000, 255);
        assert_eq!(alpha(out), 255);
        assert_eq!(red(out), 128);
        assert_eq!(blue(out), 127);
    }

    #[test]
    fn channels_never_overflow() {
        // Not strictly premultiplied input must still clamp.
        let out = blend(CompositeRule::SrcOver, 0xFFFF_FFFF, 0x10FF_FFFF, 255);
        assert_eq!(out, 0xFFFF_FFFF);
    }

    // ── src / clear ───────────────────────────────────────────────────────

    #[test]
    fn src_interpolates_by_coverage() {
        assert_eq!(blend(CompositeRule::Src, 0xFF00_00FF, 0, 255), 0);
        assert_eq!(blend(CompositeRule::Src, 0xFF00_00FF, 0x8080_0000, 255), 0x8080_0000);
        let half = blend(CompositeRule::Src, 0xFF00_00FF, RED, 128);
        assert_eq!(half, 0xFF80_007F);
    }

    #[test]
    fn clear_removes_covered_fraction() {
        assert_eq!(blend(CompositeRule::Clear, 0xFFFF_FFFF, RED, 255), 0);
        assert_eq!(blend(CompositeRule::Clear, 0xFFFF_FFFF, RED, 0), 0xFFFF_FFFF);
        assert_eq!(blend(CompositeRule::Clear, 0xFFFF_FFFF, RED, 128), 0x7F7F_7F7F);
    }

    #[test]
    fn overwrite_shortcut() {
        assert!(CompositeRule::Src.overwrites(0));
        assert!(CompositeRule::SrcOver.overwrites(RED));
        assert!(!CompositeRule::SrcOver.overwrites(0x8080_0000));
        assert!(!CompositeRule::Clear.overwrites(RED));
    }

    // ── straight alpha ────────────────────────────────────────────────────

    #[test]
    fn straight_src_over_keeps_precision_at_low_alpha() {
        assert_eq!(blend_straight(CompositeRule::SrcOver, 0x02FF_FFFF, RED, 1), 0x02FF_AAAA);
    }

    #[test]
    fn straight_src_over_on_transparent_takes_source_color() {
        assert_eq!(blend_straight(CompositeRule::SrcOver, 0, 0x8080_0000, 255), 0x80FF_0000);
        assert_eq!(blend_straight(CompositeRule::SrcOver, 0, 0, 255), 0);
    }

    #[test]
    fn straight_clear_lowers_alpha_only() {
        let out = blend_straight(CompositeRule::Clear, 0x80FF_0000, RED, 128);
        assert_eq!(alpha(out), 63);
        assert_eq!(out & 0x00FF_FFFF, 0x00FF_0000);
        assert_eq!(blend_straight(CompositeRule::Clear, 0x80FF_0000, RED, 255), 0);
    }

    #[test]
    fn straight_src_replaces_in_proportion() {
        assert_eq!(blend_straight(CompositeRule::Src, 0xFF00_00FF, RED, 255), RED);
        let half = blend_straight(CompositeRule::Src, 0xFF00_00FF, RED, 128);
        assert_eq!(alpha(half), 255);
        assert!(red(half) >= 127 && red(half) <= 129);
        assert!(blue(half) >= 126 && blue(half) <= 128);
    }

    // ── lcd ───────────────────────────────────────────────────────────────

    #[test]
    fn lcd_full_coverage_writes_source() {
        let g = LcdGamma::new(1.0 / 2.2);
        assert_eq!(blend_lcd(0xFF00_0000, 0x8012_3456, [255; 3], &g), 0xFF12_3456);
    }

    #[test]
    fn lcd_zero_coverage_keeps_destination() {
        let g = LcdGamma::new(1.0);
        assert_eq!(blend_lcd(0xFF20_4080, RED, [0; 3], &g), 0xFF20_4080);
    }

    #[test]
    fn lcd_channels_are_independent() {
        let g = LcdGamma::new(1.0);
        let out = blend_lcd(0xFF00_0000, 0xFFFF_FFFF, [255, 0, 128], &g);
        assert_eq!(red(out), 255);
        assert_eq!(green(out), 0);
        assert_eq!(blue(out), 128);
    }

    #[test]
    fn lcd_gamma_brightens_partial_coverage() {
        let linear = blend_lcd(0xFF00_0000, 0xFFFF_FFFF, [128; 3], &LcdGamma::new(1.0));
        let gamma = blend_lcd(0xFF00_0000, 0xFFFF_FFFF, [128; 3], &LcdGamma::new(1.0 / 2.2));
        assert!(red(gamma) > red(linear));
    }

    #[test]
    fn lcd_coverage_scales_by_alpha() {
        assert_eq!(lcd_coverage([255, 10, 0], 255), [255, 10, 0]);
        assert_eq!(lcd_coverage([255, 127, 0], 128), [128, 64, 0]);
    }
}
