//! Texture used as a tint mask over a flat color or gradient.
//!
//! The base paint is straight ARGB, the mask is a premultiplied texture
//! sample, and the product is premultiplied. The `+ 1` biases map 255 onto
//! a multiplier of exactly 1.

use super::color::{alpha, blue, green, pack, red};

/// `base` (straight) times `mask` (premultiplied).
#[inline]
pub fn multiply_pixel(base: u32, mask: u32) -> u32 {
    let pa1 = alpha(base) + 1;
    let ch = |b: u32, m: u32| ((((b + 1) * m) >> 8) * pa1) >> 8;
    pack(
        (pa1 * alpha(mask)) >> 8,
        ch(red(base), red(mask)),
        ch(green(base), green(mask)),
        ch(blue(base), blue(mask)),
    )
}

/// `paint[i] = paint[i] * mask[i]`; `paint` holds the straight base colors.
pub fn multiply_rows(paint: &mut [u32], mask: &[u32]) {
    for (p, &m) in paint.iter_mut().zip(mask) {
        *p = multiply_pixel(*p, m);
    }
}

/// In-place flat-color variant: `paint` holds the mask and receives the result.
pub fn multiply_flat(paint: &mut [u32], base: u32) {
    for p in paint {
        *p = multiply_pixel(base, *p);
    }
}
