/// Straight-alpha 8-bit color.
///
/// Packed form is `0xAARRGGBB`. Paint buffers and destination pixels are
/// premultiplied; use [`premultiply`] when crossing that boundary.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
            a: (argb >> 24) as u8,
        }
    }

    #[inline]
    pub const fn to_argb(self) -> u32 {
        pack(self.a as u32, self.r as u32, self.g as u32, self.b as u32)
    }

    #[inline]
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

// ── packed channel access ────────────────────────────────────────────────

#[inline]
pub const fn alpha(argb: u32) -> u32 {
    argb >> 24
}

#[inline]
pub const fn red(argb: u32) -> u32 {
    (argb >> 16) & 0xFF
}

#[inline]
pub const fn green(argb: u32) -> u32 {
    (argb >> 8) & 0xFF
}

#[inline]
pub const fn blue(argb: u32) -> u32 {
    argb & 0xFF
}

#[inline]
pub const fn pack(a: u32, r: u32, g: u32, b: u32) -> u32 {
    (a << 24) | (r << 16) | (g << 8) | b
}

/// `x / 255` for `x` in `[0, 255 * 255 * 2]`, exact at the ends of the range.
#[inline]
pub const fn div255(x: u32) -> u32 {
    (x * 257 + 257) >> 16
}

/// Multiplies every channel (alpha included) by `k / 255`.
#[inline]
pub const fn scale(argb: u32, k: u32) -> u32 {
    pack(
        div255(alpha(argb) * k),
        div255(red(argb) * k),
        div255(green(argb) * k),
        div255(blue(argb) * k),
    )
}

// ── premultiplication ────────────────────────────────────────────────────

#[inline]
pub const fn premultiply(argb: u32) -> u32 {
    let a = alpha(argb);
    match a {
        255 => argb,
        0 => 0,
        _ => pack(a, div255(red(argb) * a), div255(green(argb) * a), div255(blue(argb) * a)),
    }
}

/// Inverse of [`premultiply`], rounding to nearest. Transparent maps to 0.
#[inline]
pub const fn unpremultiply(argb: u32) -> u32 {
    let a = alpha(argb);
    match a {
        255 => argb,
        0 => 0,
        _ => {
            let half = a / 2;
            let r = (red(argb) * 255 + half) / a;
            let g = (green(argb) * 255 + half) / a;
            let b = (blue(argb) * 255 + half) / a;
            pack(a, min255(r), min255(g), min255(b))
        }
    }
}

#[inline]
const fn min255(c: u32) -> u32 {
    if c > 255 { 255 } else { c }
}

pub fn premultiply_in_place(pixels: &mut [u32]) {
    for px in pixels {
        *px = premultiply(*px);
    }
}
