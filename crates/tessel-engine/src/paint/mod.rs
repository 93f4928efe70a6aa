//! Paint generators.
//!
//! Scope:
//! - packed ARGB color helpers
//! - gradient ramps and the linear/radial generators
//! - textures (copy, transform classes, bilinear filtering)
//! - texture-multiply for tinted masks
//!
//! Every generator fills a row-major block of `Span::width * Span::rows`
//! pixels. `Paint::generate` always leaves premultiplied ARGB behind.

pub mod buffer;
pub mod color;
pub mod gradient;
pub mod linear;
pub mod multiply;
pub mod radial;
pub mod texture;

pub use buffer::PaintBuffer;
pub use color::Color;
pub use gradient::{ColorStop, GradientRamp, GRADIENT_MAP_SIZE, GRADIENT_MAP_SIZE_LG};
pub use linear::LinearGradient;
pub use radial::RadialGradient;
pub use texture::{ImageData, Texture};

use color::{premultiply, premultiply_in_place};
use multiply::{multiply_flat, multiply_rows};

/// Block of device pixels a generator fills: `rows` rows of `width` pixels
/// whose top-left pixel is `(x, y)`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Span {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub rows: usize,
}

impl Span {
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.rows == 0
    }
}

/// Which generator is active.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PaintMode {
    FlatColor,
    LinearGradient,
    RadialGradient,
    Texture,
}

/// Base paint a masked texture multiplies.
#[derive(Debug, Clone, PartialEq)]
pub enum Tint {
    Flat(Color),
    Linear(LinearGradient),
    Radial(RadialGradient),
}

/// Paint source for emission.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Flat(Color),
    LinearGradient(LinearGradient),
    RadialGradient(RadialGradient),
    /// A texture, optionally used as a mask over `tint`.
    Texture { texture: Texture, tint: Option<Tint> },
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Flat(Color::BLACK)
    }
}

impl Paint {
    pub fn mode(&self) -> PaintMode {
        match self {
            Paint::Flat(_) => PaintMode::FlatColor,
            Paint::LinearGradient(_) => PaintMode::LinearGradient,
            Paint::RadialGradient(_) => PaintMode::RadialGradient,
            Paint::Texture { .. } => PaintMode::Texture,
        }
    }

    /// Premultiplied color when every pixel of the paint is the same.
    #[inline]
    pub fn solid_color(&self) -> Option<u32> {
        match self {
            Paint::Flat(c) => Some(premultiply(c.to_argb())),
            _ => None,
        }
    }

    /// Whether [`Paint::generate`] needs a second buffer.
    #[inline]
    pub fn needs_scratch(&self) -> bool {
        matches!(
            self,
            Paint::Texture { tint: Some(Tint::Linear(_) | Tint::Radial(_)), .. }
        )
    }

    /// The current paint as a tint for a masked texture. Texture paints have
    /// no tint form.
    pub fn as_tint(&self) -> Option<Tint> {
        match self {
            Paint::Flat(c) => Some(Tint::Flat(*c)),
            Paint::LinearGradient(g) => Some(Tint::Linear(g.clone())),
            Paint::RadialGradient(g) => Some(Tint::Radial(g.clone())),
            Paint::Texture { .. } => None,
        }
    }

    /// Fills `out[..span.len()]` with premultiplied ARGB.
    ///
    /// `scratch` must hold `span.len()` pixels when [`Paint::needs_scratch`]
    /// is true and is ignored otherwise.
    pub fn generate(&self, span: &Span, out: &mut [u32], scratch: &mut [u32]) {
        if span.is_empty() {
            return;
        }
        let len = span.len();
        let out = &mut out[..len];
        match self {
            Paint::Flat(c) => out.fill(premultiply(c.to_argb())),
            Paint::LinearGradient(g) => {
                g.generate(out, span);
                premultiply_in_place(out);
            }
            Paint::RadialGradient(g) => {
                g.generate(out, span);
                premultiply_in_place(out);
            }
            Paint::Texture { texture, tint: None } => texture.generate(out, span),
            Paint::Texture { texture, tint: Some(Tint::Flat(c)) } => {
                texture.generate(out, span);
                multiply_flat(out, c.to_argb());
            }
            Paint::Texture { texture, tint: Some(tint) } => {
                let mask = &mut scratch[..len];
                texture.generate(mask, span);
                match tint {
                    Tint::Linear(g) => g.generate(out, span),
                    Tint::Radial(g) => g.generate(out, span),
                    Tint::Flat(c) => out.fill(c.to_argb()),
                }
                multiply_rows(out, mask);
            }
        }
    }
}
