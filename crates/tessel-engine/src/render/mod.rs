//! Renderer state, dispatch and the scanline emission engine.
//!
//! Every fill follows the same shape:
//! - clip the geometry; an empty result returns before touching anything
//! - reserve paint storage (the only fallible step)
//! - acquire the surface, emit in batches of rows, release
//!
//! Blending happens in premultiplied ARGB whatever the surface format.

mod alpha_map;
mod blend;
mod config;
pub(crate) mod emit;
mod error;
mod renderer;

pub use alpha_map::AlphaMap;
pub use blend::{blend, blend_lcd, blend_straight, lcd_coverage, CompositeRule, LcdGamma};
pub use config::RendererConfig;
pub use error::RenderError;
pub use renderer::{DrawImage, Renderer};
