//! Tessel engine crate.
//!
//! Software scanline renderer: antialiased rectangle and mask fills with
//! flat colors, linear and radial gradients and textures, composited into
//! a caller-owned pixel surface.

pub mod coords;
pub mod device;
pub mod logging;
pub mod paint;
pub mod render;

pub use device::{PixelFormat, PixelSurface, Surface};
pub use render::{CompositeRule, DrawImage, RenderError, Renderer, RendererConfig};
