//! Coordinate and geometry types shared by the paint generators and the emitter.
//!
//! Device space:
//! - integer pixels, origin top-left
//! - +X right, +Y down
//! - pixel `(x, y)` is sampled at its center `(x + 0.5, y + 0.5)`
//!
//! Sub-pixel quantities are S15.16 fixed point (see [`fixed`]).

pub mod fixed;
mod rect;
mod transform;

pub use fixed::CycleMethod;
pub use rect::PixelRect;
pub use transform::{FixedTransform, Transform, TransformKind};
