//! Destination surfaces.
//!
//! This module is responsible for:
//! - the `Surface` collaborator interface the renderer draws into
//! - an owned in-memory surface
//! - pixel formats and the scoped lock around each emission call

mod format;
mod lock;
mod surface;

pub use format::PixelFormat;
pub use lock::SurfaceLock;
pub use surface::{PixelSurface, Surface};
