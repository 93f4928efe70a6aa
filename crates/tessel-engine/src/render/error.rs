use std::fmt;

/// Recoverable failure of a renderer operation.
///
/// Reported once per top-level call. Every allocation happens before the
/// destination is acquired, so an error means the destination is untouched.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RenderError {
    /// Scratch buffer, texture copy or surface storage could not grow.
    AllocationFailed {
        /// Number of pixels requested.
        requested: usize,
    },
    /// An in-memory surface whose pixel count does not fit the address space.
    SurfaceTooLarge { width: u32, height: u32 },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::AllocationFailed { requested } => {
                write!(f, "failed to allocate {requested} pixels")
            }
            RenderError::SurfaceTooLarge { width, height } => {
                write!(f, "surface {width}x{height} is too large")
            }
        }
    }
}

impl std::error::Error for RenderError {}
