use super::Surface;

/// Exclusive access to a surface's pixels for the length of one emission.
///
/// Acquires on construction and releases on drop, so every exit path
/// (including unwinding) gives the surface back.
pub struct SurfaceLock<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: Surface + ?Sized> SurfaceLock<'a, S> {
    pub fn acquire(surface: &'a mut S) -> Self {
        surface.acquire();
        Self { surface }
    }

    #[inline]
    pub fn pixels(&mut self) -> &mut [u32] {
        self.surface.pixels_mut()
    }
}

impl<S: Surface + ?Sized> Drop for SurfaceLock<'_, S> {
    fn drop(&mut self) {
        self.surface.release();
    }
}
