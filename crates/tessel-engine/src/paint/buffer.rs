use crate::render::RenderError;

use super::{Paint, Span};

/// Reusable paint scratch storage.
///
/// Grows on demand and never shrinks, so a renderer that has drawn once at
/// a given size does not allocate again for the same size.
#[derive(Debug)]
pub struct PaintBuffer {
    pixels: Vec<u32>,
    scratch: Vec<u32>,
    limit: usize,
}

impl Default for PaintBuffer {
    fn default() -> Self {
        Self::with_limit(usize::MAX)
    }
}

impl PaintBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that refuses to hold more than `limit` pixels.
    pub fn with_limit(limit: usize) -> Self {
        Self { pixels: Vec::new(), scratch: Vec::new(), limit }
    }

    /// Makes room for `len` pixels (and as many scratch pixels if asked).
    ///
    /// Fails without touching existing contents when `len` is over the limit
    /// or the allocator refuses.
    pub fn reserve(&mut self, len: usize, with_scratch: bool) -> Result<(), RenderError> {
        if len > self.limit {
            log::warn!("paint buffer request for {len} pixels over limit {}", self.limit);
            return Err(RenderError::AllocationFailed { requested: len });
        }
        grow(&mut self.pixels, len)?;
        if with_scratch {
            grow(&mut self.scratch, len)?;
        }
        Ok(())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.pixels.len()
    }

    /// Runs `paint` over `span` and returns the generated pixels.
    ///
    /// [`PaintBuffer::reserve`] must have been called for at least
    /// `span.len()` pixels.
    pub fn generate(&mut self, paint: &Paint, span: &Span) -> &[u32] {
        let len = span.len();
        let scratch: &mut [u32] = if paint.needs_scratch() { &mut self.scratch[..len] } else { &mut [] };
        paint.generate(span, &mut self.pixels[..len], scratch);
        &self.pixels[..len]
    }
}

fn grow(buf: &mut Vec<u32>, len: usize) -> Result<(), RenderError> {
    if buf.len() >= len {
        return Ok(());
    }
    if buf.try_reserve(len - buf.len()).is_err() {
        log::warn!("paint buffer growth to {len} pixels failed");
        return Err(RenderError::AllocationFailed { requested: len });
    }
    buf.resize(len, 0);
    Ok(())
}
