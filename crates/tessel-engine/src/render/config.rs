/// Tunables for a [`Renderer`](super::Renderer).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RendererConfig {
    /// Rows generated and emitted per paint batch. Zero is treated as 1.
    pub row_capacity: usize,
    /// Gamma of the LCD subpixel blend. The destination is decoded with
    /// `1 / lcd_gamma` and the result re-encoded with `lcd_gamma`.
    pub lcd_gamma: f32,
    /// Bilinear filtering for textures whose transform is more than a
    /// whole-pixel translation.
    pub smooth_textures: bool,
    /// Most pixels the paint buffer may hold. A fill needing more fails
    /// with [`RenderError::AllocationFailed`](super::RenderError) before
    /// drawing anything.
    pub paint_budget: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            row_capacity: 8,
            lcd_gamma: 1.0 / 2.2,
            smooth_textures: true,
            paint_budget: usize::MAX,
        }
    }
}
