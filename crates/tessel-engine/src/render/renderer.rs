use crate::coords::fixed::{interp, FIXED_ONE, FIXED_SHIFT, FRACTION_MASK};
use crate::coords::{CycleMethod, PixelRect, Transform};
use crate::device::{Surface, SurfaceLock};
use crate::paint::{
    Color, GradientRamp, ImageData, LinearGradient, Paint, PaintBuffer, PaintMode, RadialGradient,
    Span, Texture,
};

use super::emit::{
    emit_alpha_row, emit_lcd_rows, emit_mask_rows, emit_rect_rows, Edges, Source, SubpixelEdges,
    Target,
};
use super::{AlphaMap, CompositeRule, LcdGamma, RenderError, RendererConfig};

/// Scanline renderer over a destination [`Surface`].
///
/// Holds the paint state (flat color, gradient or texture), the clip
/// rectangle and the composite rule. Fill operations acquire the surface
/// once, generate paint in batches of `row_capacity` rows and release the
/// surface before returning.
///
/// Not reentrant; one renderer per surface per thread.
pub struct Renderer<S: Surface> {
    surface: S,
    config: RendererConfig,
    lcd_gamma: LcdGamma,
    clip: PixelRect,
    rule: CompositeRule,
    color: Color,
    paint: Paint,
    buffer: PaintBuffer,
}

impl<S: Surface> Renderer<S> {
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, RendererConfig::default())
    }

    pub fn with_config(surface: S, config: RendererConfig) -> Self {
        let clip = surface_bounds(&surface);
        log::debug!("renderer created: {}x{} {config:?}", surface.width(), surface.height());
        Self {
            surface,
            config,
            lcd_gamma: LcdGamma::new(config.lcd_gamma),
            clip,
            rule: CompositeRule::default(),
            color: Color::BLACK,
            paint: Paint::default(),
            buffer: PaintBuffer::with_limit(config.paint_budget),
        }
    }

    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    // ── state ─────────────────────────────────────────────────────────────

    /// Current clip, always inside the surface.
    #[inline]
    pub fn clip(&self) -> PixelRect {
        self.clip
    }

    pub fn set_clip(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.clip = PixelRect::from_xywh(x, y, width, height).intersect(surface_bounds(&self.surface));
        log::trace!("clip set to {:?}", self.clip);
    }

    /// Restores the clip to the whole surface.
    pub fn reset_clip(&mut self) {
        self.clip = surface_bounds(&self.surface);
    }

    /// Switches to a flat color paint (straight alpha).
    pub fn set_color(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.color = Color::new(r, g, b, a);
        self.paint = Paint::Flat(self.color);
        log::trace!("paint: flat {:08x}", self.color.to_argb());
    }

    /// Last color given to [`Renderer::set_color`].
    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_composite_rule(&mut self, rule: CompositeRule) {
        self.rule = rule;
    }

    #[inline]
    pub fn composite_rule(&self) -> CompositeRule {
        self.rule
    }

    #[inline]
    pub fn paint_mode(&self) -> PaintMode {
        self.paint.mode()
    }

    #[inline]
    pub fn paint(&self) -> &Paint {
        &self.paint
    }

    /// Linear gradient from `(x0, y0)` to `(x1, y1)` in user space;
    /// `transform` maps user space to device space.
    pub fn set_linear_gradient(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        ramp: GradientRamp,
        cycle: CycleMethod,
        transform: Transform,
    ) {
        let g = LinearGradient::new(x0, y0, x1, y1, ramp, cycle, transform);
        log::debug!("paint: linear gradient ({x0}, {y0}) -> ({x1}, {y1}) {cycle:?}");
        self.paint = Paint::LinearGradient(g);
    }

    /// Radial gradient of `radius` around `(cx, cy)` with focus `(fx, fy)`.
    #[allow(clippy::too_many_arguments)]
    pub fn set_radial_gradient(
        &mut self,
        cx: f32,
        cy: f32,
        fx: f32,
        fy: f32,
        radius: f32,
        ramp: GradientRamp,
        cycle: CycleMethod,
        transform: Transform,
    ) {
        let g = RadialGradient::new(cx, cy, fx, fy, radius, ramp, cycle, transform);
        log::debug!("paint: radial gradient r={radius} at ({cx}, {cy}) {cycle:?}");
        self.paint = Paint::RadialGradient(g);
    }

    /// Copies `image` into a texture paint. `transform` maps texture space
    /// to device space.
    ///
    /// On failure the current paint is kept.
    pub fn set_texture(
        &mut self,
        image: ImageData<'_>,
        transform: Transform,
        repeat: bool,
        has_alpha: bool,
    ) -> Result<(), RenderError> {
        let texture = Texture::new(image, transform, repeat, has_alpha, self.config.smooth_textures)?;
        log::debug!("paint: texture {}x{} {:?}", texture.width(), texture.height(), texture.kind());
        self.paint = Paint::Texture { texture, tint: None };
        Ok(())
    }

    /// Like [`Renderer::set_texture`], but the texture multiplies the
    /// current flat color or gradient instead of replacing it.
    pub fn set_texture_mask(
        &mut self,
        image: ImageData<'_>,
        transform: Transform,
        repeat: bool,
        has_alpha: bool,
    ) -> Result<(), RenderError> {
        let texture = Texture::new(image, transform, repeat, has_alpha, self.config.smooth_textures)?;
        let tint = self.paint.as_tint();
        log::debug!("paint: texture mask {}x{} over {:?}", texture.width(), texture.height(), self.paint.mode());
        self.paint = Paint::Texture { texture, tint };
        Ok(())
    }

    // ── fills ─────────────────────────────────────────────────────────────

    /// Sets the clipped part of the integer rectangle to transparent.
    pub fn clear_rect(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<(), RenderError> {
        let area = PixelRect::from_xywh(x, y, width, height).intersect(self.clip);
        if area.is_empty() {
            log::trace!("clear_rect outside clip");
            return Ok(());
        }
        log::trace!("clear_rect {area:?}");

        let stride = self.surface.stride();
        let format = self.surface.format();
        let mut lock = SurfaceLock::acquire(&mut self.surface);
        let mut target = Target::new(lock.pixels(), stride, format, self.rule);

        let (w, h) = (area.width() as usize, area.height() as usize);
        if area.min_x == 0 && w == stride {
            target.clear_run(0, area.min_y, w * h);
        } else {
            for y in area.min_y..=area.max_y {
                target.clear_run(area.min_x, y, w);
            }
        }
        Ok(())
    }

    /// Fills a rectangle given in 16.16 device coordinates with the current
    /// paint, antialiasing fractional edges.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<(), RenderError> {
        let clip = self.clip;
        if clip.is_empty() || width <= 0 || height <= 0 {
            return Ok(());
        }
        let x0 = (x as i64).max((clip.min_x as i64) << FIXED_SHIFT);
        let y0 = (y as i64).max((clip.min_y as i64) << FIXED_SHIFT);
        let x1 = (x as i64 + width as i64).min((clip.max_x as i64 + 1) << FIXED_SHIFT);
        let y1 = (y as i64 + height as i64).min((clip.max_y as i64 + 1) << FIXED_SHIFT);
        if x0 >= x1 || y0 >= y1 {
            log::trace!("fill_rect outside clip");
            return Ok(());
        }

        let (min_x, max_x) = ((x0 >> FIXED_SHIFT) as i32, ((x1 - 1) >> FIXED_SHIFT) as i32);
        let (min_y, max_y) = ((y0 >> FIXED_SHIFT) as i32, ((y1 - 1) >> FIXED_SHIFT) as i32);
        let (lfrac, rfrac) = (edge_near(x0), edge_far(x1));
        let (tfrac, bfrac) = (edge_near(y0), edge_far(y1));

        let edges = if min_x == max_x {
            Edges { left: combine(lfrac, rfrac), right: 0 }
        } else {
            Edges { left: lfrac, right: rfrac }
        };
        let span = Span {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1) as usize,
            rows: (max_y - min_y + 1) as usize,
        };
        log::trace!("fill_rect {span:?} edges l={lfrac:#x} r={rfrac:#x} t={tfrac:#x} b={bfrac:#x}");

        self.with_pass(None, span.width, span.rows, |pass| {
            if span.rows == 1 {
                let frac = match combine(tfrac, bfrac) {
                    0 => FIXED_ONE,
                    f => f,
                };
                pass.run(span, |t, s, b| emit_rect_rows(t, s, b, frac, edges));
                return;
            }

            let mut full = span;
            if tfrac != 0 {
                pass.run(Span { rows: 1, ..span }, |t, s, b| emit_rect_rows(t, s, b, tfrac, edges));
                full.y += 1;
                full.rows -= 1;
            }
            if bfrac != 0 {
                full.rows -= 1;
            }
            pass.run(full, |t, s, b| emit_rect_rows(t, s, b, FIXED_ONE, edges));
            if bfrac != 0 {
                pass.run(Span { y: max_y, rows: 1, ..span }, |t, s, b| {
                    emit_rect_rows(t, s, b, bfrac, edges)
                });
            }
        })
    }

    /// Fills `mask_width x mask_height` pixels at `(x, y)` with coverage
    /// `mask[offset + row * stride + col]`.
    ///
    /// Panics if `mask` is too short for the clipped area.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_alpha_mask(
        &mut self,
        mask: &[u8],
        x: i32,
        y: i32,
        mask_width: i32,
        mask_height: i32,
        offset: usize,
        stride: usize,
    ) -> Result<(), RenderError> {
        let Some((span, offset)) = self.mask_span(x, y, mask_width, mask_height, offset, stride, 1) else {
            log::trace!("fill_alpha_mask outside clip");
            return Ok(());
        };
        log::trace!("fill_alpha_mask {span:?}");

        self.with_pass(None, span.width, span.rows, |pass| {
            pass.run(span, |t, s, b| {
                let row_offset = offset + (b.y - span.y) as usize * stride;
                emit_mask_rows(t, s, b, mask, row_offset, stride);
            });
        })
    }

    /// Like [`Renderer::fill_alpha_mask`] with three coverage bytes (red,
    /// green, blue subpixel) per pixel; `stride` counts bytes.
    ///
    /// `sub_pos_x` places the mask at a third of a pixel: bits 2..4 give the
    /// subpixels of the first column left uncovered (1 = red, 2 = red and
    /// green), bits 0..2 the subpixels the last column covers (1 = red,
    /// 2 = red and green). Zero covers whole pixels on both sides. A column
    /// removed by the clip takes its offset with it.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_lcd_alpha_mask(
        &mut self,
        mask: &[u8],
        x: i32,
        y: i32,
        mask_width: i32,
        mask_height: i32,
        offset: usize,
        stride: usize,
        sub_pos_x: u8,
    ) -> Result<(), RenderError> {
        let Some((span, offset)) = self.mask_span(x, y, mask_width, mask_height, offset, stride, 3) else {
            log::trace!("fill_lcd_alpha_mask outside clip");
            return Ok(());
        };
        log::trace!("fill_lcd_alpha_mask {span:?} sub_pos_x={sub_pos_x:#06b}");

        let mut edges = SubpixelEdges::from_sub_pos(sub_pos_x);
        if span.x != x {
            edges.lead = SubpixelEdges::FULL.lead;
        }
        if span.x as i64 + span.width as i64 != x as i64 + mask_width as i64 {
            edges.trail = SubpixelEdges::FULL.trail;
        }

        let gamma = self.lcd_gamma;
        self.with_pass(None, span.width, span.rows, |pass| {
            pass.run(span, |t, s, b| {
                let row_offset = offset + (b.y - span.y) as usize * stride;
                emit_lcd_rows(t, s, b, mask, row_offset, stride, edges, &gamma);
            });
        })
    }

    /// Emits one scanline of accumulated coverage deltas.
    ///
    /// `deltas[i]` is the change of the running coverage count at pixel
    /// `x_from + i`, for `x_from..=x_to`. The count maps to alpha through
    /// `alpha_map`. Every consumed entry is zeroed, including those outside
    /// the clip and when the call fails. Panics if `deltas` is shorter than
    /// the row.
    pub fn emit_and_clear_alpha_row(
        &mut self,
        alpha_map: &AlphaMap,
        deltas: &mut [i32],
        y: i32,
        x_from: i32,
        x_to: i32,
        row_num: i32,
    ) -> Result<(), RenderError> {
        if x_to < x_from {
            return Ok(());
        }
        let len = (x_to as i64 - x_from as i64 + 1) as usize;
        let clip = self.clip;
        let start = x_from.max(clip.min_x);
        let end = x_to.min(clip.max_x);
        if y < clip.min_y || y > clip.max_y || start > end {
            log::trace!("alpha row {row_num} at y={y} outside clip");
            deltas[..len].fill(0);
            return Ok(());
        }
        log::trace!("alpha row {row_num} at y={y} x={start}..={end}");

        let skip = (start as i64 - x_from as i64) as usize;
        let span = Span { x: start, y, width: (end - start + 1) as usize, rows: 1 };
        let result = self.with_pass(None, span.width, 1, |pass| {
            let (left, rest) = deltas[..len].split_at_mut(skip);
            let sum = left.iter().fold(0i32, |acc, d| acc.wrapping_add(*d));
            left.fill(0);
            let (row, right) = rest.split_at_mut(span.width);
            pass.run(span, |t, s, b| emit_alpha_row(t, s, b, row, sum, alpha_map));
            right.fill(0);
        });
        if result.is_err() {
            // The row is dropped, but the accumulator must still start clean.
            deltas[..len].fill(0);
        }
        result
    }

    /// Draws a transformed image through its own texture paint, leaving the
    /// current paint untouched.
    pub fn draw_image(&mut self, image: &DrawImage<'_>) -> Result<(), RenderError> {
        let area = image.bounds.intersect(self.clip);
        if area.is_empty() {
            log::trace!("draw_image outside clip");
            return Ok(());
        }

        let mut texture = Texture::new(
            image.image,
            image.transform,
            image.repeat,
            image.has_alpha,
            self.config.smooth_textures,
        )?;
        if let Some(bounds) = image.interpolation_bounds {
            texture = texture.with_interpolation_bounds(bounds);
        }
        let paint = Paint::Texture { texture, tint: None };

        let top = opacity_to_fixed(image.top_opacity);
        let bottom = opacity_to_fixed(image.bottom_opacity);
        let (top_y, height) = (image.bounds.min_y as i64, image.bounds.height() as i64);
        let span = Span {
            x: area.min_x,
            y: area.min_y,
            width: area.width() as usize,
            rows: area.height() as usize,
        };
        log::trace!("draw_image {span:?} opacity {top:#x}..{bottom:#x}");

        self.with_pass(Some(&paint), span.width, span.rows, |pass| {
            pass.run(span, |t, s, b| {
                for row in 0..b.rows {
                    let y = b.y + row as i32;
                    // Opacity is sampled at the row center.
                    let frac = (((2 * (y as i64 - top_y) + 1) << FIXED_SHIFT) / (2 * height)) as i32;
                    let line = Span { y, rows: 1, ..*b };
                    emit_rect_rows(t, s.row(row), &line, interp(top, bottom, frac), Edges::default());
                }
            });
        })
    }

    // ── emission plumbing ────────────────────────────────────────────────

    /// Clips a mask placed at `(x, y)` and returns the device span with the
    /// mask offset of its first pixel.
    #[allow(clippy::too_many_arguments)]
    fn mask_span(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        offset: usize,
        stride: usize,
        bytes_per_pixel: usize,
    ) -> Option<(Span, usize)> {
        let area = PixelRect::from_xywh(x, y, width, height).intersect(self.clip);
        if area.is_empty() {
            return None;
        }
        let skip_x = (area.min_x as i64 - x as i64) as usize;
        let skip_y = (area.min_y as i64 - y as i64) as usize;
        let span = Span {
            x: area.min_x,
            y: area.min_y,
            width: area.width() as usize,
            rows: area.height() as usize,
        };
        Some((span, offset + skip_y * stride + skip_x * bytes_per_pixel))
    }

    /// Reserves paint storage, then locks the surface for `body`.
    ///
    /// Every allocation happens here, before the lock, so an error leaves
    /// the destination untouched. `paint` overrides the current paint.
    fn with_pass<R>(
        &mut self,
        paint: Option<&Paint>,
        width: usize,
        rows: usize,
        body: impl FnOnce(&mut Pass<'_>) -> R,
    ) -> Result<R, RenderError> {
        let Self { surface, config, rule, paint: current, buffer, .. } = self;
        let paint = paint.unwrap_or(&*current);
        let solid = paint.solid_color();
        let batch_rows = rows.min(config.row_capacity.max(1)).max(1);

        if solid.is_none() {
            let len = width
                .checked_mul(batch_rows)
                .ok_or(RenderError::AllocationFailed { requested: usize::MAX })?;
            buffer.reserve(len, paint.needs_scratch())?;
        }

        let stride = surface.stride();
        let format = surface.format();
        let mut lock = SurfaceLock::acquire(surface);
        let target = Target::new(lock.pixels(), stride, format, *rule);
        let mut pass = Pass { target, paint, buffer, solid, batch_rows };
        Ok(body(&mut pass))
    }
}

/// One locked emission: destination, paint and the batch buffer.
struct Pass<'a> {
    target: Target<'a>,
    paint: &'a Paint,
    buffer: &'a mut PaintBuffer,
    solid: Option<u32>,
    batch_rows: usize,
}

impl Pass<'_> {
    /// Splits `span` into batches, generates paint once per batch and hands
    /// each batch to `emit`.
    fn run(&mut self, span: Span, mut emit: impl FnMut(&mut Target<'_>, Source<'_>, &Span)) {
        if span.width == 0 {
            return;
        }
        let mut done = 0;
        while done < span.rows {
            let rows = (span.rows - done).min(self.batch_rows);
            let batch = Span { y: span.y + done as i32, rows, ..span };
            let source = match self.solid {
                Some(c) => Source::Solid(c),
                None => Source::Paint {
                    pixels: self.buffer.generate(self.paint, &batch),
                    stride: batch.width,
                },
            };
            emit(&mut self.target, source, &batch);
            done += rows;
        }
    }
}

/// Arguments of [`Renderer::draw_image`].
#[derive(Debug, Copy, Clone)]
pub struct DrawImage<'a> {
    pub image: ImageData<'a>,
    /// Image space to device space.
    pub transform: Transform,
    pub repeat: bool,
    pub has_alpha: bool,
    /// Device pixels to cover.
    pub bounds: PixelRect,
    /// Image pixels (inclusive) bilinear taps may read; the whole image
    /// when `None`.
    pub interpolation_bounds: Option<PixelRect>,
    /// Opacity of the first row of `bounds`, 0.0 to 1.0.
    pub top_opacity: f32,
    /// Opacity of the last row of `bounds`.
    pub bottom_opacity: f32,
}

impl<'a> DrawImage<'a> {
    /// Untransformed, opaque-to-opaque draw of `image` at its own size.
    pub fn new(image: ImageData<'a>) -> Self {
        Self {
            image,
            transform: Transform::IDENTITY,
            repeat: false,
            has_alpha: true,
            bounds: PixelRect::from_xywh(0, 0, image.width, image.height),
            interpolation_bounds: None,
            top_opacity: 1.0,
            bottom_opacity: 1.0,
        }
    }
}

fn surface_bounds<S: Surface + ?Sized>(surface: &S) -> PixelRect {
    PixelRect::from_xywh(0, 0, surface.width(), surface.height())
}

/// Covered fraction of the pixel a leading edge at `v` falls in; 0 when
/// the edge is pixel aligned.
#[inline]
fn edge_near(v: i64) -> i32 {
    ((FIXED_ONE as i64 - (v & FRACTION_MASK as i64)) & FRACTION_MASK as i64) as i32
}

/// Covered fraction of the pixel a trailing edge at `v` falls in.
#[inline]
fn edge_far(v: i64) -> i32 {
    (v & FRACTION_MASK as i64) as i32
}

/// Coverage of a single pixel crossed by both edges.
#[inline]
fn combine(near: i32, far: i32) -> i32 {
    match (near, far) {
        (0, f) => f,
        (n, 0) => n,
        (n, f) => (f - FIXED_ONE + n) & FRACTION_MASK,
    }
}

#[inline]
fn opacity_to_fixed(opacity: f32) -> i32 {
    (opacity.clamp(0.0, 1.0) * FIXED_ONE as f32).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{PixelFormat, PixelSurface};
    use crate::paint::color::scale;

    const RED: u32 = 0xFFFF_0000;

    fn fx(v: f32) -> i32 {
        (v * FIXED_ONE as f32) as i32
    }

    fn renderer(w: u32, h: u32) -> Renderer<PixelSurface> {
        let mut r = Renderer::new(PixelSurface::new(w, h).unwrap());
        r.set_color(255, 0, 0, 255);
        r
    }

    /// Counts acquire/release pairs. An unbacked spy reports any size but
    /// panics if its pixels are touched.
    struct SpySurface {
        width: i32,
        height: i32,
        pixels: Vec<u32>,
        acquired: usize,
        released: usize,
        held: bool,
    }

    impl SpySurface {
        fn new(width: i32, height: i32) -> Self {
            let pixels = vec![0; (width * height) as usize];
            Self { width, height, pixels, acquired: 0, released: 0, held: false }
        }

        fn unbacked(width: i32, height: i32) -> Self {
            Self { width, height, pixels: Vec::new(), acquired: 0, released: 0, held: false }
        }
    }

    impl Surface for SpySurface {
        fn width(&self) -> i32 {
            self.width
        }

        fn height(&self) -> i32 {
            self.height
        }

        fn acquire(&mut self) {
            assert!(!self.held, "acquired twice");
            self.acquired += 1;
            self.held = true;
        }

        fn pixels_mut(&mut self) -> &mut [u32] {
            assert!(self.held, "pixels touched while released");
            assert!(!self.pixels.is_empty(), "unbacked spy written");
            &mut self.pixels
        }

        fn release(&mut self) {
            self.released += 1;
            self.held = false;
        }
    }

    fn linear_ramp() -> GradientRamp {
        GradientRamp::from_stops(&[
            crate::paint::ColorStop::new(0.0, Color::new(255, 0, 0, 255)),
            crate::paint::ColorStop::new(1.0, Color::new(0, 0, 255, 128)),
        ])
    }

    // ── rectangles ────────────────────────────────────────────────────────

    #[test]
    fn opaque_red_fills_whole_surface() {
        let mut r = renderer(10, 10);
        r.set_clip(0, 0, 10, 10);
        r.fill_rect(0, 0, 10 << 16, 10 << 16).unwrap();
        assert!(r.surface().pixels().iter().all(|&p| p == RED));
        assert!(!r.surface().is_locked());
    }

    #[test]
    fn half_offset_rect_covers_three_by_three() {
        let mut r = renderer(4, 4);
        r.fill_rect(0x8000, 0x8000, 0x20000, 0x20000).unwrap();
        let (corner, edge) = (scale(RED, 64), scale(RED, 128));
        let s = r.surface();
        assert_eq!(s.pixel(0, 0), corner);
        assert_eq!(s.pixel(2, 0), corner);
        assert_eq!(s.pixel(0, 2), corner);
        assert_eq!(s.pixel(2, 2), corner);
        assert_eq!(s.pixel(1, 0), edge);
        assert_eq!(s.pixel(0, 1), edge);
        assert_eq!(s.pixel(2, 1), edge);
        assert_eq!(s.pixel(1, 2), edge);
        assert_eq!(s.pixel(1, 1), RED);
        for i in 0..4 {
            assert_eq!(s.pixel(3, i), 0);
            assert_eq!(s.pixel(i, 3), 0);
        }
    }

    #[test]
    fn unit_rect_at_half_touches_four_pixels() {
        let mut r = renderer(3, 3);
        r.fill_rect(0x8000, 0x8000, FIXED_ONE, FIXED_ONE).unwrap();
        let quarter = scale(RED, 64);
        let s = r.surface();
        assert_eq!(&s.pixels()[0..3], &[quarter, quarter, 0]);
        assert_eq!(&s.pixels()[3..6], &[quarter, quarter, 0]);
        assert_eq!(&s.pixels()[6..9], &[0, 0, 0]);
    }

    #[test]
    fn edges_inside_one_pixel_combine() {
        let mut r = renderer(2, 1);
        // Columns 0.25..0.75 and the full row.
        r.fill_rect(0x4000, 0, 0x8000, FIXED_ONE).unwrap();
        assert_eq!(r.surface().pixels(), &[scale(RED, 128), 0]);

        let mut r = renderer(1, 1);
        r.fill_rect(0x4000, 0x4000, 0x8000, 0x8000).unwrap();
        assert_eq!(r.surface().pixel(0, 0), scale(RED, 64));
    }

    #[test]
    fn clip_trims_fractional_edges() {
        let mut r = renderer(4, 1);
        r.set_clip(1, 0, 2, 1);
        r.fill_rect(0x8000, 0, fx(3.0), FIXED_ONE).unwrap();
        // The clipped left edge is now pixel aligned.
        assert_eq!(r.surface().pixels(), &[0, RED, RED, 0]);
    }

    #[test]
    fn rect_outside_clip_never_acquires() {
        let mut r = Renderer::new(SpySurface::new(4, 4));
        r.set_clip(0, 0, 2, 2);
        r.fill_rect(fx(2.5), 0, FIXED_ONE, FIXED_ONE).unwrap();
        r.fill_rect(0, 0, 0, FIXED_ONE).unwrap();
        assert_eq!(r.surface().acquired, 0);
        assert!(r.surface().pixels.iter().all(|&p| p == 0));

        r.fill_rect(0, 0, FIXED_ONE, FIXED_ONE).unwrap();
        assert_eq!((r.surface().acquired, r.surface().released), (1, 1));
    }

    #[test]
    fn batch_size_does_not_change_output() {
        let draw = |row_capacity: usize| {
            let config = RendererConfig { row_capacity, ..RendererConfig::default() };
            let mut r = Renderer::with_config(PixelSurface::new(12, 12).unwrap(), config);
            r.set_linear_gradient(0.0, 0.0, 0.0, 12.0, linear_ramp(), CycleMethod::Reflect, Transform::IDENTITY);
            r.fill_rect(fx(0.75), fx(0.25), fx(10.5), fx(10.25)).unwrap();
            r.into_surface().pixels().to_vec()
        };
        let reference = draw(8);
        assert_eq!(draw(1), reference);
        assert_eq!(draw(3), reference);
        assert_eq!(draw(0), reference);
    }

    #[test]
    fn clear_rect_zeroes_inside_clip() {
        let mut r = renderer(3, 2);
        r.surface_mut().fill(RED);
        r.set_clip(1, 0, 2, 2);
        r.clear_rect(0, 0, 2, 2).unwrap();
        assert_eq!(r.surface().pixels(), &[RED, 0, RED, RED, 0, RED]);

        r.reset_clip();
        r.clear_rect(0, 0, 3, 2).unwrap();
        assert_eq!(r.surface().pixels(), &[0; 6]);
    }

    // ── rules and formats ─────────────────────────────────────────────────

    #[test]
    fn src_and_clear_rules() {
        let mut r = renderer(2, 1);
        r.surface_mut().fill(0xFFFF_FFFF);
        r.set_color(255, 0, 0, 128);
        r.set_composite_rule(CompositeRule::Src);
        r.fill_rect(0, 0, FIXED_ONE, FIXED_ONE).unwrap();
        assert_eq!(r.surface().pixel(0, 0), 0x8080_0000);

        r.set_composite_rule(CompositeRule::Clear);
        r.fill_rect(FIXED_ONE, 0, FIXED_ONE, FIXED_ONE).unwrap();
        assert_eq!(r.surface().pixel(1, 0), 0);
    }

    #[test]
    fn straight_alpha_surface_stores_unpremultiplied() {
        let mut r = Renderer::new(PixelSurface::with_format(1, 1, PixelFormat::Argb).unwrap());
        r.set_color(255, 0, 0, 128);
        r.fill_rect(0, 0, FIXED_ONE, FIXED_ONE).unwrap();
        assert_eq!(r.surface().pixel(0, 0), 0x80FF_0000);
    }

    #[test]
    fn faint_coverage_on_straight_surface_keeps_color() {
        let mut r = Renderer::new(PixelSurface::with_format(1, 1, PixelFormat::Argb).unwrap());
        r.surface_mut().fill(0x02FF_FFFF);
        r.set_color(255, 0, 0, 255);
        r.fill_alpha_mask(&[1], 0, 0, 1, 1, 0, 1).unwrap();
        assert_eq!(r.surface().pixel(0, 0), 0x02FF_AAAA);
    }

    // ── masks ─────────────────────────────────────────────────────────────

    #[test]
    fn alpha_mask_respects_clip_offset() {
        let mask: Vec<u8> = (0..16u8).map(|i| i * 16).collect();
        let mut r = renderer(4, 4);
        r.set_clip(1, 1, 2, 2);
        r.fill_alpha_mask(&mask, 0, 0, 4, 4, 0, 4).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let expected = if (1..=2).contains(&x) && (1..=2).contains(&y) {
                    scale(RED, mask[(y * 4 + x) as usize] as u32)
                } else {
                    0
                };
                assert_eq!(r.surface().pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn lcd_mask_blends_per_subpixel() {
        let config = RendererConfig { lcd_gamma: 1.0, ..RendererConfig::default() };
        let mut r = Renderer::with_config(PixelSurface::new(2, 1).unwrap(), config);
        r.surface_mut().fill(0xFF00_0000);
        r.set_color(255, 255, 255, 255);
        // Offset 3 skips a leading pixel that is not part of the mask.
        let mask = [9u8, 9, 9, 255, 0, 255, 0, 0, 0];
        r.fill_lcd_alpha_mask(&mask, 0, 0, 2, 1, 3, 9, 0).unwrap();
        assert_eq!(r.surface().pixels(), &[0xFFFF_00FF, 0xFF00_0000]);
    }

    fn lcd_renderer(width: u32) -> Renderer<PixelSurface> {
        let config = RendererConfig { lcd_gamma: 1.0, ..RendererConfig::default() };
        let mut r = Renderer::with_config(PixelSurface::new(width, 1).unwrap(), config);
        r.surface_mut().fill(0xFF00_0000);
        r.set_color(255, 255, 255, 255);
        r
    }

    #[test]
    fn lcd_mask_places_glyph_at_subpixel_offsets() {
        let mask = [255u8; 9];
        for (sub_pos_x, first, last) in [
            (0b0000, 0xFFFF_FFFF, 0xFFFF_FFFF),
            (0b0100, 0xFF00_FFFF, 0xFFFF_FFFF),
            (0b1000, 0xFF00_00FF, 0xFFFF_FFFF),
            (0b0001, 0xFFFF_FFFF, 0xFFFF_0000),
            (0b0010, 0xFFFF_FFFF, 0xFFFF_FF00),
            (0b1001, 0xFF00_00FF, 0xFFFF_0000),
        ] {
            let mut r = lcd_renderer(3);
            r.fill_lcd_alpha_mask(&mask, 0, 0, 3, 1, 0, 9, sub_pos_x).unwrap();
            assert_eq!(r.surface().pixels(), &[first, 0xFFFF_FFFF, last], "sub_pos_x {sub_pos_x:#06b}");
        }
    }

    #[test]
    fn clipped_lcd_columns_drop_their_offsets() {
        let mask = [255u8; 9];
        let mut r = lcd_renderer(3);
        r.set_clip(1, 0, 1, 1);
        r.fill_lcd_alpha_mask(&mask, 0, 0, 3, 1, 0, 9, 0b1001).unwrap();
        assert_eq!(r.surface().pixels(), &[0xFF00_0000, 0xFFFF_FFFF, 0xFF00_0000]);
    }

    #[test]
    fn alpha_row_is_clipped_and_cleared() {
        let map = AlphaMap::for_subpixel_samples(4);
        let mut r = renderer(6, 2);
        r.set_clip(1, 0, 3, 2);
        let mut deltas = [4, 0, 0, 0, -2, -2];
        r.emit_and_clear_alpha_row(&map, &mut deltas, 1, 0, 5, 0).unwrap();
        assert_eq!(deltas, [0; 6]);
        assert_eq!(&r.surface().pixels()[..6], &[0; 6]);
        assert_eq!(&r.surface().pixels()[6..], &[0, RED, RED, RED, 0, 0]);
    }

    #[test]
    fn alpha_row_outside_clip_only_clears() {
        let map = AlphaMap::for_subpixel_samples(4);
        let mut r = Renderer::new(SpySurface::new(4, 2));
        let mut deltas = [4, 0, -4, 0];
        r.emit_and_clear_alpha_row(&map, &mut deltas, 5, 0, 3, 7).unwrap();
        assert_eq!(deltas, [0; 4]);
        assert_eq!(r.surface().acquired, 0);
    }

    // ── textures and images ───────────────────────────────────────────────

    #[test]
    fn white_texture_mask_reproduces_texture() {
        let px = [0xFF10_2030, 0xFF40_5060, 0xFF70_8090, 0xFFA0_B0C0];
        let mut r = renderer(2, 2);
        r.set_color(255, 255, 255, 255);
        r.set_texture_mask(ImageData::packed(&px, 2, 2), Transform::IDENTITY, false, true).unwrap();
        assert_eq!(r.paint_mode(), PaintMode::Texture);
        r.fill_rect(0, 0, 2 << 16, 2 << 16).unwrap();
        assert_eq!(r.surface().pixels(), &px);
    }

    #[test]
    fn draw_image_ramps_opacity_and_keeps_paint() {
        let px = [0xFFFF_FFFFu32; 2];
        let mut r = renderer(1, 2);
        let image = DrawImage { top_opacity: 1.0, bottom_opacity: 0.0, ..DrawImage::new(ImageData::packed(&px, 1, 2)) };
        r.draw_image(&image).unwrap();
        assert_eq!(r.surface().pixels(), &[0xC0C0_C0C0, 0x4040_4040]);
        assert_eq!(r.paint_mode(), PaintMode::FlatColor);
        assert_eq!(r.paint().solid_color(), Some(RED));
    }

    #[test]
    fn failed_texture_keeps_paint() {
        let mut r = renderer(1, 1);
        let huge = ImageData { pixels: &[], width: i32::MAX, height: i32::MAX, offset: 0, stride: 0 };
        let err = r.set_texture(huge, Transform::IDENTITY, false, true).unwrap_err();
        assert!(matches!(err, RenderError::AllocationFailed { .. }));
        assert_eq!(r.paint_mode(), PaintMode::FlatColor);
    }

    // ── allocation failure ────────────────────────────────────────────────

    #[test]
    fn paint_budget_rejects_before_acquiring() {
        let config = RendererConfig { paint_budget: 2, ..RendererConfig::default() };
        let mut r = Renderer::with_config(SpySurface::new(4, 4), config);
        r.set_linear_gradient(0.0, 0.0, 4.0, 0.0, linear_ramp(), CycleMethod::None, Transform::IDENTITY);
        let err = r.fill_rect(0, 0, 4 << 16, 4 << 16).unwrap_err();
        assert!(matches!(err, RenderError::AllocationFailed { .. }));
        assert_eq!(r.surface().acquired, 0);

        r.set_color(255, 0, 0, 255);
        r.fill_rect(0, 0, 4 << 16, 4 << 16).unwrap();
        assert_eq!(r.surface().acquired, 1);
    }

    #[test]
    fn failed_alpha_row_still_clears_deltas() {
        let config = RendererConfig { paint_budget: 2, ..RendererConfig::default() };
        let mut r = Renderer::with_config(SpySurface::new(4, 1), config);
        r.set_linear_gradient(0.0, 0.0, 4.0, 0.0, linear_ramp(), CycleMethod::None, Transform::IDENTITY);
        let map = AlphaMap::for_subpixel_samples(4);
        let mut deltas = [4, 0, 0, -4];
        let err = r.emit_and_clear_alpha_row(&map, &mut deltas, 0, 0, 3, 0).unwrap_err();
        assert!(matches!(err, RenderError::AllocationFailed { .. }));
        assert_eq!(deltas, [0; 4]);
        assert_eq!(r.surface().acquired, 0);
    }

    #[test]
    fn allocation_failure_reports_before_acquiring() {
        let config = RendererConfig { row_capacity: usize::MAX, ..RendererConfig::default() };
        let mut r = Renderer::with_config(SpySurface::unbacked(i32::MAX, i32::MAX), config);
        r.set_linear_gradient(0.0, 0.0, 10.0, 0.0, linear_ramp(), CycleMethod::None, Transform::IDENTITY);

        let err = r.fill_alpha_mask(&[], 0, 0, i32::MAX, i32::MAX, 0, 0).unwrap_err();
        assert!(matches!(err, RenderError::AllocationFailed { .. }));
        assert_eq!(r.surface().acquired, 0);
    }
}
