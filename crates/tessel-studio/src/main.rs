use std::path::PathBuf;

use anyhow::{Context, Result};
use tessel_engine::coords::{CycleMethod, PixelRect, Transform};
use tessel_engine::logging::{init_logging, LoggingConfig};
use tessel_engine::paint::color::unpremultiply;
use tessel_engine::paint::{Color, ColorStop, GradientRamp, ImageData};
use tessel_engine::render::AlphaMap;
use tessel_engine::{CompositeRule, DrawImage, PixelSurface, Renderer, Surface};

const WIDTH: u32 = 480;
const HEIGHT: u32 = 320;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let out = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tessel-demo.png"));

    let surface = PixelSurface::new(WIDTH, HEIGHT).context("creating surface")?;
    let mut r = Renderer::new(surface);
    draw_scene(&mut r).context("rendering scene")?;

    write_png(r.surface(), &out).with_context(|| format!("writing {}", out.display()))?;
    log::info!("wrote {}", out.display());
    Ok(())
}

fn fx(v: f32) -> i32 {
    (v * 65536.0) as i32
}

fn draw_scene(r: &mut Renderer<PixelSurface>) -> Result<()> {
    // ── background ────────────────────────────────────────────────────────
    let sky = GradientRamp::from_stops(&[
        ColorStop::new(0.0, Color::new(18, 22, 38, 255)),
        ColorStop::new(1.0, Color::new(60, 72, 110, 255)),
    ]);
    r.set_linear_gradient(0.0, 0.0, 0.0, HEIGHT as f32, sky, CycleMethod::None, Transform::IDENTITY);
    r.fill_rect(0, 0, fx(WIDTH as f32), fx(HEIGHT as f32))?;

    // ── flat panels with fractional edges ─────────────────────────────────
    r.set_color(230, 90, 60, 255);
    r.fill_rect(fx(20.5), fx(20.25), fx(120.0), fx(80.5))?;
    r.set_color(80, 200, 140, 160);
    r.fill_rect(fx(90.25), fx(60.75), fx(120.0), fx(80.0))?;

    // ── radial glow ───────────────────────────────────────────────────────
    let glow = GradientRamp::from_stops(&[
        ColorStop::new(0.0, Color::new(255, 240, 180, 255)),
        ColorStop::new(0.6, Color::new(255, 160, 60, 180)),
        ColorStop::new(1.0, Color::new(255, 120, 40, 0)),
    ]);
    r.set_radial_gradient(360.0, 90.0, 340.0, 70.0, 70.0, glow, CycleMethod::None, Transform::IDENTITY);
    r.fill_rect(fx(290.0), fx(20.0), fx(140.0), fx(140.0))?;

    // ── repeating stripes through a clip ──────────────────────────────────
    let stripes = GradientRamp::from_stops(&[
        ColorStop::new(0.0, Color::new(250, 250, 250, 200)),
        ColorStop::new(1.0, Color::new(40, 40, 60, 200)),
    ]);
    r.set_clip(20, 180, 200, 120);
    r.set_linear_gradient(0.0, 0.0, 16.0, 16.0, stripes, CycleMethod::Reflect, Transform::rotate(0.4));
    r.fill_rect(0, 0, fx(WIDTH as f32), fx(HEIGHT as f32))?;
    r.reset_clip();

    // ── textures ──────────────────────────────────────────────────────────
    let checker = checkerboard(16, 4);
    let image = ImageData::packed(&checker, 16, 16);
    let t = Transform::translate(250.0, 190.0)
        .then(Transform::rotate(0.35))
        .then(Transform::scale(3.0, 3.0));
    r.set_texture(image, t, true, false)?;
    r.fill_rect(fx(240.0), fx(180.0), fx(100.0), fx(110.0))?;

    // Checker as a mask over a gradient.
    let tint = GradientRamp::from_stops(&[
        ColorStop::new(0.0, Color::new(80, 160, 255, 255)),
        ColorStop::new(1.0, Color::new(255, 80, 200, 255)),
    ]);
    r.set_linear_gradient(360.0, 0.0, 460.0, 0.0, tint, CycleMethod::None, Transform::IDENTITY);
    r.set_texture_mask(image, Transform::scale(4.0, 4.0), true, true)?;
    r.fill_rect(fx(360.0), fx(180.0), fx(100.0), fx(60.0))?;

    // Fading image blit.
    let draw = DrawImage {
        transform: Transform::translate(360.0, 250.0).then(Transform::scale(6.0, 3.0)),
        bounds: PixelRect::from_xywh(360, 250, 96, 48),
        top_opacity: 1.0,
        bottom_opacity: 0.1,
        ..DrawImage::new(image)
    };
    r.draw_image(&draw)?;

    // ── masks ─────────────────────────────────────────────────────────────
    r.set_color(255, 255, 255, 255);
    let (mw, mh) = (64, 32);
    r.fill_alpha_mask(&disc_mask(mw, mh), 150, 20, mw as i32, mh as i32, 0, mw)?;

    r.set_color(250, 220, 120, 255);
    r.fill_lcd_alpha_mask(&lcd_mask(mw, mh), 150, 60, mw as i32, mh as i32, 0, 3 * mw, 0b0110)?;

    // Accumulated-delta rows: a wedge.
    r.set_color(120, 220, 255, 220);
    let map = AlphaMap::for_subpixel_samples(4);
    let mut deltas = vec![0i32; 121];
    for row in 0..60 {
        let right = 2 * row;
        deltas[0] += 4;
        deltas[right] -= 2;
        deltas[right + 1] -= 2;
        r.emit_and_clear_alpha_row(&map, &mut deltas, 240 + row as i32, 20, 140, row as i32)?;
    }

    // ── punch-out ─────────────────────────────────────────────────────────
    r.set_composite_rule(CompositeRule::Clear);
    r.set_color(0, 0, 0, 255);
    r.fill_rect(fx(60.0), fx(40.0), fx(20.5), fx(20.5))?;
    r.set_composite_rule(CompositeRule::SrcOver);
    r.clear_rect(WIDTH as i32 - 12, 0, 12, 12)?;
    Ok(())
}

fn checkerboard(size: usize, cell: usize) -> Vec<u32> {
    (0..size * size)
        .map(|i| {
            let (x, y) = (i % size, i / size);
            if (x / cell + y / cell) % 2 == 0 { 0xFFF0_F0F0 } else { 0xFF30_3848 }
        })
        .collect()
}

/// Antialiased ellipse coverage, 4x4 supersampled.
fn disc_mask(w: usize, h: usize) -> Vec<u8> {
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let mut mask = vec![0u8; w * h];
    for (i, m) in mask.iter_mut().enumerate() {
        let (px, py) = ((i % w) as f32, (i / w) as f32);
        let mut hits = 0u32;
        for s in 0..16 {
            let sx = px + (s % 4) as f32 / 4.0 + 0.125;
            let sy = py + (s / 4) as f32 / 4.0 + 0.125;
            let (dx, dy) = ((sx - cx) / cx, (sy - cy) / cy);
            if dx * dx + dy * dy <= 1.0 {
                hits += 1;
            }
        }
        *m = (hits * 255 / 16) as u8;
    }
    mask
}

/// Horizontal subpixel ramp, one coverage byte per channel.
fn lcd_mask(w: usize, h: usize) -> Vec<u8> {
    let sub = 3 * w;
    (0..sub * h)
        .map(|i| {
            let s = i % sub;
            (s * 255 / (sub - 1)) as u8
        })
        .collect()
}

fn write_png(surface: &PixelSurface, path: &std::path::Path) -> Result<()> {
    let rgba: Vec<u8> = surface
        .pixels()
        .iter()
        .flat_map(|&p| {
            let s = unpremultiply(p);
            [(s >> 16) as u8, (s >> 8) as u8, s as u8, (s >> 24) as u8]
        })
        .collect();
    let (w, h) = (surface.width() as u32, surface.height() as u32);
    image::save_buffer(path, &rgba, w, h, image::ExtendedColorType::Rgba8)?;
    Ok(())
}
