use kurbo::{BezPath, Cap, Circle, Join, Shape, Stroke, StrokeOpts};

use crate::effects::basin_water::{BasinWater, TextureUnit};
use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{PensieveError, PensieveResult};
use crate::host::surface::{DrawCmd, Surface};

const TOLERANCE: f64 = 0.1;
/// Opacity of the halo drawn under glowing strokes and dots.
const GLOW_ALPHA: f64 = 0.35;

/// A rasterized canvas. `data` is RGBA8, row-major, `width * height * 4` bytes.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRgba {
    /// Straight-alpha copy, as PNG encoders expect.
    pub fn to_straight(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3];
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8;
            }
        }
        out
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RasterSettings {
    pub clear_rgba: Option<[u8; 4]>,
}

/// Replay a canvas's display list into pixels at its backing-store resolution.
pub fn rasterize(surface: &Surface, settings: &RasterSettings) -> PensieveResult<FrameRgba> {
    let (w, h) = surface.backing_size();
    let (w16, h16) = match (u16::try_from(w), u16::try_from(h)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(PensieveError::render(format!(
                "canvas '{}' is too large to rasterize ({w}x{h})",
                surface.id()
            )));
        }
    };

    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    if let Some([r, g, b, a]) = settings.clear_rgba {
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));
    }
    ctx.set_transform(vello_cpu::kurbo::Affine::scale(surface.dpr()));
    for cmd in surface.commands() {
        draw_cmd(&mut ctx, cmd);
    }
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    Ok(FrameRgba {
        width: w,
        height: h,
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

fn draw_cmd(ctx: &mut vello_cpu::RenderContext, cmd: &DrawCmd) {
    match cmd {
        DrawCmd::Polyline {
            points,
            width,
            head,
            tail,
            glow,
        } => {
            let n = points.len();
            for (i, seg) in points.windows(2).enumerate() {
                // Colour runs from the head (first point) to the tail.
                let k = if n > 2 { i as f64 / (n - 2) as f64 } else { 0.0 };
                let color = mix(*head, *tail, k);
                stroke_segment(ctx, seg[0], seg[1], *width, color, *glow);
            }
        }
        DrawCmd::Line {
            from,
            to,
            width,
            color,
            glow,
        } => stroke_segment(ctx, *from, *to, *width, *color, *glow),
        DrawCmd::Circle {
            center,
            radius,
            color,
            glow,
        } => {
            if *glow > 0.0 {
                let halo = Circle::new(*center, radius + glow).to_path(TOLERANCE);
                fill(ctx, &halo, color.with_alpha(alpha01(*color) * GLOW_ALPHA));
            }
            let dot = Circle::new(*center, *radius).to_path(TOLERANCE);
            fill(ctx, &dot, *color);
        }
    }
}

fn stroke_segment(
    ctx: &mut vello_cpu::RenderContext,
    from: Point,
    to: Point,
    width: f64,
    color: Rgba8,
    glow: f64,
) {
    let mut line = BezPath::new();
    line.move_to(from);
    line.line_to(to);
    if glow > 0.0 {
        let halo = outline(&line, width + glow);
        fill(ctx, &halo, color.with_alpha(alpha01(color) * GLOW_ALPHA));
    }
    fill(ctx, &outline(&line, width), color);
}

fn outline(path: &BezPath, width: f64) -> BezPath {
    let style = Stroke::new(width.max(0.0))
        .with_caps(Cap::Round)
        .with_join(Join::Round);
    kurbo::stroke(path.iter(), &style, &StrokeOpts::default(), TOLERANCE)
}

fn fill(ctx: &mut vello_cpu::RenderContext, path: &BezPath, color: Rgba8) {
    if color.a == 0 {
        return;
    }
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_path(&bezpath_to_cpu(path));
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let p = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(a) => out.move_to(p(a)),
            PathEl::LineTo(a) => out.line_to(p(a)),
            PathEl::QuadTo(a, b) => out.quad_to(p(a), p(b)),
            PathEl::CurveTo(a, b, c) => out.curve_to(p(a), p(b), p(c)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn alpha01(c: Rgba8) -> f64 {
    f64::from(c.a) / 255.0
}

fn mix(a: Rgba8, b: Rgba8, k: f64) -> Rgba8 {
    let ch = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * k).round() as u8;
    Rgba8::new(ch(a.r, b.r), ch(a.g, b.g), ch(a.b, b.b), ch(a.a, b.a))
}

/// Shade the water canvas on the CPU from its current uniforms, sampling each texture
/// as its flat placeholder colour. Always opaque.
pub fn shade_water(water: &BasinWater) -> PensieveResult<FrameRgba> {
    let u = water.uniforms();
    let width = (u.res[0] as u32).max(1);
    let height = (u.res[1] as u32).max(1);
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .filter(|_| u16::try_from(width).is_ok() && u16::try_from(height).is_ok())
        .ok_or_else(|| {
            PensieveError::render(format!(
                "water canvas is too large to shade ({width}x{height})"
            ))
        })?;
    let base = water.texture(TextureUnit::Base).fallback_rgb();
    let normal = water.texture(TextureUnit::Normal).fallback_rgb();

    let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    let mut data = Vec::with_capacity(len);
    for y in 0..height {
        let v = (f64::from(y) + 0.5) / f64::from(height);
        for x in 0..width {
            let uv = [(f64::from(x) + 0.5) / f64::from(width), v];
            let [r, g, b] = u.shade(uv, base, normal);
            data.extend_from_slice(&[to_u8(r), to_u8(g), to_u8(b), 255]);
        }
    }
    Ok(FrameRgba {
        width,
        height,
        data,
        premultiplied: false,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
