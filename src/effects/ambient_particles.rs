//! Background dust drifting down the whole viewport.

use crate::effects::{Effect, EffectKey};
use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::PensieveResult;
use crate::foundation::math::{Range, Rng64};
use crate::host::frame::FrameLoop;
use crate::host::stage::{ListenerId, Stage};
use crate::host::surface::{DrawCmd, Surface};

/// Speeds are tuned in px per frame at this rate.
const TUNED_FPS: f64 = 60.0;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AmbientParticlesOptions {
    pub canvas_id: String,
    pub max_particles: u32,
    /// Particles per square CSS pixel, capped by `max_particles`.
    pub density_factor: f64,
    pub base_speed: f64,
    pub base_radius: f64,
    pub color: [u8; 3],
    /// 0 is far back, 1 is close to the viewer.
    pub depth: Range,
    pub seed: u64,
}

impl Default for AmbientParticlesOptions {
    fn default() -> Self {
        Self {
            canvas_id: "particles".to_owned(),
            max_particles: 70,
            density_factor: 0.00008,
            base_speed: 0.08,
            base_radius: 0.7,
            color: [255, 255, 255],
            depth: Range::new(0.15, 1.0),
            seed: 0xd057,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Mote {
    pos: Point,
    depth: f64,
    radius: f64,
    speed_y: f64,
}

#[derive(Clone, Debug)]
pub struct AmbientParticles {
    opts: AmbientParticlesOptions,
    surface: Surface,
    listener: ListenerId,
    frames: FrameLoop,
    motes: Vec<Mote>,
    rng: Rng64,
}

impl AmbientParticles {
    pub fn create(opts: AmbientParticlesOptions, stage: &mut Stage) -> PensieveResult<Option<Self>> {
        let Some(surface) = stage.claim_canvas(&opts.canvas_id) else {
            return Ok(None);
        };
        let listener = stage.listen_resize(EffectKey::AmbientParticles.as_str());
        let rng = Rng64::new(opts.seed);
        let mut field = Self {
            opts,
            surface,
            listener,
            frames: FrameLoop::default(),
            motes: Vec::new(),
            rng,
        };
        field.resize(stage);
        Ok(Some(field))
    }

    pub fn particle_count(&self) -> usize {
        self.motes.len()
    }

    /// Population for a canvas of the given CSS size.
    pub fn ideal_count(&self, width: f64, height: f64) -> usize {
        let by_area = (width * height * self.opts.density_factor).floor().max(0.0) as usize;
        by_area.min(self.opts.max_particles as usize)
    }

    fn seed_field(&mut self) {
        let (w, h) = self.surface.css_size();
        let n = self.ideal_count(w, h);
        let mut motes = Vec::with_capacity(n);
        for _ in 0..n {
            let x = self.rng.next_f64_01() * w;
            let y = self.rng.next_f64_01() * h;
            motes.push(self.mote_at(Point::new(x, y)));
        }
        self.motes = motes;
        tracing::debug!(particles = n, "ambient field seeded");
    }

    fn mote_at(&mut self, pos: Point) -> Mote {
        let depth = self.opts.depth.sample(&mut self.rng);
        Mote {
            pos,
            depth,
            radius: self.opts.base_radius + depth * 1.3,
            speed_y: self.opts.base_speed + depth * 0.35,
        }
    }

    fn step(&mut self, dt: f64) {
        let (w, h) = self.surface.css_size();
        for i in 0..self.motes.len() {
            let mut m = self.motes[i];
            m.pos.y += m.speed_y * dt * TUNED_FPS;
            if m.pos.y - m.radius > h {
                // Recycle at the top with a fresh depth.
                let x = self.rng.next_f64_01() * w;
                m = self.mote_at(Point::new(x, 0.0));
                m.pos.y = -m.radius;
            }
            self.motes[i] = m;
        }
    }

    fn draw(&mut self) {
        self.surface.clear();
        let [r, g, b] = self.opts.color;
        for m in &self.motes {
            let alpha = 0.05 + m.depth * 0.15;
            self.surface.draw(DrawCmd::Circle {
                center: m.pos,
                radius: m.radius,
                color: Rgba8::new(r, g, b, 255).with_alpha(alpha),
                glow: (1.0 - m.depth) * 6.0,
            });
        }
    }
}

impl Effect for AmbientParticles {
    fn key(&self) -> EffectKey {
        EffectKey::AmbientParticles
    }

    /// The field ignores the timeline.
    fn apply(&mut self, _t: f64) {}

    fn reset(&mut self) {}

    fn stop(&mut self) {
        self.frames.cancel();
    }

    /// Rescales the full-viewport canvas. The field is only re-seeded when it is empty,
    /// so a resize never throws away drifting motes.
    fn resize(&mut self, stage: &Stage) {
        let vp = stage.viewport();
        self.surface.resize(vp.width, vp.height, vp.dpr());
        if self.motes.is_empty() {
            self.seed_field();
        }
        if !self.motes.is_empty() {
            self.frames.request();
        }
    }

    fn frame(&mut self, now_ms: f64) {
        if !self.frames.is_active() {
            return;
        }
        if self.motes.is_empty() {
            self.frames.cancel();
            self.surface.clear();
            return;
        }
        let dt = self.frames.advance(now_ms);
        self.step(dt);
        self.draw();
    }

    fn is_looping(&self) -> bool {
        self.frames.is_active()
    }

    fn surface(&self) -> Option<&Surface> {
        Some(&self.surface)
    }

    fn snapshot(&self) -> serde_json::Value {
        let (w, h) = self.surface.css_size();
        serde_json::json!({
            "particles": self.motes.len(),
            "width": w,
            "height": h,
        })
    }

    fn listener(&self) -> Option<ListenerId> {
        Some(self.listener)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/ambient_particles.rs"]
mod tests;
