//! World-space wisps that carry vial threads across the screen into the basin.
//!
//! The bridge has no phase window of its own: it wakes up when an [`Signal::Egress`]
//! arrives and stops its loop once the last wisp has faded.

use crate::effects::{EgressPayload, Effect, EffectKey, Signal};
use crate::foundation::core::{Hsla, Point, Rect, Vec2};
use crate::foundation::error::PensieveResult;
use crate::foundation::math::{Range, Rng64, clamp01, lerp_angle};
use crate::host::frame::FrameLoop;
use crate::host::stage::{ListenerId, Stage};
use crate::host::surface::{DrawCmd, Surface};

/// Wisps dropped at once when the bridge is full.
const EVICT_BATCH: usize = 10;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WispBridgeOptions {
    pub canvas_id: String,
    pub basin_selector: String,
    /// Attraction point as a fraction of the basin box.
    pub basin_target: Point,
    pub max_wisps: u32,

    /// Downward pull, px/s².
    pub gravity: f64,
    /// Pull toward the basin target, px/s².
    pub attract: f64,
    pub steer: f64,
    pub noise: f64,
    /// Per-frame velocity retention.
    pub drag: f64,

    pub life_ms: Range,
    pub glow_blur: f64,
    pub seed: u64,
}

impl Default for WispBridgeOptions {
    fn default() -> Self {
        Self {
            canvas_id: "wisp-bridge".to_owned(),
            basin_selector: "#scene-basin".to_owned(),
            basin_target: Point::new(0.5, 0.55),
            max_wisps: 140,
            gravity: 10.0,
            attract: 18.0,
            steer: 0.06,
            noise: 0.65,
            drag: 0.985,
            life_ms: Range::new(900.0, 1600.0),
            glow_blur: 9.0,
            seed: 0x0b51_d6e5,
        }
    }
}

#[derive(Clone, Debug)]
struct Wisp {
    pos: Point,
    vel: Vec2,
    angle: f64,
    hue: f64,
    line_width: f64,
    alpha: f64,
    noise_strength: f64,
    base_turn_speed: f64,
    /// Stamped by the first frame after the wisp arrived.
    born_ms: Option<f64>,
    life_ms: f64,
    phase: f64,
}

#[derive(Clone, Debug)]
pub struct WispBridge {
    opts: WispBridgeOptions,
    surface: Surface,
    listener: ListenerId,
    basin: Option<Rect>,
    frames: FrameLoop,
    wisps: Vec<Wisp>,
    emitted: u64,
    rng: Rng64,
}

impl WispBridge {
    /// Only the overlay canvas is required; without a basin the wisps are not drawn.
    pub fn create(opts: WispBridgeOptions, stage: &mut Stage) -> PensieveResult<Option<Self>> {
        let Some(surface) = stage.claim_canvas(&opts.canvas_id) else {
            return Ok(None);
        };
        let listener = stage.listen_resize(EffectKey::WispBridge.as_str());
        let rng = Rng64::new(opts.seed);
        let mut bridge = Self {
            opts,
            surface,
            listener,
            basin: None,
            frames: FrameLoop::default(),
            wisps: Vec::new(),
            emitted: 0,
            rng,
        };
        bridge.resize(stage);
        Ok(Some(bridge))
    }

    /// Take over a thread leaving a vial. Starts the loop if it was idle.
    pub fn emit(&mut self, payload: &EgressPayload) {
        if self.wisps.len() >= self.opts.max_wisps as usize {
            let n = EVICT_BATCH.min(self.wisps.len());
            self.wisps.drain(..n);
        }

        let rng = &mut self.rng;
        let life_ms = self.opts.life_ms.sample(rng);
        let sp = payload.speed * (0.55 + 0.35 * clamp01(payload.local_pour));
        self.wisps.push(Wisp {
            pos: Point::new(payload.x, payload.y),
            vel: Vec2::new(payload.angle.cos() * sp, payload.angle.sin() * sp),
            angle: payload.angle,
            hue: payload.hue,
            line_width: payload.line_width,
            alpha: payload.alpha,
            noise_strength: payload.noise_strength,
            base_turn_speed: payload.base_turn_speed,
            born_ms: None,
            life_ms,
            phase: rng.angle(),
        });
        self.emitted += 1;

        if self.frames.request() {
            tracing::debug!("wisp bridge woke up");
        }
    }

    pub fn wisp_count(&self) -> usize {
        self.wisps.len()
    }

    /// Wisps accepted since construction, evicted ones included.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn target(&self) -> Option<Point> {
        self.basin.map(|b| {
            Point::new(
                b.x0 + b.width() * self.opts.basin_target.x,
                b.y0 + b.height() * self.opts.basin_target.y,
            )
        })
    }

    /// Distance from the wisp centroid to the basin target.
    pub fn centroid_distance(&self) -> Option<f64> {
        let target = self.target()?;
        if self.wisps.is_empty() {
            return None;
        }
        let n = self.wisps.len() as f64;
        let sum = self
            .wisps
            .iter()
            .fold(Vec2::ZERO, |acc, w| acc + w.pos.to_vec2());
        Some(((sum / n).to_point() - target).hypot())
    }

    fn step(&mut self, dt: f64, now_ms: f64, dst: Point) {
        let o = &self.opts;
        let t_sec = now_ms / 1000.0;
        let rng = &mut self.rng;

        self.wisps.retain_mut(|w| {
            let born = *w.born_ms.get_or_insert(now_ms);
            let age = now_ms - born;
            if age >= w.life_ms {
                return false;
            }

            let d = dst - w.pos;
            let dist = match d.hypot() {
                x if x > 0.0 => x,
                _ => 1.0,
            };
            let accel = d * (o.attract / dist);

            let turn_noise = ((t_sec * w.base_turn_speed
                + w.pos.x * 0.01
                + w.pos.y * 0.008
                + w.phase)
                .sin()
                + (rng.next_f64_01() - 0.5) * 0.35)
                * 0.5
                * w.noise_strength
                * o.noise;
            w.angle += turn_noise * dt;
            w.angle = lerp_angle(w.angle, d.y.atan2(d.x), o.steer);

            w.vel.x += (w.angle.cos() * 8.0 + accel.x) * dt;
            w.vel.y += (w.angle.sin() * 8.0 + accel.y + o.gravity) * dt;
            w.vel *= o.drag;
            w.pos += w.vel * dt;
            true
        });
    }

    fn expire(&mut self, now_ms: f64) {
        self.wisps.retain_mut(|w| {
            let born = *w.born_ms.get_or_insert(now_ms);
            now_ms - born < w.life_ms
        });
    }

    fn draw(&mut self, now_ms: f64) {
        self.surface.clear();
        for w in &self.wisps {
            let age = w.born_ms.map_or(0.0, |born| now_ms - born);
            let age_t = age / w.life_ms;
            let life_t = 1.0 - age_t;
            let fade = clamp01(life_t / 0.35) * clamp01(age_t / 0.08);
            let a = w.alpha * fade;

            let trail = 10.0 + 14.0 * (1.0 - life_t);
            let tail = w.pos - Vec2::new(w.angle.cos(), w.angle.sin()) * trail;
            self.surface.draw(DrawCmd::Polyline {
                points: vec![w.pos, tail],
                width: w.line_width,
                head: Hsla::new(w.hue, 0.80, 0.95, a).to_rgba8(),
                tail: Hsla::new(w.hue, 0.70, 0.90, a * 0.25).to_rgba8(),
                glow: self.opts.glow_blur,
            });
        }
    }
}

impl Effect for WispBridge {
    fn key(&self) -> EffectKey {
        EffectKey::WispBridge
    }

    /// Fed by egress only.
    fn apply(&mut self, _t: f64) {}

    fn reset(&mut self) {
        self.stop();
        self.wisps.clear();
        self.surface.clear();
    }

    fn stop(&mut self) {
        self.frames.cancel();
    }

    fn resize(&mut self, stage: &Stage) {
        let vp = stage.viewport();
        self.surface.resize(vp.width, vp.height, vp.dpr());
        self.basin = stage.rect_of(&self.opts.basin_selector);
    }

    fn frame(&mut self, now_ms: f64) {
        if !self.frames.is_active() {
            return;
        }
        let dt = self.frames.advance(now_ms);
        match self.target() {
            Some(dst) => {
                self.step(dt, now_ms, dst);
                self.draw(now_ms);
            }
            None => {
                // Nothing to fly toward: wisps only age out.
                self.expire(now_ms);
                self.surface.clear();
            }
        }

        if self.wisps.is_empty() {
            self.frames.cancel();
            tracing::debug!("wisp bridge drained");
        }
    }

    fn is_looping(&self) -> bool {
        self.frames.is_active()
    }

    fn accept(&mut self, signal: &Signal) {
        if let Signal::Egress(payload) = signal {
            self.emit(payload);
        }
    }

    fn surface(&self) -> Option<&Surface> {
        Some(&self.surface)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "wisps": self.wisps.len(),
            "emitted": self.emitted,
            "looping": self.frames.is_active(),
            "centroidDistance": self.centroid_distance(),
        })
    }

    fn listener(&self) -> Option<ListenerId> {
        Some(self.listener)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/wisp_bridge.rs"]
mod tests;
