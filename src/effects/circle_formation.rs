//! Ring of thread-like particles that forms inside the basin.
//!
//! Entry is phase driven: crossing into the window starts a burst, and once the lock
//! ramp completes the particles are held on the ring. Exit is external only. A locked
//! ring keeps spinning after its window has passed until [`Effect::stop`] is called.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use crate::animation::phase::PhaseWindow;
use crate::effects::{Effect, EffectKey};
use crate::foundation::core::{Hsla, Point, Rect, Vec2};
use crate::foundation::error::{PensieveError, PensieveResult};
use crate::foundation::math::{Range, Rng64, clamp01};
use crate::host::frame::FrameLoop;
use crate::host::stage::{ListenerId, Stage};
use crate::host::surface::{DrawCmd, Surface};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircleFormationOptions {
    pub canvas_id: String,
    pub basin_selector: String,

    /// Window that triggers the burst and drives the lock ramp.
    pub phase: PhaseWindow,

    /// Ring centre as a fraction of the basin box.
    pub ring_center: Point,
    /// Radius as a fraction of the basin's smaller side.
    pub ring_radius: f64,

    pub wobble_amp: f64,
    pub wobble_freq: f64,
    pub ring_noise_amp: f64,
    pub ring_noise_freq: f64,

    pub max_particles: u32,
    /// Particles per second while bursting.
    pub spawn_rate: f64,
    pub spawn_jitter_px: f64,
    /// Seconds for a new particle to fade in.
    pub spawn_alpha_in: f64,
    /// Annulus (fraction of ring radius) new particles appear in.
    pub spawn_outer_band: Range,

    pub lock_strength: f64,
    pub radius_damping: f64,
    pub swirl_base: f64,
    pub swirl_var: f64,
    pub swirl_accel: f64,
    pub spiral_bias: f64,

    /// Lock ramp inside the phase window, in local progress.
    pub lock_start: f64,
    pub lock_end: f64,

    pub line_width: Range,
    pub max_alpha: f64,
    pub glow_blur: f64,
    pub hue: Range,
    pub trail_points: u32,

    pub bubble_bob_amp: f64,
    pub bubble_bob_freq: f64,
    /// 1 ties the radial bob to the spiral angle, 0 to the particle's own phase.
    pub bubble_bob_phase_lock: f64,

    pub seed: u64,
}

impl Default for CircleFormationOptions {
    fn default() -> Self {
        Self {
            canvas_id: "basin-canvas".to_owned(),
            basin_selector: "#scene-basin".to_owned(),
            phase: PhaseWindow { from: 0.30, to: 0.70 },
            ring_center: Point::new(0.5, 0.56),
            ring_radius: 0.305,
            wobble_amp: 0.022,
            wobble_freq: 0.45,
            ring_noise_amp: 0.018,
            ring_noise_freq: 0.55,
            max_particles: 70,
            spawn_rate: 14.0,
            spawn_jitter_px: 6.0,
            spawn_alpha_in: 0.12,
            spawn_outer_band: Range::new(0.72, 0.98),
            lock_strength: 4.6,
            radius_damping: 0.90,
            swirl_base: 0.18,
            swirl_var: 0.07,
            swirl_accel: 0.10,
            spiral_bias: 0.015,
            lock_start: 0.10,
            lock_end: 0.92,
            line_width: Range::new(1.6, 2.6),
            max_alpha: 0.42,
            glow_blur: 9.0,
            hue: Range::new(205.0, 225.0),
            trail_points: 7,
            bubble_bob_amp: 10.0,
            bubble_bob_freq: 0.35,
            bubble_bob_phase_lock: 0.85,
            seed: 0x5eed_c1c1e,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormationState {
    /// No particles, waiting for the window.
    Idle,
    /// Spawning and converging onto the ring.
    Bursting,
    /// Spawning stopped; particles ride the ring until stopped.
    Locked,
}

#[derive(Clone, Debug)]
struct RingParticle {
    pos: Point,
    vel: Vec2,
    hue: f64,
    line_width: f64,
    alpha: f64,
    seed: f64,
    phase: f64,
    theta: f64,
    omega: f64,
    r_offset: f64,
    r_vel: f64,
    born_ms: f64,
    trail: VecDeque<Point>,
}

#[derive(Clone, Debug)]
pub struct CircleFormation {
    opts: CircleFormationOptions,
    surface: Surface,
    listener: ListenerId,
    basin: Rect,
    frames: FrameLoop,
    state: FormationState,
    last_t: f64,
    spawn_carry: f64,
    particles: Vec<RingParticle>,
    rng: Rng64,
}

impl CircleFormation {
    pub fn create(opts: CircleFormationOptions, stage: &mut Stage) -> PensieveResult<Option<Self>> {
        opts.phase.validate()?;
        if opts.lock_start.is_nan() || opts.lock_end.is_nan() || opts.lock_start >= opts.lock_end {
            return Err(PensieveError::validation(format!(
                "lockStart {} must be below lockEnd {}",
                opts.lock_start, opts.lock_end
            )));
        }
        let Some(basin) = stage.rect_of(&opts.basin_selector) else {
            return Ok(None);
        };
        let Some(surface) = stage.claim_canvas(&opts.canvas_id) else {
            return Ok(None);
        };
        let listener = stage.listen_resize(EffectKey::CircleFormation.as_str());
        let rng = Rng64::new(opts.seed);
        let mut formation = Self {
            opts,
            surface,
            listener,
            basin,
            frames: FrameLoop::default(),
            state: FormationState::Idle,
            last_t: 0.0,
            spawn_carry: 0.0,
            particles: Vec::new(),
            rng,
        };
        formation.resize(stage);
        Ok(Some(formation))
    }

    pub fn state(&self) -> FormationState {
        self.state
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Lock ramp for the last applied `t`.
    pub fn lock_t(&self) -> f64 {
        let p = self.opts.phase.local(self.last_t);
        clamp01((p - self.opts.lock_start) / (self.opts.lock_end - self.opts.lock_start))
    }

    fn ring_geometry(&self) -> (Point, f64) {
        let w = self.basin.width();
        let h = self.basin.height();
        let center = Point::new(w * self.opts.ring_center.x, h * self.opts.ring_center.y);
        (center, w.min(h) * self.opts.ring_radius)
    }

    fn spawn(&mut self, dt: f64, now_ms: f64, center: Point, base_r: f64) {
        let max = self.opts.max_particles as usize;
        if self.particles.len() >= max {
            return;
        }
        self.spawn_carry += self.opts.spawn_rate * dt;
        let want = (max - self.particles.len()).min(self.spawn_carry.floor() as usize);
        self.spawn_carry -= want as f64;

        let o = &self.opts;
        let jitter = o.spawn_jitter_px;
        let band_min = base_r * clamp01(o.spawn_outer_band.min);
        let band_max = base_r * clamp01(o.spawn_outer_band.max);
        let trail_len = o.trail_points.max(1) as usize;

        for _ in 0..want {
            let rng = &mut self.rng;
            let a = rng.angle();
            // Uniform by area within the annulus.
            let u = rng.next_f64_01();
            let r = (band_min * band_min + u * (band_max * band_max - band_min * band_min)).sqrt();
            let x = center.x + a.cos() * r + rng.range(-jitter, jitter);
            let y = center.y + a.sin() * r + rng.range(-jitter, jitter);

            let d = Vec2::new(x - center.x, y - center.y);
            let r0 = d.hypot();
            let pos = Point::new(x, y);
            self.particles.push(RingParticle {
                pos,
                vel: Vec2::ZERO,
                hue: o.hue.sample(rng),
                line_width: o.line_width.sample(rng),
                alpha: rng.range(0.28, 0.55),
                seed: rng.next_f64_01() * 1000.0,
                phase: rng.angle(),
                // Start at the nearest ring point.
                theta: d.y.atan2(d.x),
                omega: o.swirl_base + rng.range(-o.swirl_var, o.swirl_var),
                r_offset: (((r0 / (base_r + 0.0001)) - 1.0) / 0.08).clamp(-1.0, 1.0),
                r_vel: 0.0,
                born_ms: now_ms,
                trail: std::iter::repeat_n(pos, trail_len).collect(),
            });
        }
    }

    fn step(&mut self, dt: f64, now_ms: f64) {
        let t_sec = now_ms / 1000.0;
        let (center, base_r) = self.ring_geometry();

        let lock_t = self.lock_t();
        if lock_t >= 0.999 && self.state == FormationState::Bursting {
            self.state = FormationState::Locked;
            tracing::debug!(particles = self.particles.len(), "ring locked");
        }
        let locked = self.state == FormationState::Locked;

        if !locked {
            self.spawn(dt, now_ms, center, base_r);
        }

        let o = &self.opts;
        let breath = (t_sec * o.wobble_freq).sin() * o.wobble_amp;
        let k = if locked { 1.0 } else { lock_t };
        let trail_max = o.trail_points.max(1) as usize;

        for part in &mut self.particles {
            let rn = (t_sec * o.ring_noise_freq + part.seed + part.theta * 3.0).sin()
                * o.ring_noise_amp;
            let target_r = base_r * (1.0 + breath + rn);

            part.theta += part.omega * (1.0 + k * o.swirl_accel) * dt;

            let radial_err = -part.r_offset;
            let spiral = (t_sec * 0.6 + part.phase).sin() * o.spiral_bias;
            part.r_vel = (part.r_vel + radial_err * (o.lock_strength * (0.25 + 0.75 * k)) * dt)
                * o.radius_damping;
            part.r_offset += part.r_vel * dt + spiral * dt;

            let lock = o.bubble_bob_phase_lock;
            let bob_phase = lock * part.theta + (1.0 - lock) * (part.seed + part.phase);
            let bob_px = (t_sec * o.bubble_bob_freq * TAU + bob_phase).sin() * o.bubble_bob_amp;
            let bob_r = bob_px / (base_r + 0.0001);
            let bob_strength = if locked { 1.0 } else { 0.15 + 0.85 * k };

            let r = target_r * (1.0 + bob_r * 0.22 * bob_strength) * (1.0 + part.r_offset * 0.08);
            let target = Point::new(
                center.x + part.theta.cos() * r,
                center.y + part.theta.sin() * r,
            );

            if locked {
                part.pos = part.pos.lerp(target, 0.42);
            } else {
                part.vel *= 0.94;
                part.pos += part.vel * dt;
                let pull = (0.35 + 0.55 * k) * dt * 8.0;
                part.pos += (target - part.pos) * pull;
            }

            let next = match part.trail.front() {
                Some(last) => last.lerp(part.pos, 0.75),
                None => part.pos,
            };
            part.trail.push_front(next);
            part.trail.truncate(trail_max);
        }
    }

    fn draw(&mut self, now_ms: f64) {
        self.surface.clear();
        let alpha_in = self.opts.spawn_alpha_in + 0.0001;
        for part in &self.particles {
            let age = (now_ms - part.born_ms) / 1000.0;
            let a = self.opts.max_alpha * part.alpha * clamp01(age / alpha_in);
            self.surface.draw(DrawCmd::Polyline {
                points: part.trail.iter().copied().collect(),
                width: part.line_width,
                head: Hsla::new(part.hue, 0.80, 0.95, a).to_rgba8(),
                tail: Hsla::new(part.hue, 0.70, 0.90, a * 0.45).to_rgba8(),
                glow: self.opts.glow_blur,
            });
        }
    }

    /// Mean distance of particles from the ring centre, in ring radii.
    pub fn mean_radius_ratio(&self) -> Option<f64> {
        if self.particles.is_empty() {
            return None;
        }
        let (center, base_r) = self.ring_geometry();
        let sum: f64 = self
            .particles
            .iter()
            .map(|p| (p.pos - center).hypot() / base_r)
            .sum();
        Some(sum / self.particles.len() as f64)
    }
}

impl Effect for CircleFormation {
    fn key(&self) -> EffectKey {
        EffectKey::CircleFormation
    }

    fn apply(&mut self, t: f64) {
        self.last_t = t;
        let p = self.opts.phase.local(t);
        if p > 0.0005 && self.state == FormationState::Idle {
            self.state = FormationState::Bursting;
            self.frames.request();
            tracing::debug!(t, "ring burst started");
        }
    }

    fn reset(&mut self) {
        self.stop();
        self.last_t = 0.0;
    }

    /// The only way out of [`FormationState::Locked`]: clears particles and ends the loop.
    fn stop(&mut self) {
        if self.state != FormationState::Idle {
            tracing::debug!(state = ?self.state, "ring stopped");
        }
        self.state = FormationState::Idle;
        self.particles.clear();
        self.spawn_carry = 0.0;
        self.frames.cancel();
        self.surface.clear();
    }

    fn resize(&mut self, stage: &Stage) {
        if let Some(basin) = stage.rect_of(&self.opts.basin_selector) {
            self.basin = basin;
            self.surface
                .resize(basin.width(), basin.height(), stage.viewport().dpr());
        }
    }

    fn frame(&mut self, now_ms: f64) {
        if !self.frames.is_active() {
            return;
        }
        let dt = self.frames.advance(now_ms);
        self.step(dt, now_ms);
        self.draw(now_ms);
    }

    fn is_looping(&self) -> bool {
        self.frames.is_active()
    }

    fn surface(&self) -> Option<&Surface> {
        Some(&self.surface)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "state": self.state,
            "particles": self.particles.len(),
            "lockT": self.lock_t(),
            "spawnCarry": self.spawn_carry,
            "meanRadius": self.mean_radius_ratio(),
        })
    }

    fn listener(&self) -> Option<ListenerId> {
        Some(self.listener)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/circle_formation.rs"]
mod tests;
