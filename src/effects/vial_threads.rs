//! Memory threads swirling inside each vial.
//!
//! Wisps live in the vial's view box (70 × 190 units) and are scaled onto the vial's
//! canvas. While a vial pours, its wisps are pulled toward the neck; with egress
//! enabled, a wisp reaching the neck leaves as an [`Signal::Egress`] in world
//! coordinates and a fresh one takes its place low in the glass.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::animation::ease::{Ease, ease_opt};
use crate::animation::phase::PhaseWindow;
use crate::effects::{EgressPayload, Effect, EffectKey, Signal};
use crate::foundation::core::{Hsla, Point, Rect};
use crate::foundation::error::PensieveResult;
use crate::foundation::math::{Range, Rng64, clamp01, coerce_unit, lerp_angle};
use crate::host::frame::FrameLoop;
use crate::host::stage::{ListenerId, Stage};
use crate::host::surface::{DrawCmd, Surface};

/// Heading of the vial mouth in view space.
const NECK_ANGLE: f64 = -FRAC_PI_2;
const FOLLOW_STRENGTH: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewBox {
    pub width: f64,
    pub height: f64,
}

/// The glass interior, in view units.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InnerBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl InnerBox {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    fn clamp(&self, p: &mut Point) {
        p.x = p.x.max(self.left + 1.5).min(self.right - 1.5);
        p.y = p.y.max(self.top + 2.5).min(self.bottom - 2.5);
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PourOptions {
    /// Upper bound of the per-wisp lag before it joins the pour.
    pub offset_max: f64,
    /// Drift toward the neck at full pour, view units/s.
    pub gravity: f64,
    /// Per-frame steering toward the neck at full pour.
    pub steer: f64,
    /// Extra speed fraction at full pour.
    pub speed_mul: f64,
    /// How much of the turn noise a full pour suppresses.
    pub pour_noise_dampen: f64,
}

impl Default for PourOptions {
    fn default() -> Self {
        Self {
            offset_max: 1.0,
            gravity: 14.0,
            steer: 0.03,
            speed_mul: 0.18,
            pour_noise_dampen: 0.45,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EgressOptions {
    pub enabled: bool,
    /// Depth of the neck band, as a fraction of the inner height.
    pub emit_zone: f64,
    /// Per vial.
    pub max_per_frame: u32,
    /// Minimum gap between two emissions of the same wisp.
    pub cooldown_ms: f64,
}

impl Default for EgressOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            emit_zone: 0.10,
            max_per_frame: 4,
            cooldown_ms: 90.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VialThreadsOptions {
    pub selector: String,
    pub view: ViewBox,
    pub inner: InnerBox,

    pub wisp_count: u32,
    pub segment_count: Range,
    /// Joint spacing as a fraction of the inner height.
    pub segment_length_factor: f64,

    pub speed: Range,
    pub base_turn_speed: Range,
    pub noise_strength: Range,

    pub base_alpha: Range,
    pub line_width: Range,
    pub hue: Range,
    pub glow_blur: f64,

    pub pour: PourOptions,
    pub egress: EgressOptions,
    /// Window that pours the bound vial. `None` leaves pouring to `set_pour`.
    pub pour_phase: Option<PhaseWindow>,
    pub pour_easing: Option<Ease>,

    pub seed: u64,
}

impl Default for VialThreadsOptions {
    fn default() -> Self {
        let view = ViewBox {
            width: 70.0,
            height: 190.0,
        };
        Self {
            selector: ".vial".to_owned(),
            view,
            inner: InnerBox {
                left: view.width * 0.33,
                right: view.width * 0.67,
                top: view.height * 0.24,
                bottom: view.height * 0.85,
            },
            wisp_count: 5,
            segment_count: Range::new(10.0, 14.0),
            segment_length_factor: 0.015,
            speed: Range::new(10.0, 20.0),
            base_turn_speed: Range::new(0.6, 0.7),
            noise_strength: Range::new(0.8, 1.3),
            base_alpha: Range::new(0.45, 0.7),
            line_width: Range::new(0.9, 1.5),
            hue: Range::new(200.0, 225.0),
            glow_blur: 7.0,
            pour: PourOptions::default(),
            egress: EgressOptions::default(),
            pour_phase: None,
            pour_easing: Some(Ease::OutCubic),
            seed: 0x7e1a_d5,
        }
    }
}

#[derive(Clone, Debug)]
struct ThreadWisp {
    points: Vec<Point>,
    angle: f64,
    base_turn_speed: f64,
    noise_strength: f64,
    speed: f64,
    base_alpha: f64,
    line_width: f64,
    hue: f64,
    pour_offset: f64,
    last_emit_ms: Option<f64>,
}

impl ThreadWisp {
    fn head(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }

    /// This wisp's share of the vial's pour; lagging wisps join later.
    fn local_pour(&self, pour: f64) -> f64 {
        clamp01(pour * (1.0 + self.pour_offset) - self.pour_offset)
    }

    /// Restack the body at `start`, hanging downward.
    fn place(&mut self, start: Point, segment_length: f64) {
        for (j, p) in self.points.iter_mut().enumerate() {
            *p = Point::new(start.x, start.y + j as f64 * segment_length * 0.8);
        }
    }
}

#[derive(Clone, Debug)]
struct VialRig {
    selector: String,
    rect: Rect,
    surface: Surface,
    wisps: Vec<ThreadWisp>,
    pour: f64,
    emitted: u64,
    rng: Rng64,
}

impl VialRig {
    /// Uniform view → CSS scale; the drawn height follows the width.
    fn scale(&self, view: &ViewBox) -> f64 {
        self.rect.width() / view.width
    }
}

#[derive(Clone, Debug)]
pub struct VialThreads {
    opts: VialThreadsOptions,
    vials: Vec<VialRig>,
    listener: ListenerId,
    frames: FrameLoop,
    bound: Option<String>,
    pending: Vec<Signal>,
}

impl VialThreads {
    /// Sets up every vial matching the selector that carries a threads canvas
    /// (`data-threads`). `None` when no vial qualifies.
    pub fn create(opts: VialThreadsOptions, stage: &mut Stage) -> PensieveResult<Option<Self>> {
        if let Some(phase) = &opts.pour_phase {
            phase.validate()?;
        }

        let targets: Vec<(String, Rect, String)> = stage
            .query_all(&opts.selector)
            .filter_map(|el| {
                let id = el.id.as_ref()?;
                let canvas = el.data.get("threads")?;
                Some((format!("#{id}"), el.rect, canvas.clone()))
            })
            .collect();

        let mut rng = Rng64::new(opts.seed);
        let mut vials = Vec::with_capacity(targets.len());
        for (selector, rect, canvas) in targets {
            let Some(surface) = stage.claim_canvas(&canvas) else {
                continue;
            };
            let mut vial_rng = rng.fork();
            let wisps = (0..opts.wisp_count)
                .map(|_| spawn_wisp(&opts, &mut vial_rng))
                .collect();
            vials.push(VialRig {
                selector,
                rect,
                surface,
                wisps,
                pour: 0.0,
                emitted: 0,
                rng: vial_rng,
            });
        }
        if vials.is_empty() {
            return Ok(None);
        }

        let listener = stage.listen_resize(EffectKey::VialThreads.as_str());
        let mut threads = Self {
            opts,
            vials,
            listener,
            frames: FrameLoop::default(),
            bound: None,
            pending: Vec::new(),
        };
        threads.resize(stage);
        threads.frames.request();
        tracing::debug!(vials = threads.vials.len(), "vial threads running");
        Ok(Some(threads))
    }

    /// Choose the vial the pour window drives. `false` if it has no threads.
    pub fn bind(&mut self, selector: &str) -> bool {
        if self.vials.iter().any(|v| v.selector == selector) {
            self.bound = Some(selector.to_owned());
            true
        } else {
            false
        }
    }

    pub fn unbind(&mut self) {
        self.bound = None;
    }

    pub fn set_pour(&mut self, selector: &str, p: f64) -> bool {
        match self.vials.iter_mut().find(|v| v.selector == selector) {
            Some(vial) => {
                vial.pour = coerce_unit(p);
                true
            }
            None => false,
        }
    }

    pub fn pour(&self, selector: &str) -> Option<f64> {
        self.vial(selector).map(|v| v.pour)
    }

    pub fn vial_count(&self) -> usize {
        self.vials.len()
    }

    pub fn wisp_count(&self, selector: &str) -> Option<usize> {
        self.vial(selector).map(|v| v.wisps.len())
    }

    pub fn surface_of(&self, selector: &str) -> Option<&Surface> {
        self.vial(selector).map(|v| &v.surface)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.vials.iter().map(|v| &v.surface)
    }

    /// Whether every joint of every wisp is inside the glass.
    pub fn contained(&self) -> bool {
        let inner = &self.opts.inner;
        self.vials.iter().flat_map(|v| &v.wisps).all(|w| {
            w.points.iter().all(|p| {
                p.x >= inner.left && p.x <= inner.right && p.y >= inner.top && p.y <= inner.bottom
            })
        })
    }

    fn vial(&self, selector: &str) -> Option<&VialRig> {
        self.vials.iter().find(|v| v.selector == selector)
    }

    fn step(&mut self, dt: f64, now_ms: f64) {
        let o = &self.opts;
        let inner = o.inner;
        let t_sec = now_ms / 1000.0;
        let segment_length = inner.height() * o.segment_length_factor;
        let emit_line = inner.top + inner.height() * o.egress.emit_zone;

        for vial in &mut self.vials {
            let scale = vial.scale(&o.view);
            let mut budget = o.egress.max_per_frame;

            for wisp in &mut vial.wisps {
                let lp = wisp.local_pour(vial.pour);
                let head = wisp.head();

                let turn_noise = ((t_sec * wisp.base_turn_speed + head.x * 0.1 + head.y * 0.07)
                    .sin()
                    + (vial.rng.next_f64_01() - 0.5) * 0.6)
                    * 0.5
                    * wisp.noise_strength
                    * (1.0 - o.pour.pour_noise_dampen * lp);
                wisp.angle += turn_noise * dt;
                if lp > 0.0 {
                    wisp.angle = lerp_angle(wisp.angle, NECK_ANGLE, o.pour.steer * lp);
                }

                let speed = wisp.speed * (1.0 + o.pour.speed_mul * lp);
                let mut head = head;
                head.x += wisp.angle.cos() * speed * dt;
                head.y += wisp.angle.sin() * speed * dt - o.pour.gravity * lp * dt;

                let cooled = wisp
                    .last_emit_ms
                    .is_none_or(|last| now_ms - last >= o.egress.cooldown_ms);
                if o.egress.enabled && lp > 0.0 && head.y <= emit_line && cooled && budget > 0 {
                    budget -= 1;
                    vial.emitted += 1;
                    wisp.last_emit_ms = Some(now_ms);
                    self.pending.push(Signal::Egress(EgressPayload {
                        x: vial.rect.x0 + head.x * scale,
                        y: vial.rect.y0 + head.y * scale,
                        angle: wisp.angle,
                        speed: speed * scale,
                        local_pour: lp,
                        hue: wisp.hue,
                        line_width: wisp.line_width,
                        alpha: wisp.base_alpha,
                        noise_strength: wisp.noise_strength,
                        base_turn_speed: wisp.base_turn_speed,
                    }));
                    let start = Point::new(
                        inner.left + 4.0 + vial.rng.next_f64_01() * (inner.width() - 8.0),
                        inner.top + inner.height() * vial.rng.range(0.5, 0.8),
                    );
                    wisp.place(start, segment_length);
                    wisp.angle = vial.rng.angle();
                    continue;
                }

                // Bounce off the glass.
                let mut bounced = false;
                if head.x < inner.left + 2.0 {
                    head.x = inner.left + 2.0;
                    wisp.angle = PI - wisp.angle;
                    bounced = true;
                } else if head.x > inner.right - 2.0 {
                    head.x = inner.right - 2.0;
                    wisp.angle = PI - wisp.angle;
                    bounced = true;
                }
                if head.y < inner.top + 3.0 {
                    head.y = inner.top + 3.0;
                    wisp.angle = -wisp.angle;
                    bounced = true;
                } else if head.y > inner.bottom - 3.0 {
                    head.y = inner.bottom - 3.0;
                    wisp.angle = -wisp.angle;
                    bounced = true;
                }
                if bounced {
                    wisp.angle += (vial.rng.next_f64_01() - 0.5) * 0.6;
                }
                inner.clamp(&mut head);
                if let Some(first) = wisp.points.first_mut() {
                    *first = head;
                }

                // The body trails the head at a fixed joint spacing.
                for i in 1..wisp.points.len() {
                    let prev = wisp.points[i - 1];
                    let curr = &mut wisp.points[i];
                    let d = *curr - prev;
                    let dist = match d.hypot() {
                        x if x > 0.0 => x,
                        _ => 0.0001,
                    };
                    let desired = prev + d * (segment_length / dist);
                    *curr += (desired - *curr) * (FOLLOW_STRENGTH * dt);
                    inner.clamp(curr);
                }
            }
        }
    }

    fn draw(&mut self) {
        let view = self.opts.view;
        let glow = self.opts.glow_blur;
        for vial in &mut self.vials {
            let scale = vial.scale(&view);
            vial.surface.clear();
            for wisp in &vial.wisps {
                vial.surface.draw(DrawCmd::Polyline {
                    points: wisp
                        .points
                        .iter()
                        .map(|p| Point::new(p.x * scale, p.y * scale))
                        .collect(),
                    width: wisp.line_width,
                    head: Hsla::new(wisp.hue, 0.80, 0.95, wisp.base_alpha).to_rgba8(),
                    tail: Hsla::new(wisp.hue, 0.70, 0.90, wisp.base_alpha * 0.4).to_rgba8(),
                    glow,
                });
            }
        }
    }
}

fn spawn_wisp(o: &VialThreadsOptions, rng: &mut Rng64) -> ThreadWisp {
    let inner = &o.inner;
    let start = Point::new(
        inner.left + 4.0 + rng.next_f64_01() * (inner.width() - 8.0),
        inner.top + 4.0 + rng.next_f64_01() * (inner.height() - 8.0),
    );
    let segments = rng.range_inclusive(
        o.segment_count.min.max(1.0) as u32,
        o.segment_count.max.max(1.0) as u32,
    );
    let mut wisp = ThreadWisp {
        points: vec![start; segments as usize],
        angle: rng.angle(),
        base_turn_speed: o.base_turn_speed.sample(rng),
        noise_strength: o.noise_strength.sample(rng),
        speed: o.speed.sample(rng),
        base_alpha: o.base_alpha.sample(rng),
        line_width: o.line_width.sample(rng),
        hue: o.hue.sample(rng),
        pour_offset: rng.next_f64_01() * o.pour.offset_max.max(0.0),
        last_emit_ms: None,
    };
    wisp.place(start, inner.height() * o.segment_length_factor);
    wisp
}

impl Effect for VialThreads {
    fn key(&self) -> EffectKey {
        EffectKey::VialThreads
    }

    /// Pours the bound vial across `pourPhase`, if one is configured.
    fn apply(&mut self, t: f64) {
        let (Some(phase), Some(bound)) = (self.opts.pour_phase, self.bound.clone()) else {
            return;
        };
        let p = ease_opt(self.opts.pour_easing, phase.local(t));
        self.set_pour(&bound, p);
    }

    fn reset(&mut self) {
        for vial in &mut self.vials {
            vial.pour = 0.0;
        }
        self.bound = None;
        self.pending.clear();
    }

    fn stop(&mut self) {
        self.frames.cancel();
    }

    fn resize(&mut self, stage: &Stage) {
        let dpr = stage.viewport().dpr();
        let view = self.opts.view;
        for vial in &mut self.vials {
            if let Some(rect) = stage.rect_of(&vial.selector) {
                vial.rect = rect;
            }
            let w = vial.rect.width();
            vial.surface.resize(w, w * view.height / view.width, dpr);
        }
    }

    fn frame(&mut self, now_ms: f64) {
        if !self.frames.is_active() {
            return;
        }
        let dt = self.frames.advance(now_ms);
        self.step(dt, now_ms);
        self.draw();
    }

    fn is_looping(&self) -> bool {
        self.frames.is_active()
    }

    fn drain_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.pending)
    }

    fn surface(&self) -> Option<&Surface> {
        self.vials.first().map(|v| &v.surface)
    }

    fn snapshot(&self) -> serde_json::Value {
        let vials = self
            .vials
            .iter()
            .map(|v| {
                serde_json::json!({
                    "vial": v.selector,
                    "pour": v.pour,
                    "wisps": v.wisps.len(),
                    "emitted": v.emitted,
                })
            })
            .collect::<Vec<_>>();
        serde_json::json!({ "bound": self.bound, "vials": vials })
    }

    /// Gives back every vial's canvas, not just the first.
    fn destroy(&mut self, stage: &mut Stage) {
        self.stop();
        stage.unlisten(self.listener);
        for vial in &self.vials {
            stage.release_canvas(vial.surface.id());
        }
    }

    fn listener(&self) -> Option<ListenerId> {
        Some(self.listener)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/vial_threads.rs"]
mod tests;
