use std::f64::consts::PI;

use crate::animation::phase::PhaseWindow;
use crate::effects::{Effect, EffectKey, Signal};
use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::PensieveResult;
use crate::foundation::math::coerce_unit;
use crate::host::frame::FrameLoop;
use crate::host::stage::{ListenerId, Stage};
use crate::host::surface::{DrawCmd, Surface};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasinIncomingOptions {
    pub canvas_id: String,
    pub max_alpha: f64,
    pub line_count: u32,
    pub jitter: f64,
    /// Window over which threads fall in. `None` leaves the level to `set_incoming`.
    pub phase: Option<PhaseWindow>,
}

impl Default for BasinIncomingOptions {
    fn default() -> Self {
        Self {
            canvas_id: "basin-incoming".to_owned(),
            max_alpha: 0.9,
            line_count: 18,
            jitter: 10.0,
            phase: None,
        }
    }
}

/// Threadfall: thin silvery lines dropping into the basin.
#[derive(Clone, Debug)]
pub struct BasinIncoming {
    opts: BasinIncomingOptions,
    surface: Surface,
    listener: ListenerId,
    frames: FrameLoop,
    incoming: f64,
    wake: f64,
}

impl BasinIncoming {
    pub fn create(opts: BasinIncomingOptions, stage: &mut Stage) -> PensieveResult<Option<Self>> {
        if let Some(phase) = &opts.phase {
            phase.validate()?;
        }
        let Some(surface) = stage.claim_canvas(&opts.canvas_id) else {
            return Ok(None);
        };
        let listener = stage.listen_resize(EffectKey::BasinIncoming.as_str());
        Ok(Some(Self {
            opts,
            surface,
            listener,
            frames: FrameLoop::default(),
            incoming: 0.0,
            wake: 0.0,
        }))
    }

    pub fn set_incoming(&mut self, p: f64) {
        self.incoming = coerce_unit(p);
        if self.incoming > 0.0 {
            self.frames.request();
        }
    }

    pub fn set_wake(&mut self, p: f64) {
        self.wake = coerce_unit(p);
    }

    pub fn incoming(&self) -> f64 {
        self.incoming
    }

    /// Drop the level to zero, wipe the canvas and cancel the loop.
    pub fn clear(&mut self) {
        self.incoming = 0.0;
        self.surface.clear();
        self.frames.cancel();
    }

    fn draw(&mut self, time_ms: f64) {
        let p = self.incoming;
        self.surface.clear();
        if p <= 0.001 {
            return;
        }
        let (w, h) = self.surface.css_size();
        let center_x = w * 0.5;
        let basin_y = h * 0.60;
        let alpha = self.opts.max_alpha * p * (0.65 + 0.35 * self.wake);
        let color = Rgba8::new(200, 220, 255, 255).with_alpha((0.18 + 0.35 * p) * alpha);
        let glow = (8.0 + 12.0 * self.wake) * p;

        for i in 0..self.opts.line_count {
            let i = f64::from(i);
            let phase = (time_ms / 1000.0) * 1.2 + i * 0.35;
            let x = center_x + phase.sin() * (self.opts.jitter * (0.3 + 0.7 * p));
            let drift = (phase * 1.6).cos() * 6.0;
            let y0 = (i * 6.0) * (1.0 - p);
            let y1 = basin_y + drift;
            self.surface.draw(DrawCmd::Line {
                from: Point::new(x, y0),
                to: Point::new(x, y1),
                width: 1.0,
                color,
                glow,
            });
        }
    }
}

impl Effect for BasinIncoming {
    fn key(&self) -> EffectKey {
        EffectKey::BasinIncoming
    }

    fn apply(&mut self, t: f64) {
        let Some(phase) = self.opts.phase else {
            return;
        };
        let local = phase.local(t);
        if local <= 0.0 {
            return;
        }
        if local >= 1.0 {
            if self.frames.is_active() {
                self.clear();
            }
            return;
        }
        self.set_incoming((PI * local).sin());
    }

    fn reset(&mut self) {
        self.clear();
        self.wake = 0.0;
    }

    fn stop(&mut self) {
        self.frames.cancel();
    }

    fn resize(&mut self, stage: &Stage) {
        if let Some(rect) = stage.canvas_rect(&self.opts.canvas_id) {
            self.surface
                .resize(rect.width(), rect.height(), stage.viewport().dpr());
        }
    }

    fn frame(&mut self, now_ms: f64) {
        if !self.frames.is_active() {
            return;
        }
        self.frames.advance(now_ms);
        self.draw(now_ms);
    }

    fn is_looping(&self) -> bool {
        self.frames.is_active()
    }

    fn accept(&mut self, signal: &Signal) {
        if let Signal::Wake { level } = signal {
            self.set_wake(*level);
        }
    }

    fn surface(&self) -> Option<&Surface> {
        Some(&self.surface)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "incoming": self.incoming,
            "wake": self.wake,
            "running": self.frames.is_active(),
            "lines": self.surface.commands().len(),
        })
    }

    fn listener(&self) -> Option<ListenerId> {
        Some(self.listener)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/basin_incoming.rs"]
mod tests;
