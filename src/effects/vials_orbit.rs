//! The vial shelf turning slowly on a shared ellipse.

use std::f64::consts::TAU;

use crate::effects::{Effect, EffectKey};
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::PensieveResult;
use crate::host::frame::FrameLoop;
use crate::host::stage::{ListenerId, Stage};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VialsOrbitOptions {
    pub selector: String,
    pub vial_selector: String,
    pub radius_x_factor: f64,
    pub radius_y_factor: f64,
    /// Turns per second.
    pub base_speed: f64,
    pub scale_min: f64,
    pub scale_max: f64,
}

impl Default for VialsOrbitOptions {
    fn default() -> Self {
        Self {
            selector: "#vials-orbit".to_owned(),
            vial_selector: ".vials__vial".to_owned(),
            radius_x_factor: 0.34,
            radius_y_factor: 0.18,
            base_speed: 0.12,
            scale_min: 0.72,
            scale_max: 1.06,
        }
    }
}

/// Where one vial sits on the ellipse this frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VialPlacement {
    pub vial: String,
    /// Offset of the orbit start, in turns.
    pub phase: f64,
    /// Centre in orbit-container coordinates.
    pub center: Point,
    /// 0 at the back of the ellipse, 1 at the front.
    pub depth: f64,
    pub scale: f64,
    pub z_index: i32,
}

impl VialPlacement {
    /// Outer transform: position only.
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) translate(-50%, -50%)",
            self.center.x, self.center.y
        )
    }

    /// Inner transform: depth scale only.
    pub fn css_inner_transform(&self) -> String {
        format!("scale({})", self.scale)
    }
}

#[derive(Clone, Debug)]
pub struct VialsOrbit {
    opts: VialsOrbitOptions,
    listener: ListenerId,
    bounds: Rect,
    frames: FrameLoop,
    placements: Vec<VialPlacement>,
}

impl VialsOrbit {
    pub fn create(opts: VialsOrbitOptions, stage: &mut Stage) -> PensieveResult<Option<Self>> {
        let Some(bounds) = stage.rect_of(&opts.selector) else {
            return Ok(None);
        };
        let placements: Vec<VialPlacement> = stage
            .query_all(&opts.vial_selector)
            .filter_map(|el| {
                let id = el.id.as_ref()?;
                let phase = el
                    .data
                    .get("phase")
                    .and_then(|p| p.parse::<f64>().ok())
                    .filter(|p| p.is_finite())
                    .unwrap_or(0.0)
                    % 1.0;
                Some(VialPlacement {
                    vial: format!("#{id}"),
                    phase,
                    center: Point::ZERO,
                    depth: 0.0,
                    scale: 1.0,
                    z_index: 10,
                })
            })
            .collect();
        if placements.is_empty() {
            return Ok(None);
        }

        let listener = stage.listen_resize(EffectKey::VialsOrbit.as_str());
        let mut orbit = Self {
            opts,
            listener,
            bounds,
            frames: FrameLoop::default(),
            placements,
        };
        orbit.frames.request();
        orbit.place(0.0);
        Ok(Some(orbit))
    }

    pub fn placements(&self) -> &[VialPlacement] {
        &self.placements
    }

    pub fn placement(&self, vial: &str) -> Option<&VialPlacement> {
        self.placements.iter().find(|p| p.vial == vial)
    }

    fn place(&mut self, now_ms: f64) {
        let o = &self.opts;
        let global_angle = now_ms / 1000.0 * o.base_speed * TAU;
        let w = self.bounds.width();
        let h = self.bounds.height();
        let (cx, cy) = (w / 2.0, h * 0.42);
        let (rx, ry) = (w * o.radius_x_factor, h * o.radius_y_factor);

        for p in &mut self.placements {
            let angle = global_angle + p.phase * TAU;
            p.center = Point::new(cx + angle.cos() * rx, cy + angle.sin() * ry);
            p.depth = (angle.sin() + 1.0) / 2.0;
            p.scale = o.scale_min + p.depth * (o.scale_max - o.scale_min);
            p.z_index = 10 + (p.depth * 10.0).round() as i32;
        }
    }
}

impl Effect for VialsOrbit {
    fn key(&self) -> EffectKey {
        EffectKey::VialsOrbit
    }

    /// Free-running; the timeline does not steer the shelf.
    fn apply(&mut self, _t: f64) {}

    fn reset(&mut self) {}

    fn stop(&mut self) {
        self.frames.cancel();
    }

    fn resize(&mut self, stage: &Stage) {
        if let Some(bounds) = stage.rect_of(&self.opts.selector) {
            self.bounds = bounds;
        }
    }

    fn frame(&mut self, now_ms: f64) {
        if !self.frames.is_active() {
            return;
        }
        self.frames.advance(now_ms);
        self.place(now_ms);
    }

    fn is_looping(&self) -> bool {
        self.frames.is_active()
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(&self.placements).unwrap_or(serde_json::Value::Null)
    }

    fn listener(&self) -> Option<ListenerId> {
        Some(self.listener)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/vials_orbit.rs"]
mod tests;
