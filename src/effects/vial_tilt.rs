use crate::animation::phase::PhaseWindow;
use crate::effects::{Effect, EffectKey};
use crate::foundation::core::{Affine, Point, Vec2};
use crate::foundation::error::PensieveResult;
use crate::host::stage::Stage;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VialTiltOptions {
    pub tilt_phase: PhaseWindow,
    /// Rotation at the end of the window. Negative tilts left.
    pub max_tilt_deg: f64,
    /// Vertical offset at the end of the window.
    pub lift_px: f64,
}

impl Default for VialTiltOptions {
    fn default() -> Self {
        Self {
            tilt_phase: PhaseWindow { from: 0.0, to: 0.18 },
            max_tilt_deg: -22.0,
            lift_px: -2.0,
        }
    }
}

/// Rig transform of the triggering vial.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TiltPose {
    pub tilt_deg: f64,
    pub lift_px: f64,
}

impl TiltPose {
    pub fn css(&self) -> String {
        if *self == Self::default() {
            return String::new();
        }
        format!(
            "translateY({}px) rotate({}deg)",
            self.lift_px, self.tilt_deg
        )
    }

    /// The pose as a transform rotating around `pivot`, then lifting.
    pub fn affine(&self, pivot: Point) -> Affine {
        Affine::translate(Vec2::new(0.0, self.lift_px))
            * Affine::rotate_about(self.tilt_deg.to_radians(), pivot)
    }
}

/// Tilts the vial that started the ceremony.
///
/// The module is created once and bound to a vial per run. While unbound, `apply` does
/// nothing.
#[derive(Clone, Debug)]
pub struct VialTilt {
    opts: VialTiltOptions,
    vial: Option<String>,
    pivot: Point,
    pose: TiltPose,
}

impl VialTilt {
    pub fn create(opts: VialTiltOptions) -> PensieveResult<Self> {
        opts.tilt_phase.validate()?;
        Ok(Self {
            opts,
            vial: None,
            pivot: Point::ZERO,
            pose: TiltPose::default(),
        })
    }

    pub fn options(&self) -> &VialTiltOptions {
        &self.opts
    }

    /// Attach to the vial matched by `selector`. Returns `false` (and stays unbound) when
    /// the vial is not on the stage.
    pub fn bind(&mut self, stage: &Stage, selector: &str) -> bool {
        match stage.rect_of(selector) {
            Some(rect) => {
                self.vial = Some(selector.to_owned());
                self.pivot = rect.center();
                true
            }
            None => {
                self.vial = None;
                false
            }
        }
    }

    pub fn unbind(&mut self) {
        self.vial = None;
        self.pose = TiltPose::default();
    }

    pub fn vial(&self) -> Option<&str> {
        self.vial.as_deref()
    }

    pub fn pose(&self) -> TiltPose {
        self.pose
    }

    pub fn transform(&self) -> Affine {
        self.pose.affine(self.pivot)
    }

    /// Set the pose from local progress directly (used when the vial rests back).
    pub fn apply_local(&mut self, local: f64) {
        if self.vial.is_none() {
            return;
        }
        let local = crate::foundation::math::clamp01(local);
        self.pose = TiltPose {
            tilt_deg: self.opts.max_tilt_deg * local,
            lift_px: self.opts.lift_px * local,
        };
    }
}

impl Effect for VialTilt {
    fn key(&self) -> EffectKey {
        EffectKey::VialTilt
    }

    fn apply(&mut self, t: f64) {
        let local = self.opts.tilt_phase.local(t);
        self.apply_local(local);
    }

    fn reset(&mut self) {
        self.pose = TiltPose::default();
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "vial": self.vial,
            "pose": self.pose,
            "transform": self.pose.css(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/vial_tilt.rs"]
mod tests;
