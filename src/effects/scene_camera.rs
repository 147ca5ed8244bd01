use crate::animation::ease::{Ease, ease_opt};
use crate::animation::phase::PhaseWindow;
use crate::effects::{Effect, EffectKey};
use crate::foundation::error::PensieveResult;
use crate::foundation::math::clamp01;
use crate::host::stage::{ListenerId, Stage};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneCameraOptions {
    pub stack_selector: String,
    pub phase: PhaseWindow,
    pub easing: Option<Ease>,
    /// Travel distance in viewport heights.
    pub travel_screens: f64,
}

impl Default for SceneCameraOptions {
    fn default() -> Self {
        Self {
            stack_selector: "#scene-stack".to_owned(),
            phase: PhaseWindow { from: 0.12, to: 0.30 },
            easing: Some(Ease::InOutCubic),
            travel_screens: 1.0,
        }
    }
}

/// Scrolls the scene stack from the vial shelf down to the basin.
#[derive(Clone, Debug)]
pub struct SceneCamera {
    opts: SceneCameraOptions,
    listener: ListenerId,
    travel_px: f64,
    eased: f64,
    camera_y: f64,
}

impl SceneCamera {
    pub fn create(opts: SceneCameraOptions, stage: &mut Stage) -> PensieveResult<Option<Self>> {
        opts.phase.validate()?;
        if stage.query(&opts.stack_selector).is_none() {
            return Ok(None);
        }
        let listener = stage.listen_resize(EffectKey::SceneCamera.as_str());
        let mut camera = Self {
            opts,
            listener,
            travel_px: 0.0,
            eased: 0.0,
            camera_y: 0.0,
        };
        camera.recalc(stage);
        Ok(Some(camera))
    }

    fn recalc(&mut self, stage: &Stage) {
        self.travel_px = stage.viewport().height_px() * self.opts.travel_screens;
    }

    /// Set absolute progress `p` (not timeline `t`).
    pub fn apply_progress(&mut self, p: f64) {
        self.eased = ease_opt(self.opts.easing, clamp01(p));
        self.camera_y = self.travel_px * self.eased;
    }

    /// `p = 0` stays at the basin, `p = 1` is back at the vials.
    pub fn apply_reverse(&mut self, p: f64) {
        self.apply_progress(1.0 - clamp01(p));
    }

    pub fn camera_y(&self) -> f64 {
        self.camera_y
    }

    pub fn travel_px(&self) -> f64 {
        self.travel_px
    }

    /// Eased progress of the last update.
    pub fn progress(&self) -> f64 {
        self.eased
    }
}

impl Effect for SceneCamera {
    fn key(&self) -> EffectKey {
        EffectKey::SceneCamera
    }

    fn apply(&mut self, t: f64) {
        let local = self.opts.phase.local(t);
        self.apply_progress(local);
    }

    fn reset(&mut self) {
        self.eased = 0.0;
        self.camera_y = 0.0;
    }

    fn resize(&mut self, stage: &Stage) {
        self.recalc(stage);
        self.camera_y = self.travel_px * self.eased;
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "cameraY": self.camera_y,
            "travelPx": self.travel_px,
            "progress": self.eased,
        })
    }

    fn listener(&self) -> Option<ListenerId> {
        Some(self.listener)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/scene_camera.rs"]
mod tests;
