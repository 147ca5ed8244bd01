use crate::animation::phase::PhaseWindow;
use crate::effects::{Effect, EffectKey, Signal};
use crate::foundation::error::{PensieveError, PensieveResult};
use crate::host::stage::Stage;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasinVisibilityOptions {
    pub scene_selector: String,
    pub phase: PhaseWindow,
    /// Local progress at which the basin is shown.
    pub show_at: f64,
    pub class_name: String,
}

impl Default for BasinVisibilityOptions {
    fn default() -> Self {
        Self {
            scene_selector: ".scene".to_owned(),
            phase: PhaseWindow { from: 0.12, to: 0.30 },
            show_at: 0.35,
            class_name: "basin-visible".to_owned(),
        }
    }
}

/// One-shot reveal of the basin layer.
#[derive(Clone, Debug)]
pub struct BasinVisibility {
    opts: BasinVisibilityOptions,
    shown: bool,
    pending: Vec<Signal>,
}

impl BasinVisibility {
    pub fn create(opts: BasinVisibilityOptions, stage: &Stage) -> PensieveResult<Option<Self>> {
        opts.phase.validate()?;
        if !opts.show_at.is_finite() {
            return Err(PensieveError::validation("showAt must be finite"));
        }
        if stage.query(&opts.scene_selector).is_none() {
            return Ok(None);
        }
        Ok(Some(Self {
            opts,
            shown: false,
            pending: Vec::new(),
        }))
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    fn signal(&self, shown: bool) -> Signal {
        Signal::Visibility {
            selector: self.opts.scene_selector.clone(),
            class: self.opts.class_name.clone(),
            shown,
        }
    }
}

impl Effect for BasinVisibility {
    fn key(&self) -> EffectKey {
        EffectKey::BasinVisibility
    }

    fn apply(&mut self, t: f64) {
        let local = self.opts.phase.local(t);
        if !self.shown && local >= self.opts.show_at {
            self.shown = true;
            tracing::debug!(t, "basin shown");
            let s = self.signal(true);
            self.pending.push(s);
        }
    }

    fn reset(&mut self) {
        if self.shown {
            let s = self.signal(false);
            self.pending.push(s);
        }
        self.shown = false;
    }

    fn drain_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.pending)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "shown": self.shown,
            "className": self.opts.class_name,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/basin_visibility.rs"]
mod tests;
