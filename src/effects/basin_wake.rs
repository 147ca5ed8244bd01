use crate::animation::ease::{Ease, ease_opt};
use crate::animation::phase::PhaseWindow;
use crate::effects::{Effect, EffectKey, Signal};
use crate::foundation::error::PensieveResult;
use crate::host::stage::Stage;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasinWakeOptions {
    pub basin_selector: String,
    pub phase: PhaseWindow,
    pub easing: Option<Ease>,
}

impl Default for BasinWakeOptions {
    fn default() -> Self {
        Self {
            basin_selector: "#scene-basin".to_owned(),
            phase: PhaseWindow { from: 0.18, to: 0.35 },
            easing: Some(Ease::InOutCubic),
        }
    }
}

/// Produces the basin's wake level (`--wake`) and broadcasts it to the water.
#[derive(Clone, Debug)]
pub struct BasinWake {
    opts: BasinWakeOptions,
    wake: f64,
    pending: Vec<Signal>,
}

impl BasinWake {
    pub fn create(opts: BasinWakeOptions, stage: &Stage) -> PensieveResult<Option<Self>> {
        opts.phase.validate()?;
        if stage.query(&opts.basin_selector).is_none() {
            return Ok(None);
        }
        Ok(Some(Self {
            opts,
            wake: 0.0,
            pending: Vec::new(),
        }))
    }

    pub fn wake(&self) -> f64 {
        self.wake
    }

    fn emit(&mut self, level: f64) {
        self.wake = level;
        // Only the latest level matters to consumers.
        self.pending.retain(|s| !matches!(s, Signal::Wake { .. }));
        self.pending.push(Signal::Wake { level });
    }
}

impl Effect for BasinWake {
    fn key(&self) -> EffectKey {
        EffectKey::BasinWake
    }

    fn apply(&mut self, t: f64) {
        let local = self.opts.phase.local(t);
        let p = ease_opt(self.opts.easing, local);
        self.emit(p);
    }

    fn reset(&mut self) {
        self.emit(0.0);
    }

    fn drain_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.pending)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({ "wake": self.wake })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/basin_wake.rs"]
mod tests;
