use crate::animation::ease::Ease;
use crate::foundation::error::{PensieveError, PensieveResult};

/// Map global timeline `t` into the local progress of the window `[from, to]`.
///
/// Saturates to 0 at or before `from` and to 1 at or after `to`. A degenerate window
/// (`from >= to`) behaves as a step at `from`. NaN `t` maps to 0.
pub fn phase_t(t: f64, from: f64, to: f64) -> f64 {
    if t.is_nan() || t <= from {
        return 0.0;
    }
    if t >= to {
        return 1.0;
    }
    let span = to - from;
    if span.is_nan() || span <= 0.0 {
        return 1.0;
    }
    ((t - from) / span).clamp(0.0, 1.0)
}

/// A validated sub-window of the ceremony timeline.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PhaseWindow {
    pub from: f64,
    pub to: f64,
}

impl PhaseWindow {
    /// The whole timeline.
    pub const FULL: PhaseWindow = PhaseWindow { from: 0.0, to: 1.0 };

    pub fn new(from: f64, to: f64) -> PensieveResult<Self> {
        let w = Self { from, to };
        w.validate()?;
        Ok(w)
    }

    /// Enforce `0 <= from < to <= 1`. Every module constructor calls this.
    pub fn validate(&self) -> PensieveResult<()> {
        if !(self.from.is_finite() && self.to.is_finite()) {
            return Err(PensieveError::validation(format!(
                "phase window [{}, {}] must be finite",
                self.from, self.to
            )));
        }
        if self.from < 0.0 || self.to > 1.0 {
            return Err(PensieveError::validation(format!(
                "phase window [{}, {}] must lie inside [0, 1]",
                self.from, self.to
            )));
        }
        if self.from >= self.to {
            return Err(PensieveError::validation(format!(
                "phase window [{}, {}] must have from < to",
                self.from, self.to
            )));
        }
        Ok(())
    }

    pub fn local(&self, t: f64) -> f64 {
        phase_t(t, self.from, self.to)
    }

    pub fn eased(&self, t: f64, ease: Ease) -> f64 {
        ease.apply(self.local(t))
    }

    pub fn contains(&self, t: f64) -> bool {
        self.from <= t && t <= self.to
    }

    pub fn overlaps(&self, other: &PhaseWindow) -> bool {
        self.from < other.to && other.from < self.to
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/phase.rs"]
mod tests;
