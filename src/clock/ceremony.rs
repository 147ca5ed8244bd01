use crate::animation::ease::{Ease, ease_opt};
use crate::foundation::math::clamp01;

/// One broadcast of the ceremony timeline.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockTick {
    /// Eased global progress in `[0, 1]`.
    pub t: f64,
    /// Linear progress in `[0, 1]`.
    pub raw_t: f64,
    /// Milliseconds since `start`.
    pub elapsed_ms: f64,
}

/// Clock options. `easing: None` broadcasts `t == raw_t`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClockConfig {
    pub total_duration_ms: f64,
    pub easing: Option<Ease>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            total_duration_ms: 3600.0,
            easing: Some(Ease::InOutCubic),
        }
    }
}

/// Receiver of clock broadcasts.
///
/// `on_update` runs once per frame while the clock runs; `on_end` runs exactly once per
/// completed run, after the final `on_update`.
pub trait ClockObserver {
    fn on_update(&mut self, tick: ClockTick);

    fn on_end(&mut self) {}
}

/// Closure adapter for [`ClockObserver`].
pub struct Callbacks<U, E> {
    pub on_update: U,
    pub on_end: E,
}

impl<U, E> ClockObserver for Callbacks<U, E>
where
    U: FnMut(ClockTick),
    E: FnMut(),
{
    fn on_update(&mut self, tick: ClockTick) {
        (self.on_update)(tick)
    }

    fn on_end(&mut self) {
        (self.on_end)()
    }
}

/// A single monotonic 0→1 timeline advanced at wall-clock rate.
///
/// The host owns the frame loop: after [`CeremonyClock::start`] it calls
/// [`CeremonyClock::frame`] with each animation-frame timestamp until the clock reports it
/// is no longer running.
#[derive(Clone, Debug)]
pub struct CeremonyClock {
    cfg: ClockConfig,
    start_ms: f64,
    running: bool,
}

impl CeremonyClock {
    pub fn create(cfg: ClockConfig) -> Self {
        Self {
            cfg,
            start_ms: 0.0,
            running: false,
        }
    }

    pub fn config(&self) -> &ClockConfig {
        &self.cfg
    }

    /// Begin a run at `now_ms`. No-op (returns `false`) while already running.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.start_ms = now_ms;
        tracing::debug!(
            duration_ms = self.cfg.total_duration_ms,
            start_ms = now_ms,
            "clock start"
        );
        true
    }

    /// Cancel the pending frame. `on_end` will not fire for this run.
    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!("clock stopped before completion");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Progress at `now_ms` for the current run, without side effects.
    pub fn sample(&self, now_ms: f64) -> ClockTick {
        let elapsed_ms = now_ms - self.start_ms;
        let dur = self.cfg.total_duration_ms;
        let raw_t = if dur.is_finite() && dur > 0.0 {
            clamp01(elapsed_ms / dur)
        } else {
            1.0
        };
        ClockTick {
            t: ease_opt(self.cfg.easing, raw_t),
            raw_t,
            elapsed_ms,
        }
    }

    /// Advance one animation frame.
    ///
    /// Returns the broadcast tick, or `None` when the clock is not running. When
    /// `raw_t` reaches 1 the clock stops itself and calls `on_end` after the final update.
    pub fn frame(&mut self, now_ms: f64, observer: &mut impl ClockObserver) -> Option<ClockTick> {
        if !self.running {
            return None;
        }
        let tick = self.sample(now_ms);
        observer.on_update(tick);

        if tick.raw_t >= 1.0 {
            self.running = false;
            tracing::debug!(elapsed_ms = tick.elapsed_ms, "clock end");
            observer.on_end();
        }
        Some(tick)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/ceremony.rs"]
mod tests;
