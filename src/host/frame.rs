/// Largest simulation step a self-driven loop integrates in one frame (tab resume guard).
pub const MAX_DT_SECS: f64 = 0.05;

/// The requestAnimationFrame chain of one self-driven effect.
///
/// While active, the host delivers every animation frame to the owning effect. The loop
/// keeps the previous timestamp so each frame can integrate a clamped `dt`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameLoop {
    active: bool,
    last_ms: Option<f64>,
}

impl FrameLoop {
    /// Schedule frames. Returns `false` if the loop was already running.
    pub fn request(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.last_ms = None;
        true
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.last_ms = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds since the previous frame, in `[0, MAX_DT_SECS]`. The first frame after a
    /// request yields 0.
    pub fn advance(&mut self, now_ms: f64) -> f64 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0).clamp(0.0, MAX_DT_SECS),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        if dt.is_nan() { 0.0 } else { dt }
    }
}

/// Simulated monotonic frame clock for headless hosts.
#[derive(Clone, Copy, Debug)]
pub struct FrameDriver {
    now_ms: f64,
    step_ms: f64,
}

impl FrameDriver {
    pub fn new(fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 60.0 };
        Self {
            now_ms: 0.0,
            step_ms: 1000.0 / fps,
        }
    }

    pub fn starting_at(mut self, now_ms: f64) -> Self {
        self.now_ms = now_ms;
        self
    }

    pub fn now(&self) -> f64 {
        self.now_ms
    }

    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    /// Advance one frame and return its timestamp.
    pub fn next_frame(&mut self) -> f64 {
        self.now_ms += self.step_ms;
        self.now_ms
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/frame.rs"]
mod tests;
