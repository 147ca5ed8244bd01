use std::f64::consts::{PI, TAU};

/// Clamp into `[0, 1]`. NaN maps to 0 so it never leaks into render math.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Soft setter coercion for continuously resampled visual parameters.
pub fn coerce_unit(x: f64) -> f64 {
    if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Move angle `a` toward `b` by fraction `t` along the wrapped difference.
pub fn lerp_angle(a: f64, b: f64, t: f64) -> f64 {
    // `%` truncates toward zero, same as the remainder the steering was tuned against.
    let diff = ((b - a + PI) % TAU) - PI;
    a + diff * t
}

/// Inclusive float range, used for `{ min, max }` style options.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn sample(self, rng: &mut Rng64) -> f64 {
        rng.range(self.min, self.max)
    }

    pub fn mix(self, k: f64) -> f64 {
        lerp(self.min, self.max, k)
    }
}

/// Deterministic SplitMix64 generator. Effects take a seed so runs are reproducible.
#[derive(Clone, Copy, Debug)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)` with 53 bits of precision.
    pub fn next_f64_01(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }

    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64_01() * (max - min)
    }

    /// Uniform integer in `[min, max]` (inclusive).
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        let span = u64::from(max - min) + 1;
        min + (self.next_u64() % span) as u32
    }

    pub fn angle(&mut self) -> f64 {
        self.next_f64_01() * TAU
    }

    /// Split off an independent stream, e.g. one per vial.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
