use crate::foundation::math::clamp01;

/// Easing curves used to shape normalized progress.
///
/// Every curve maps `0 -> 0` and `1 -> 1` and is monotonic non-decreasing on `[0, 1]`;
/// the "hold visible after completion" behaviour of reveal effects depends on that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    /// Identity.
    Linear,
    /// Cubic ease-in/out.
    #[default]
    InOutCubic,
    /// Cubic ease-out (`1 - (1 - t)^3`). Accepts `"cubic"` in configs.
    #[serde(alias = "cubic")]
    OutCubic,
    /// Hermite smoothstep (`t^2 (3 - 2t)`).
    Smoothstep,
}

impl Ease {
    /// Every curve, for exhaustive property checks.
    pub const ALL: [Ease; 4] = [
        Ease::Linear,
        Ease::InOutCubic,
        Ease::OutCubic,
        Ease::Smoothstep,
    ];

    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = clamp01(t);
        match self {
            Self::Linear => t,
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::Smoothstep => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Apply an optional curve; `None` is the identity.
pub fn ease_opt(ease: Option<Ease>, t: f64) -> f64 {
    match ease {
        Some(e) => e.apply(t),
        None => t,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
