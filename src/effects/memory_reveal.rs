//! Generic revealer for the memory media and its caption.
//!
//! Opacity, blur and a small lift resolve together while an optional mask opens (a
//! radial iris or a left-to-right wipe). Completion is sticky: once fully revealed the
//! element holds its look even if the timeline is replayed backwards.

use crate::animation::ease::Ease;
use crate::animation::phase::PhaseWindow;
use crate::effects::{Effect, EffectKey};
use crate::foundation::error::PensieveResult;
use crate::foundation::math::{clamp01, lerp};
use crate::host::stage::Stage;

const REVEAL_SCALE: f64 = 0.90;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
}

impl Tween {
    pub fn at(&self, k: f64) -> f64 {
        lerp(self.from, self.to, k)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaskKind {
    #[default]
    Radial,
    Linear,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaskOptions {
    pub enabled: bool,
    pub kind: MaskKind,
    /// Edge softness in `[0, 1]`.
    pub feather: f64,
    /// How far the mask centre drifts while opening.
    pub travel: f64,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: MaskKind::Radial,
            feather: 0.22,
            travel: 0.10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryRevealOptions {
    pub selector: String,
    pub phase: PhaseWindow,
    pub lift_px: f64,
    pub blur_px: f64,
    pub ease: Ease,
    pub mask: MaskOptions,
    /// Edge blur in px; `null` disables.
    pub edge_blur: Option<Tween>,
    /// Edge fade start radius in percent; `null` disables.
    pub edge_mask: Option<Tween>,
    /// Edge fade end radius in percent; `null` disables.
    pub edge_mask_end: Option<Tween>,
    /// Keep the revealed look once complete.
    pub hold_visible_after: bool,
}

impl Default for MemoryRevealOptions {
    fn default() -> Self {
        Self {
            selector: ".memory-reveal".to_owned(),
            phase: PhaseWindow { from: 0.65, to: 0.80 },
            lift_px: 10.0,
            blur_px: 10.0,
            ease: Ease::OutCubic,
            mask: MaskOptions::default(),
            edge_blur: Some(Tween { from: 14.0, to: 8.0 }),
            edge_mask: Some(Tween { from: 45.0, to: 60.0 }),
            edge_mask_end: Some(Tween { from: 75.0, to: 86.0 }),
            hold_visible_after: true,
        }
    }
}

/// Mask geometry in percent of the element box.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MaskShape {
    /// Opaque inside `inner`, transparent beyond `outer`.
    Radial {
        cx: f64,
        cy: f64,
        inner: f64,
        outer: f64,
    },
    /// Horizontal band: fades in over `fade_start..a`, opaque `a..b`, fades out `b..fade_end`.
    Linear {
        fade_start: f64,
        a: f64,
        b: f64,
        fade_end: f64,
    },
}

impl MaskShape {
    pub fn css(&self) -> String {
        match *self {
            Self::Radial {
                cx,
                cy,
                inner,
                outer,
            } => format!(
                "radial-gradient(circle at {cx}% {cy}%, rgba(0,0,0,1) {inner}%, rgba(0,0,0,0) {outer}%)"
            ),
            Self::Linear {
                fade_start,
                a,
                b,
                fade_end,
            } => format!(
                "linear-gradient(90deg, rgba(0,0,0,0) {fade_start}%, rgba(0,0,0,1) {a}%, rgba(0,0,0,1) {b}%, rgba(0,0,0,0) {fade_end}%)"
            ),
        }
    }
}

/// Resolved visual state of the revealed element.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealVisual {
    /// `data-reveal="on"`.
    pub on: bool,
    pub opacity: f64,
    pub lift_px: f64,
    pub scale: f64,
    pub blur_px: f64,
    pub edge_blur_px: Option<f64>,
    pub edge_start_pct: Option<f64>,
    pub edge_end_pct: Option<f64>,
    pub mask: Option<MaskShape>,
}

impl RevealVisual {
    pub fn transform(&self) -> String {
        format!("translateY({}px) scale({})", self.lift_px, self.scale)
    }
}

#[derive(Clone, Debug)]
pub struct MemoryReveal {
    key: EffectKey,
    opts: MemoryRevealOptions,
    supports_mask: bool,
    started: bool,
    completed: bool,
    last_t: f64,
    visual: RevealVisual,
}

impl MemoryReveal {
    pub fn create(
        key: EffectKey,
        opts: MemoryRevealOptions,
        stage: &Stage,
    ) -> PensieveResult<Option<Self>> {
        opts.phase.validate()?;
        if stage.query(&opts.selector).is_none() {
            return Ok(None);
        }
        let supports_mask = stage.supports_css_mask();
        let visual = visual_at(&opts, supports_mask, 0.0);
        Ok(Some(Self {
            key,
            opts,
            supports_mask,
            started: false,
            completed: false,
            last_t: 0.0,
            visual: RevealVisual { on: false, ..visual },
        }))
    }

    pub fn visual(&self) -> &RevealVisual {
        &self.visual
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn last_t(&self) -> f64 {
        self.last_t
    }

    pub fn selector(&self) -> &str {
        &self.opts.selector
    }

    /// Show the reveal at level `k`, bypassing the phase window and the sticky hold.
    /// Flags are untouched; the return fade drives this.
    pub fn apply_level(&mut self, k: f64) {
        self.visual = visual_at(&self.opts, self.supports_mask, clamp01(k));
    }
}

fn visual_at(opts: &MemoryRevealOptions, supports_mask: bool, k: f64) -> RevealVisual {
    let mask = (opts.mask.enabled && supports_mask).then(|| mask_at(&opts.mask, k));
    RevealVisual {
        on: k > 0.001,
        opacity: k,
        lift_px: opts.lift_px * (1.0 - k),
        scale: REVEAL_SCALE,
        blur_px: opts.blur_px * (1.0 - k),
        edge_blur_px: opts.edge_blur.map(|tw| tw.at(k)),
        edge_start_pct: opts.edge_mask.map(|tw| tw.at(k)),
        edge_end_pct: opts.edge_mask_end.map(|tw| tw.at(k)),
        mask,
    }
}

fn mask_at(m: &MaskOptions, k: f64) -> MaskShape {
    let feather = clamp01(m.feather);
    // Starts slightly open so the reveal never reads as a hard wipe.
    let open = 0.08 + 0.92 * k;
    let drift = m.travel * (1.0 - k);
    match m.kind {
        MaskKind::Linear => {
            let a = (0.5 - drift) * 100.0;
            let b = a + open * 100.0;
            let f = feather * 100.0;
            MaskShape::Linear {
                fade_start: (a - f).max(0.0),
                a,
                b,
                fade_end: (b + f).min(100.0),
            }
        }
        MaskKind::Radial => MaskShape::Radial {
            cx: 50.0 + drift * 100.0,
            cy: 55.0,
            inner: ((open - feather) * 100.0).max(0.0),
            outer: ((open + feather) * 100.0).min(100.0),
        },
    }
}

impl Effect for MemoryReveal {
    fn key(&self) -> EffectKey {
        self.key
    }

    fn apply(&mut self, t: f64) {
        self.last_t = t;
        let p = self.opts.phase.local(t);
        if p > 0.0001 {
            self.started = true;
        }
        if self.opts.hold_visible_after && self.completed {
            return;
        }
        let eased = self.opts.ease.apply(p);
        if eased >= 0.999 {
            if !self.completed {
                tracing::debug!(selector = %self.opts.selector, "reveal complete");
            }
            self.completed = true;
        }
        self.visual = visual_at(&self.opts, self.supports_mask, eased);
    }

    fn reset(&mut self) {
        self.started = false;
        self.completed = false;
        self.visual = RevealVisual {
            on: false,
            ..visual_at(&self.opts, self.supports_mask, 0.0)
        };
    }

    /// Keeps the current look but drops the mask.
    fn stop(&mut self) {
        self.visual.mask = None;
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "selector": self.opts.selector,
            "started": self.started,
            "completed": self.completed,
            "visual": self.visual,
            "transform": self.visual.transform(),
            "maskImage": self.visual.mask.map(|m| m.css()),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/memory_reveal.rs"]
mod tests;
