//! Effect modules driven by the ceremony timeline.
//!
//! Every module follows one lifecycle: a factory resolves its targets on the [`Stage`]
//! (returning `None` when one is missing), `apply(t)` maps the global timeline onto the
//! module's own phase window, `reset` restores the pre-run look and `stop` halts any
//! self-driven frame loop.

pub mod ambient_particles;
pub mod basin_incoming;
pub mod basin_visibility;
pub mod basin_wake;
pub mod basin_water;
pub mod circle_formation;
pub mod memory_layer;
pub mod memory_reveal;
pub mod scene_camera;
pub mod shader;
pub mod vial_threads;
pub mod vial_tilt;
pub mod vials_orbit;
pub mod wisp_bridge;

use crate::host::stage::{ListenerId, Stage};
use crate::host::surface::Surface;

/// Stable identity of an effect inside the orchestration graph.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EffectKey {
    VialTilt,
    SceneCamera,
    BasinVisibility,
    BasinWake,
    BasinWater,
    BasinIncoming,
    MediaReveal,
    CaptionReveal,
    CircleFormation,
    WispBridge,
    VialThreads,
    AmbientParticles,
    VialsOrbit,
}

impl EffectKey {
    pub const ALL: [EffectKey; 13] = [
        Self::VialTilt,
        Self::SceneCamera,
        Self::BasinVisibility,
        Self::BasinWake,
        Self::BasinWater,
        Self::BasinIncoming,
        Self::MediaReveal,
        Self::CaptionReveal,
        Self::CircleFormation,
        Self::WispBridge,
        Self::VialThreads,
        Self::AmbientParticles,
        Self::VialsOrbit,
    ];

    /// Inverse of [`EffectKey::as_str`].
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VialTilt => "vial-tilt",
            Self::SceneCamera => "scene-camera",
            Self::BasinVisibility => "basin-visibility",
            Self::BasinWake => "basin-wake",
            Self::BasinWater => "basin-water",
            Self::BasinIncoming => "basin-incoming",
            Self::MediaReveal => "media-reveal",
            Self::CaptionReveal => "caption-reveal",
            Self::CircleFormation => "circle-formation",
            Self::WispBridge => "wisp-bridge",
            Self::VialThreads => "vial-threads",
            Self::AmbientParticles => "ambient-particles",
            Self::VialsOrbit => "vials-orbit",
        }
    }
}

impl std::fmt::Display for EffectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A particle handed from a vial's local space into the world-space wisp bridge.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EgressPayload {
    /// World position in CSS pixels.
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    /// World pixels per second.
    pub speed: f64,
    /// Pour level of the emitting vial, `[0, 1]`.
    pub local_pour: f64,
    pub hue: f64,
    pub line_width: f64,
    pub alpha: f64,
    pub noise_strength: f64,
    pub base_turn_speed: f64,
}

/// Values flowing along the wiring graph from producers to their dependents.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "signal", rename_all = "camelCase")]
pub enum Signal {
    /// Basin wake level in `[0, 1]`.
    Wake { level: f64 },
    /// A class toggled on a scene element (the basin becoming visible).
    Visibility {
        selector: String,
        class: String,
        shown: bool,
    },
    Egress(EgressPayload),
}

/// The contract every effect module implements.
pub trait Effect {
    fn key(&self) -> EffectKey;

    /// Drive the module from the global timeline value `t`.
    ///
    /// Safe to call every frame: repeating the same `t` changes nothing, increasing `t`
    /// moves the visuals forward.
    fn apply(&mut self, t: f64);

    /// Restore the pre-run look and clear sticky flags.
    fn reset(&mut self);

    /// Halt any self-driven loop, keeping the current look.
    fn stop(&mut self) {}

    /// Recompute geometry after a viewport or container resize. Accumulated simulation
    /// state is kept.
    fn resize(&mut self, _stage: &Stage) {}

    /// One animation frame of the module's own loop. Only called while
    /// [`Effect::is_looping`] is true.
    fn frame(&mut self, _now_ms: f64) {}

    fn is_looping(&self) -> bool {
        false
    }

    /// Receive a signal from a module this one depends on.
    fn accept(&mut self, _signal: &Signal) {}

    /// Take the signals produced since the last call.
    fn drain_signals(&mut self) -> Vec<Signal> {
        Vec::new()
    }

    /// Owned canvas, if any.
    fn surface(&self) -> Option<&Surface> {
        None
    }

    /// Current visual state for inspection and export.
    fn snapshot(&self) -> serde_json::Value;

    /// Release everything registered on the stage: frame loop, resize listener, canvas.
    fn destroy(&mut self, stage: &mut Stage) {
        self.stop();
        if let Some(id) = self.listener() {
            stage.unlisten(id);
        }
        if let Some(canvas) = self.surface().map(|s| s.id().to_owned()) {
            stage.release_canvas(&canvas);
        }
    }

    /// Resize listener registered at construction.
    fn listener(&self) -> Option<ListenerId> {
        None
    }
}
