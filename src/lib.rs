//! Pensieve: a phased-timeline choreography engine for the memory ceremony.
//!
//! A single 0→1 ceremony clock drives a set of effect modules, each mapping the global
//! timeline onto its own phase window. The orchestrator owns the run lifecycle (trigger,
//! fan-out, hold, return, teardown) and routes signals between modules along the wiring
//! graph. Rendering is headless: effects record display lists on owned [`Surface`]s which
//! [`rasterize`] turns into pixels.
#![forbid(unsafe_code)]

/// Easing curves and phase windows.
pub mod animation;
/// Threshold-driven sound cues.
pub mod audio;
/// The ceremony clock.
pub mod clock;
/// Option overrides and the scene document.
pub mod config;
/// The effect modules.
pub mod effects;
/// Geometry, errors and numeric helpers.
pub mod foundation;
/// Headless document, canvases and frame timing.
pub mod host;
/// Running ceremonies end to end.
pub mod orchestrate;
/// CPU export of canvases.
pub mod render;

pub use animation::ease::Ease;
pub use animation::phase::{PhaseWindow, phase_t};
pub use audio::cues::{Cue, CueAction, CueSheet, CueTrigger, RecordingSound, SoundCall, SoundSink};
pub use clock::ceremony::{CeremonyClock, ClockConfig, ClockObserver, ClockTick};
pub use config::merge::{deep_merge, merge_onto};
pub use config::scene::SceneConfig;
pub use effects::{Effect, EffectKey, Signal};
pub use foundation::core::{Point, Rect, Rgba8, Viewport};
pub use foundation::error::{PensieveError, PensieveResult};
pub use host::frame::FrameDriver;
pub use host::stage::Stage;
pub use host::surface::{DrawCmd, Surface};
pub use orchestrate::ceremony::{Orchestrator, RunPhase};
pub use orchestrate::wiring::{Wiring, WiringEntry};
pub use render::cpu::{FrameRgba, RasterSettings, rasterize, shade_water};
