use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::animation::ease::Ease;
use crate::animation::phase::PhaseWindow;
use crate::audio::cues::{Cue, CueAction, CueTrigger};
use crate::clock::ceremony::ClockConfig;
use crate::config::merge::merge_onto;
use crate::effects::ambient_particles::AmbientParticlesOptions;
use crate::effects::basin_incoming::BasinIncomingOptions;
use crate::effects::basin_visibility::BasinVisibilityOptions;
use crate::effects::basin_wake::BasinWakeOptions;
use crate::effects::basin_water::BasinWaterOptions;
use crate::effects::circle_formation::CircleFormationOptions;
use crate::effects::memory_layer::{CaptionOptions, MemoryLayerOptions};
use crate::effects::memory_reveal::{MaskKind, MaskOptions, MemoryRevealOptions, Tween};
use crate::effects::scene_camera::SceneCameraOptions;
use crate::effects::vial_threads::{EgressOptions, VialThreadsOptions};
use crate::effects::vial_tilt::VialTiltOptions;
use crate::effects::vials_orbit::VialsOrbitOptions;
use crate::effects::wisp_bridge::WispBridgeOptions;
use crate::effects::EffectKey;
use crate::foundation::core::Point;
use crate::foundation::error::{PensieveError, PensieveResult};
use crate::foundation::math::Range;
use crate::orchestrate::content::ContentTable;
use crate::orchestrate::trigger::VialCorkOptions;
use crate::orchestrate::wiring::{WiringEntry, page_wiring};

/// Everything a ceremony needs besides the stage: clock, module options, content,
/// sound cues and the wiring graph.
///
/// `SceneConfig::default()` is the shipped page. A scene file only lists what it
/// changes; it is deep-merged over the defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    pub clock: ClockConfig,
    /// Clock of the return to the shelf after a run.
    pub return_clock: ClockConfig,

    pub vial_tilt: VialTiltOptions,
    pub scene_camera: SceneCameraOptions,
    pub basin_visibility: BasinVisibilityOptions,
    pub basin_wake: BasinWakeOptions,
    pub basin_water: BasinWaterOptions,
    pub basin_incoming: BasinIncomingOptions,
    pub media_reveal: MemoryRevealOptions,
    pub caption_reveal: MemoryRevealOptions,
    pub circle_formation: CircleFormationOptions,
    pub memory_layer: MemoryLayerOptions,
    pub ambient_particles: AmbientParticlesOptions,
    pub wisp_bridge: WispBridgeOptions,
    pub vial_threads: VialThreadsOptions,
    pub vials_orbit: VialsOrbitOptions,

    pub cork: VialCorkOptions,
    pub content: ContentTable,
    pub cues: Vec<Cue>,
    pub wiring: Vec<WiringEntry>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig {
                total_duration_ms: 8000.0,
                easing: Some(Ease::InOutCubic),
            },
            return_clock: ClockConfig {
                total_duration_ms: 1800.0,
                easing: Some(Ease::InOutCubic),
            },
            vial_tilt: VialTiltOptions {
                tilt_phase: PhaseWindow { from: 0.0, to: 0.04 },
                max_tilt_deg: 20.0,
                lift_px: -4.0,
            },
            scene_camera: SceneCameraOptions {
                stack_selector: "#scene-stack".to_owned(),
                phase: PhaseWindow { from: 0.08, to: 0.42 },
                travel_screens: 1.0,
                ..SceneCameraOptions::default()
            },
            basin_visibility: BasinVisibilityOptions {
                phase: PhaseWindow { from: 0.12, to: 0.50 },
                show_at: 0.15,
                ..BasinVisibilityOptions::default()
            },
            basin_wake: BasinWakeOptions {
                phase: PhaseWindow { from: 0.18, to: 0.50 },
                ..BasinWakeOptions::default()
            },
            basin_water: page_water(),
            basin_incoming: BasinIncomingOptions {
                phase: Some(PhaseWindow { from: 0.18, to: 0.50 }),
                ..BasinIncomingOptions::default()
            },
            media_reveal: MemoryRevealOptions {
                selector: "#memory-media".to_owned(),
                phase: PhaseWindow { from: 0.42, to: 1.0 },
                lift_px: 4.0,
                blur_px: 8.0,
                mask: MaskOptions {
                    enabled: true,
                    kind: MaskKind::Radial,
                    feather: 0.22,
                    travel: 0.06,
                },
                edge_blur: Some(Tween { from: 24.0, to: 4.0 }),
                edge_mask: Some(Tween { from: 42.0, to: 58.0 }),
                edge_mask_end: Some(Tween { from: 72.0, to: 88.0 }),
                ..MemoryRevealOptions::default()
            },
            caption_reveal: MemoryRevealOptions {
                selector: "#memory-caption".to_owned(),
                phase: PhaseWindow { from: 0.62, to: 1.0 },
                lift_px: 2.0,
                blur_px: 4.0,
                mask: MaskOptions {
                    enabled: false,
                    ..MaskOptions::default()
                },
                ..MemoryRevealOptions::default()
            },
            circle_formation: page_circle(),
            memory_layer: MemoryLayerOptions {
                basin_selector: "#scene-basin".to_owned(),
                ring_center: Point::new(0.215, 0.435),
                ring_radius: 0.285,
                feather_px: 20.0,
                caption: CaptionOptions {
                    offset_px: 150.0,
                    ..CaptionOptions::default()
                },
                ..MemoryLayerOptions::default()
            },
            ambient_particles: AmbientParticlesOptions {
                canvas_id: "particles".to_owned(),
                max_particles: 70,
                density_factor: 0.00012,
                ..AmbientParticlesOptions::default()
            },
            wisp_bridge: WispBridgeOptions {
                canvas_id: "pour-travel".to_owned(),
                basin_selector: "#scene-basin".to_owned(),
                basin_target: Point::new(0.5, 0.46),
                ..WispBridgeOptions::default()
            },
            vial_threads: VialThreadsOptions {
                selector: ".vial".to_owned(),
                wisp_count: 24,
                speed: Range::new(6.0, 12.0),
                segment_count: Range::new(6.0, 10.0),
                noise_strength: Range::new(0.4, 0.6),
                base_alpha: Range::new(0.35, 0.55),
                egress: EgressOptions {
                    enabled: true,
                    ..EgressOptions::default()
                },
                pour_phase: Some(PhaseWindow { from: 0.14, to: 0.62 }),
                ..VialThreadsOptions::default()
            },
            vials_orbit: VialsOrbitOptions {
                base_speed: 0.08,
                radius_x_factor: 0.38,
                radius_y_factor: 0.08,
                scale_min: 0.65,
                scale_max: 1.20,
                ..VialsOrbitOptions::default()
            },
            cork: VialCorkOptions::default(),
            content: ContentTable::default(),
            cues: page_cues(),
            wiring: page_wiring(),
        }
    }
}

fn page_water() -> BasinWaterOptions {
    BasinWaterOptions {
        canvas_id: "basin-water".to_owned(),
        base_url: "assets/water-base-2.jpg".to_owned(),
        normal_url: "assets/water-normal.jpg".to_owned(),
        dark_water: [0.004, 0.007, 0.016],
        base_mix: 0.48,
        base_contrast: 1.10,
        base_brightness: 0.80,
        normal_scale: 0.88,
        normal_speed: 0.015,
        refract_strength: 0.030,
        second_layer_strength: 0.60,
        second_layer_scale_mul: 0.70,
        second_layer_speed_mul: 0.30,
        breath_speed: 0.65,
        breath_strength: 0.06,
        wake_boost: 0.18,
        glow_tint: [0.14, 0.20, 0.36],
        glow_intensity: 0.075,
        prefer_repeat_if_pot: true,
        ..BasinWaterOptions::default()
    }
}

fn page_circle() -> CircleFormationOptions {
    CircleFormationOptions {
        canvas_id: "basin-canvas".to_owned(),
        basin_selector: "#scene-basin".to_owned(),
        phase: PhaseWindow { from: 0.52, to: 0.78 },
        ring_radius: 0.335,
        max_particles: 54,
        spawn_rate: 32.0,
        spawn_jitter_px: 4.0,
        spawn_alpha_in: 0.18,
        line_width: Range::new(2.2, 3.4),
        trail_points: 32,
        max_alpha: 0.42,
        glow_blur: 10.0,
        wobble_amp: 0.010,
        wobble_freq: 0.28,
        ring_noise_amp: 0.012,
        ring_noise_freq: 0.45,
        lock_strength: 3.6,
        radius_damping: 0.90,
        swirl_base: 0.11,
        swirl_var: 0.03,
        swirl_accel: 0.06,
        spiral_bias: 0.010,
        bubble_bob_amp: 8.0,
        bubble_bob_freq: 0.22,
        bubble_bob_phase_lock: 0.90,
        ..CircleFormationOptions::default()
    }
}

fn page_cues() -> Vec<Cue> {
    vec![
        Cue {
            trigger: CueTrigger::Timeline { at: 0.0 },
            action: CueAction::Play {
                key: "cork".to_owned(),
                volume: None,
            },
        },
        Cue {
            trigger: CueTrigger::Wake { at: 0.05 },
            action: CueAction::PlayAmbience {
                key: "basin".to_owned(),
                volume: Some(0.6),
                fade_in_sec: Some(0.8),
            },
        },
        Cue {
            trigger: CueTrigger::Timeline { at: 0.52 },
            action: CueAction::Play {
                key: "ring".to_owned(),
                volume: Some(0.7),
            },
        },
    ]
}

impl SceneConfig {
    /// Parse a partial scene document and merge it over the defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> PensieveResult<Self> {
        let overrides: serde_json::Value = serde_json::from_reader(r)
            .map_err(|e| PensieveError::config(format!("parse scene JSON: {e}")))?;
        Self::from_overrides(&overrides)
    }

    pub fn from_path(path: impl AsRef<Path>) -> PensieveResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PensieveError::config(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn from_overrides(overrides: &serde_json::Value) -> PensieveResult<Self> {
        merge_onto(Self::default(), overrides)
    }

    /// The timeline window a module is driven through, or `None` for modules that run
    /// off signals or their own loop.
    pub fn window(&self, key: EffectKey) -> Option<PhaseWindow> {
        match key {
            EffectKey::VialTilt => Some(self.vial_tilt.tilt_phase),
            EffectKey::SceneCamera => Some(self.scene_camera.phase),
            EffectKey::BasinVisibility => Some(self.basin_visibility.phase),
            EffectKey::BasinWake => Some(self.basin_wake.phase),
            EffectKey::BasinIncoming => self.basin_incoming.phase,
            EffectKey::MediaReveal => Some(self.media_reveal.phase),
            EffectKey::CaptionReveal => Some(self.caption_reveal.phase),
            EffectKey::CircleFormation => Some(self.circle_formation.phase),
            EffectKey::VialThreads => self.vial_threads.pour_phase,
            EffectKey::BasinWater
            | EffectKey::WispBridge
            | EffectKey::AmbientParticles
            | EffectKey::VialsOrbit => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/scene.rs"]
mod tests;
