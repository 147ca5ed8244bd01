use crate::config::scene::SceneConfig;
use crate::effects::ambient_particles::AmbientParticles;
use crate::effects::basin_incoming::BasinIncoming;
use crate::effects::basin_visibility::BasinVisibility;
use crate::effects::basin_wake::BasinWake;
use crate::effects::basin_water::BasinWater;
use crate::effects::circle_formation::CircleFormation;
use crate::effects::memory_reveal::MemoryReveal;
use crate::effects::scene_camera::SceneCamera;
use crate::effects::vial_threads::VialThreads;
use crate::effects::vial_tilt::VialTilt;
use crate::effects::vials_orbit::VialsOrbit;
use crate::effects::wisp_bridge::WispBridge;
use crate::effects::{Effect, EffectKey};
use crate::foundation::error::PensieveResult;
use crate::host::stage::Stage;
use crate::host::surface::Surface;
use crate::orchestrate::wiring::Wiring;

/// Every effect of a ceremony, by concrete type.
///
/// A slot is `None` when the module is not wired or its target is missing from the stage.
#[derive(Debug, Default)]
pub struct Modules {
    pub vial_tilt: Option<VialTilt>,
    pub scene_camera: Option<SceneCamera>,
    pub basin_visibility: Option<BasinVisibility>,
    pub basin_wake: Option<BasinWake>,
    pub basin_water: Option<BasinWater>,
    pub basin_incoming: Option<BasinIncoming>,
    pub media_reveal: Option<MemoryReveal>,
    pub caption_reveal: Option<MemoryReveal>,
    pub circle_formation: Option<CircleFormation>,
    pub wisp_bridge: Option<WispBridge>,
    pub vial_threads: Option<VialThreads>,
    pub ambient_particles: Option<AmbientParticles>,
    pub vials_orbit: Option<VialsOrbit>,
}

impl Modules {
    /// Create the wired modules in update order. Invalid options fail the whole build;
    /// missing targets only leave their slot empty.
    pub fn build(cfg: &SceneConfig, wiring: &Wiring, stage: &mut Stage) -> PensieveResult<Self> {
        let mut m = Self::default();
        for &key in wiring.order() {
            match key {
                EffectKey::VialTilt => m.vial_tilt = Some(VialTilt::create(cfg.vial_tilt.clone())?),
                EffectKey::SceneCamera => {
                    m.scene_camera = SceneCamera::create(cfg.scene_camera.clone(), stage)?
                }
                EffectKey::BasinVisibility => {
                    m.basin_visibility = BasinVisibility::create(cfg.basin_visibility.clone(), stage)?
                }
                EffectKey::BasinWake => {
                    m.basin_wake = BasinWake::create(cfg.basin_wake.clone(), stage)?
                }
                EffectKey::BasinWater => {
                    m.basin_water = BasinWater::create(cfg.basin_water.clone(), stage)?
                }
                EffectKey::BasinIncoming => {
                    m.basin_incoming = BasinIncoming::create(cfg.basin_incoming.clone(), stage)?
                }
                EffectKey::MediaReveal => {
                    m.media_reveal = MemoryReveal::create(key, cfg.media_reveal.clone(), stage)?
                }
                EffectKey::CaptionReveal => {
                    m.caption_reveal = MemoryReveal::create(key, cfg.caption_reveal.clone(), stage)?
                }
                EffectKey::CircleFormation => {
                    m.circle_formation = CircleFormation::create(cfg.circle_formation.clone(), stage)?
                }
                EffectKey::WispBridge => {
                    m.wisp_bridge = WispBridge::create(cfg.wisp_bridge.clone(), stage)?
                }
                EffectKey::VialThreads => {
                    m.vial_threads = VialThreads::create(cfg.vial_threads.clone(), stage)?
                }
                EffectKey::AmbientParticles => {
                    m.ambient_particles =
                        AmbientParticles::create(cfg.ambient_particles.clone(), stage)?
                }
                EffectKey::VialsOrbit => {
                    m.vials_orbit = VialsOrbit::create(cfg.vials_orbit.clone(), stage)?
                }
            }
            if m.get(key).is_none() {
                tracing::warn!(module = %key, "effect disabled: target missing");
            }
        }
        Ok(m)
    }

    pub fn get(&self, key: EffectKey) -> Option<&dyn Effect> {
        match key {
            EffectKey::VialTilt => self.vial_tilt.as_ref().map(|e| e as &dyn Effect),
            EffectKey::SceneCamera => self.scene_camera.as_ref().map(|e| e as &dyn Effect),
            EffectKey::BasinVisibility => self.basin_visibility.as_ref().map(|e| e as &dyn Effect),
            EffectKey::BasinWake => self.basin_wake.as_ref().map(|e| e as &dyn Effect),
            EffectKey::BasinWater => self.basin_water.as_ref().map(|e| e as &dyn Effect),
            EffectKey::BasinIncoming => self.basin_incoming.as_ref().map(|e| e as &dyn Effect),
            EffectKey::MediaReveal => self.media_reveal.as_ref().map(|e| e as &dyn Effect),
            EffectKey::CaptionReveal => self.caption_reveal.as_ref().map(|e| e as &dyn Effect),
            EffectKey::CircleFormation => self.circle_formation.as_ref().map(|e| e as &dyn Effect),
            EffectKey::WispBridge => self.wisp_bridge.as_ref().map(|e| e as &dyn Effect),
            EffectKey::VialThreads => self.vial_threads.as_ref().map(|e| e as &dyn Effect),
            EffectKey::AmbientParticles => {
                self.ambient_particles.as_ref().map(|e| e as &dyn Effect)
            }
            EffectKey::VialsOrbit => self.vials_orbit.as_ref().map(|e| e as &dyn Effect),
        }
    }

    pub fn get_mut(&mut self, key: EffectKey) -> Option<&mut dyn Effect> {
        match key {
            EffectKey::VialTilt => self.vial_tilt.as_mut().map(|e| e as &mut dyn Effect),
            EffectKey::SceneCamera => self.scene_camera.as_mut().map(|e| e as &mut dyn Effect),
            EffectKey::BasinVisibility => {
                self.basin_visibility.as_mut().map(|e| e as &mut dyn Effect)
            }
            EffectKey::BasinWake => self.basin_wake.as_mut().map(|e| e as &mut dyn Effect),
            EffectKey::BasinWater => self.basin_water.as_mut().map(|e| e as &mut dyn Effect),
            EffectKey::BasinIncoming => self.basin_incoming.as_mut().map(|e| e as &mut dyn Effect),
            EffectKey::MediaReveal => self.media_reveal.as_mut().map(|e| e as &mut dyn Effect),
            EffectKey::CaptionReveal => self.caption_reveal.as_mut().map(|e| e as &mut dyn Effect),
            EffectKey::CircleFormation => {
                self.circle_formation.as_mut().map(|e| e as &mut dyn Effect)
            }
            EffectKey::WispBridge => self.wisp_bridge.as_mut().map(|e| e as &mut dyn Effect),
            EffectKey::VialThreads => self.vial_threads.as_mut().map(|e| e as &mut dyn Effect),
            EffectKey::AmbientParticles => {
                self.ambient_particles.as_mut().map(|e| e as &mut dyn Effect)
            }
            EffectKey::VialsOrbit => self.vials_orbit.as_mut().map(|e| e as &mut dyn Effect),
        }
    }

    /// Every canvas the modules own, per-vial thread canvases included.
    pub fn surfaces(&self) -> Vec<&Surface> {
        let mut out: Vec<&Surface> = EffectKey::ALL
            .iter()
            .filter_map(|&k| self.get(k).and_then(|e| e.surface()))
            .collect();
        if let Some(threads) = &self.vial_threads {
            out.extend(threads.surfaces());
        }
        out
    }

    pub fn surface(&self, canvas_id: &str) -> Option<&Surface> {
        self.surfaces().into_iter().find(|s| s.id() == canvas_id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/modules.rs"]
mod tests;
