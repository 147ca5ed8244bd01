use super::*;
use crate::animation::phase::PhaseWindow;
use crate::foundation::core::Viewport;
use crate::orchestrate::wiring::{WiringEntry, page_wiring};

#[test]
fn page_builds_every_module() {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let cfg = SceneConfig::default();
    let wiring = Wiring::resolve(&page_wiring()).unwrap();
    let m = Modules::build(&cfg, &wiring, &mut stage).unwrap();
    for key in EffectKey::ALL {
        let e = m.get(key).unwrap();
        assert_eq!(e.key(), key);
    }

    let mut ids: Vec<&str> = m.surfaces().iter().map(|s| s.id()).collect();
    ids.sort_unstable();
    assert_eq!(
        ids,
        vec![
            "basin-canvas",
            "basin-incoming",
            "basin-water",
            "particles",
            "pour-travel",
            "vial-threads-1",
            "vial-threads-2",
            "vial-threads-3",
        ]
    );
    assert!(m.surface("vial-threads-2").is_some());
    assert!(m.surface("nope").is_none());
}

#[test]
fn unwired_modules_claim_nothing() {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let wiring = Wiring::resolve(&[WiringEntry::new(EffectKey::SceneCamera, &[])]).unwrap();
    let mut m = Modules::build(&SceneConfig::default(), &wiring, &mut stage).unwrap();
    assert!(m.get(EffectKey::SceneCamera).is_some());
    assert!(m.get_mut(EffectKey::AmbientParticles).is_none());
    assert!(m.surfaces().is_empty());
    assert!(stage.claim_canvas("particles").is_some());
    assert_eq!(stage.resize_listener_count(), 1);
}

#[test]
fn invalid_options_fail_the_build() {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let mut cfg = SceneConfig::default();
    cfg.basin_wake.phase = PhaseWindow { from: 0.5, to: 0.2 };
    let wiring = Wiring::resolve(&page_wiring()).unwrap();
    assert!(Modules::build(&cfg, &wiring, &mut stage).is_err());
}
