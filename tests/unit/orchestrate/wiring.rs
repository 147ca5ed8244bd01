use super::*;
use crate::effects::EffectKey::*;

#[test]
fn page_wiring_keeps_broadcast_order() {
    let w = Wiring::resolve(&page_wiring()).unwrap();
    assert_eq!(w.order().len(), 13);
    assert_eq!(&w.order()[..4], &[VialTilt, SceneCamera, BasinVisibility, BasinWake]);
    let pos = |k| w.order().iter().position(|x| *x == k).unwrap();
    assert!(pos(VialThreads) < pos(WispBridge));
    assert!(pos(BasinWake) < pos(BasinWater));
    assert_eq!(w.dependents(BasinWake), &[BasinWater, BasinIncoming]);
    assert_eq!(w.dependencies(WispBridge), &[VialThreads]);
    assert!(w.dependents(VialsOrbit).is_empty());
}

#[test]
fn consumers_declared_first_are_moved_after_producers() {
    let w = Wiring::resolve(&[
        WiringEntry::new(WispBridge, &[VialThreads]),
        WiringEntry::new(SceneCamera, &[]),
        WiringEntry::new(VialThreads, &[]),
    ])
    .unwrap();
    assert_eq!(w.order(), &[SceneCamera, VialThreads, WispBridge]);
}

#[test]
fn unknown_dependency_is_rejected() {
    let err = Wiring::resolve(&[WiringEntry::new(BasinWater, &[BasinWake])]).unwrap_err();
    assert!(matches!(err, PensieveError::Validation(_)));
    assert!(err.to_string().contains("basin-wake"));
}

#[test]
fn cycles_and_duplicates_are_rejected() {
    let cycle = Wiring::resolve(&[
        WiringEntry::new(BasinWake, &[BasinWater]),
        WiringEntry::new(BasinWater, &[BasinWake]),
        WiringEntry::new(SceneCamera, &[]),
    ])
    .unwrap_err();
    assert!(cycle.to_string().contains("cycle"));
    assert!(!cycle.to_string().contains("scene-camera"));

    let dup = Wiring::resolve(&[
        WiringEntry::new(SceneCamera, &[]),
        WiringEntry::new(SceneCamera, &[]),
    ]);
    assert!(dup.is_err());
}

#[test]
fn entries_parse_from_json() {
    let entries: Vec<WiringEntry> = serde_json::from_value(serde_json::json!([
        { "key": "vial-threads" },
        { "key": "wisp-bridge", "after": ["vial-threads", "vial-threads"] }
    ]))
    .unwrap();
    let w = Wiring::resolve(&entries).unwrap();
    assert_eq!(w.dependencies(WispBridge), &[VialThreads]);
    assert_eq!(w.dependents(VialThreads), &[WispBridge]);
    assert!(w.contains(VialThreads));
    assert!(!w.contains(SceneCamera));
}
