use super::*;
use crate::foundation::core::Viewport;

fn page() -> Stage {
    Stage::pensieve_page(Viewport::new(1000.0, 800.0, 2.0).unwrap())
}

#[test]
fn selectors_match_id_and_class() {
    let stage = page();
    assert!(stage.query("#scene-basin").is_some());
    assert!(stage.query(".scene").is_some());
    assert!(stage.query("#does-not-exist").is_none());
    assert!(stage.query("scene").is_none());
    assert_eq!(stage.query_all(".vial").count(), 3);
}

#[test]
fn canvases_are_claimed_once() {
    let mut stage = page();
    let s = stage.claim_canvas("basin-canvas").unwrap();
    assert_eq!(s.dpr(), 2.0);
    assert!(stage.claim_canvas("basin-canvas").is_none());
    stage.release_canvas("basin-canvas");
    assert!(stage.claim_canvas("basin-canvas").is_some());
}

#[test]
fn webgl_claim_requires_capability() {
    let mut stage = page();
    assert!(stage.claim_webgl_canvas("particles").is_none());
    // The failed WebGL claim must not consume the 2D canvas.
    assert!(stage.claim_canvas("particles").is_some());
    let gl = stage.claim_webgl_canvas("basin-water").unwrap();
    assert!(gl.is_webgl());
}

#[test]
fn listeners_register_and_unregister() {
    let mut stage = page();
    let a = stage.listen_resize("a");
    let b = stage.listen_resize("b");
    assert_ne!(a, b);
    assert_eq!(stage.resize_listener_count(), 2);
    assert!(stage.unlisten(a));
    assert!(!stage.unlisten(a));
    assert_eq!(stage.resize_listener_count(), 1);
    assert_eq!(stage.resize_listeners().next().unwrap().1, "b");
}

#[test]
fn classes_toggle() {
    let mut stage = page();
    assert!(stage.add_class("#vial-1", "is-cork-open"));
    assert!(stage.query("#vial-1").unwrap().has_class("is-cork-open"));
    assert!(!stage.add_class("#vial-1", "is-cork-open"));
    assert!(stage.remove_class("#vial-1", "is-cork-open"));
    assert!(!stage.add_class("#nope", "x"));
}

#[test]
fn vials_carry_memory_ids() {
    let stage = page();
    let ids: Vec<_> = stage
        .query_all(".vials__vial")
        .filter_map(|v| v.data.get("memory").cloned())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}
