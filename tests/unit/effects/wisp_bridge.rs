use std::f64::consts::FRAC_PI_2;

use super::*;
use crate::foundation::core::Viewport;

fn bridge(max_wisps: u32) -> (Stage, WispBridge) {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let b = WispBridge::create(
        WispBridgeOptions {
            canvas_id: "pour-travel".to_owned(),
            basin_target: Point::new(0.5, 0.46),
            max_wisps,
            ..WispBridgeOptions::default()
        },
        &mut stage,
    )
    .unwrap()
    .unwrap();
    (stage, b)
}

fn payload(x: f64, y: f64) -> EgressPayload {
    EgressPayload {
        x,
        y,
        angle: FRAC_PI_2,
        speed: 10.0,
        local_pour: 1.0,
        hue: 210.0,
        line_width: 1.2,
        alpha: 0.5,
        noise_strength: 0.5,
        base_turn_speed: 0.65,
    }
}

#[test]
fn missing_canvas_yields_none_without_listeners() {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let made = WispBridge::create(WispBridgeOptions::default(), &mut stage).unwrap();
    assert!(made.is_none());
    assert_eq!(stage.resize_listener_count(), 0);
}

#[test]
fn egress_wakes_the_loop_and_draws_each_wisp() {
    let (_stage, mut b) = bridge(140);
    assert!(!b.is_looping());
    b.accept(&Signal::Egress(payload(640.0, 100.0)));
    b.accept(&Signal::Wake { level: 1.0 });
    assert!(b.is_looping());
    assert_eq!(b.wisp_count(), 1);

    b.frame(0.0);
    b.frame(16.0);
    assert_eq!(b.surface().unwrap().commands().len(), 1);
}

#[test]
fn full_bridge_evicts_oldest_batch() {
    let (_stage, mut b) = bridge(20);
    for i in 0..20 {
        b.emit(&payload(f64::from(i), 0.0));
    }
    assert_eq!(b.wisp_count(), 20);
    b.emit(&payload(99.0, 0.0));
    assert_eq!(b.wisp_count(), 11);
    assert_eq!(b.emitted(), 21);
}

#[test]
fn wisps_drift_toward_the_basin_target() {
    let (_stage, mut b) = bridge(140);
    for _ in 0..30 {
        b.emit(&payload(640.0, 100.0));
    }
    let before = b.centroid_distance().unwrap();
    let mut now = 0.0;
    while now <= 800.0 {
        b.frame(now);
        now += 16.0;
    }
    assert_eq!(b.wisp_count(), 30);
    assert!(b.centroid_distance().unwrap() < before);
}

#[test]
fn loop_stops_once_every_wisp_has_faded() {
    let (_stage, mut b) = bridge(140);
    b.emit(&payload(640.0, 100.0));
    let mut now = 1000.0;
    while now <= 3000.0 && b.is_looping() {
        b.frame(now);
        now += 16.0;
    }
    assert_eq!(b.wisp_count(), 0);
    assert!(!b.is_looping());
}

#[test]
fn reset_drops_wisps_and_canvas() {
    let (_stage, mut b) = bridge(140);
    b.emit(&payload(640.0, 100.0));
    b.frame(0.0);
    b.reset();
    assert_eq!(b.wisp_count(), 0);
    assert!(!b.is_looping());
    assert!(b.surface().unwrap().commands().is_empty());
}

#[test]
fn without_a_basin_wisps_still_expire_and_the_loop_ends() {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let mut b = WispBridge::create(
        WispBridgeOptions {
            canvas_id: "pour-travel".to_owned(),
            basin_selector: "#no-basin".to_owned(),
            ..WispBridgeOptions::default()
        },
        &mut stage,
    )
    .unwrap()
    .unwrap();
    assert!(b.target().is_none());

    b.emit(&payload(640.0, 100.0));
    assert!(b.is_looping());
    let mut now = 0.0;
    for _ in 0..200 {
        b.frame(now);
        now += 16.0;
    }
    assert_eq!(b.wisp_count(), 0);
    assert!(!b.is_looping());
    assert!(b.surface().unwrap().commands().is_empty());
}
