use super::*;
use crate::foundation::core::Viewport;

fn page_opts() -> CircleFormationOptions {
    CircleFormationOptions {
        phase: PhaseWindow { from: 0.52, to: 0.78 },
        ring_radius: 0.335,
        max_particles: 54,
        spawn_rate: 32.0,
        spawn_jitter_px: 4.0,
        spawn_alpha_in: 0.18,
        line_width: Range::new(2.2, 3.4),
        trail_points: 32,
        ..CircleFormationOptions::default()
    }
}

fn formation() -> (Stage, CircleFormation) {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let f = CircleFormation::create(page_opts(), &mut stage)
        .unwrap()
        .unwrap();
    (stage, f)
}

fn run_frames(f: &mut CircleFormation, start_ms: f64, n: usize) -> f64 {
    let mut now = start_ms;
    for _ in 0..n {
        f.frame(now);
        now += 50.0;
    }
    now
}

#[test]
fn idle_until_window_is_crossed() {
    let (_stage, mut f) = formation();
    f.apply(0.3);
    f.apply(0.52);
    assert_eq!(f.state(), FormationState::Idle);
    assert!(!f.is_looping());

    f.apply(0.53);
    assert_eq!(f.state(), FormationState::Bursting);
    assert!(f.is_looping());
}

#[test]
fn fractional_spawn_accumulator() {
    let (_stage, mut f) = formation();
    f.apply(0.53);
    f.frame(1000.0);
    assert_eq!(f.particle_count(), 0);
    f.frame(1050.0);
    assert_eq!(f.particle_count(), 1);
    f.frame(1100.0);
    assert_eq!(f.particle_count(), 3);
    // A long stall is clamped to 50 ms of integration.
    f.frame(5000.0);
    assert_eq!(f.particle_count(), 4);
}

#[test]
fn population_is_capped() {
    let (_stage, mut f) = formation();
    f.apply(0.53);
    run_frames(&mut f, 0.0, 200);
    assert_eq!(f.particle_count(), 54);
    assert_eq!(f.state(), FormationState::Bursting);
}

#[test]
fn locked_ring_outlives_its_window_until_stop() {
    let (_stage, mut f) = formation();
    f.apply(0.6);
    let now = run_frames(&mut f, 0.0, 20);
    let before_lock = f.particle_count();
    assert!(before_lock > 0);

    f.apply(0.78);
    assert!(f.lock_t() >= 0.999);
    let now = run_frames(&mut f, now, 1);
    assert_eq!(f.state(), FormationState::Locked);

    // Phase long exceeded: still locked, still animating, no more spawning.
    for t in [0.85, 0.95, 1.0] {
        f.apply(t);
    }
    let count = f.particle_count();
    let now = run_frames(&mut f, now, 300);
    assert_eq!(f.state(), FormationState::Locked);
    assert!(f.is_looping());
    assert_eq!(f.particle_count(), count);
    assert_eq!(f.surface().unwrap().commands().len(), count);

    let ratio = f.mean_radius_ratio().unwrap();
    assert!((0.8..1.2).contains(&ratio), "{ratio}");

    f.stop();
    assert_eq!(f.state(), FormationState::Idle);
    assert_eq!(f.particle_count(), 0);
    assert!(!f.is_looping());
    assert!(f.surface().unwrap().commands().is_empty());

    f.frame(now);
    assert_eq!(f.particle_count(), 0);
}

#[test]
fn trails_have_configured_length() {
    let (_stage, mut f) = formation();
    f.apply(0.6);
    run_frames(&mut f, 0.0, 5);
    match &f.surface().unwrap().commands()[0] {
        DrawCmd::Polyline { points, width, .. } => {
            assert_eq!(points.len(), 32);
            assert!((2.2..=3.4).contains(width));
        }
        other => panic!("unexpected draw {other:?}"),
    }
}

#[test]
fn resize_keeps_particles() {
    let (mut stage, mut f) = formation();
    f.apply(0.6);
    run_frames(&mut f, 0.0, 10);
    let count = f.particle_count();
    stage.set_viewport(Viewport::new(640.0, 480.0, 2.0).unwrap());
    stage.set_rect("#scene-basin", Rect::new(0.0, 0.0, 500.0, 400.0));
    f.resize(&stage);
    assert_eq!(f.particle_count(), count);
    assert_eq!(f.surface().unwrap().backing_size(), (1000, 800));
}

#[test]
fn same_seed_same_ring() {
    let (_s1, mut a) = formation();
    let (_s2, mut b) = formation();
    for f in [&mut a, &mut b] {
        f.apply(0.6);
        run_frames(f, 0.0, 30);
    }
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn missing_selector_registers_nothing() {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let f = CircleFormation::create(
        CircleFormationOptions {
            basin_selector: "#does-not-exist".to_owned(),
            ..page_opts()
        },
        &mut stage,
    )
    .unwrap();
    assert!(f.is_none());
    assert_eq!(stage.resize_listener_count(), 0);
    assert!(stage.claim_canvas("basin-canvas").is_some());
}

#[test]
fn inverted_lock_ramp_is_rejected() {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let err = CircleFormation::create(
        CircleFormationOptions {
            lock_start: 0.9,
            lock_end: 0.1,
            ..page_opts()
        },
        &mut stage,
    );
    assert!(err.is_err());
}
