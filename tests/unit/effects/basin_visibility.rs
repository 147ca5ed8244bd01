use super::*;
use crate::foundation::core::Viewport;

fn module() -> BasinVisibility {
    let stage = Stage::pensieve_page(Viewport::default());
    BasinVisibility::create(
        BasinVisibilityOptions {
            phase: PhaseWindow { from: 0.12, to: 0.50 },
            show_at: 0.15,
            ..BasinVisibilityOptions::default()
        },
        &stage,
    )
    .unwrap()
    .unwrap()
}

#[test]
fn shows_once_at_threshold() {
    let mut vis = module();
    vis.apply(0.1);
    assert!(!vis.is_shown());
    assert!(vis.drain_signals().is_empty());

    // local = (0.2 - 0.12) / 0.38 > 0.15
    vis.apply(0.2);
    assert!(vis.is_shown());
    let signals = vis.drain_signals();
    assert_eq!(signals.len(), 1);
    assert!(matches!(&signals[0], Signal::Visibility { shown: true, class, .. } if class == "basin-visible"));

    vis.apply(0.3);
    vis.apply(0.2);
    assert!(vis.drain_signals().is_empty());
}

#[test]
fn reset_rearms_and_hides() {
    let mut vis = module();
    vis.apply(1.0);
    vis.drain_signals();
    vis.reset();
    assert!(!vis.is_shown());
    let signals = vis.drain_signals();
    assert!(matches!(&signals[..], [Signal::Visibility { shown: false, .. }]));

    vis.apply(1.0);
    assert_eq!(vis.drain_signals().len(), 1);
}

#[test]
fn missing_scene_is_none() {
    let stage = Stage::new(Viewport::default());
    let vis = BasinVisibility::create(BasinVisibilityOptions::default(), &stage).unwrap();
    assert!(vis.is_none());
}
