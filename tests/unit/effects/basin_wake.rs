use super::*;
use crate::foundation::core::Viewport;

fn module() -> BasinWake {
    let stage = Stage::pensieve_page(Viewport::default());
    BasinWake::create(
        BasinWakeOptions {
            phase: PhaseWindow { from: 0.18, to: 0.50 },
            ..BasinWakeOptions::default()
        },
        &stage,
    )
    .unwrap()
    .unwrap()
}

#[test]
fn emits_eased_wake_every_apply() {
    let mut wake = module();
    wake.apply(0.34);
    assert!((wake.wake() - 0.5).abs() < 1e-9);
    assert_eq!(wake.drain_signals(), vec![Signal::Wake { level: wake.wake() }]);

    wake.apply(0.6);
    assert_eq!(wake.wake(), 1.0);
    wake.apply(0.6);
    // Repeated applies coalesce into the latest level.
    assert_eq!(wake.drain_signals(), vec![Signal::Wake { level: 1.0 }]);
}

#[test]
fn reset_broadcasts_zero() {
    let mut wake = module();
    wake.apply(1.0);
    wake.drain_signals();
    wake.reset();
    assert_eq!(wake.wake(), 0.0);
    assert_eq!(wake.drain_signals(), vec![Signal::Wake { level: 0.0 }]);
}

#[test]
fn missing_basin_is_none() {
    let stage = Stage::new(Viewport::default());
    assert!(
        BasinWake::create(BasinWakeOptions::default(), &stage)
            .unwrap()
            .is_none()
    );
}
