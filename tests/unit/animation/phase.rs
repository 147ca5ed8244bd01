use super::*;

#[test]
fn saturates_outside_window() {
    assert_eq!(phase_t(-5.0, 0.2, 0.6), 0.0);
    assert_eq!(phase_t(0.2, 0.2, 0.6), 0.0);
    assert_eq!(phase_t(0.6, 0.2, 0.6), 1.0);
    assert_eq!(phase_t(9.0, 0.2, 0.6), 1.0);
}

#[test]
fn interpolates_inside_window() {
    assert!((phase_t(0.5, 0.2, 0.6) - 0.75).abs() < 1e-12);
    assert!((phase_t(0.4, 0.2, 0.6) - 0.5).abs() < 1e-12);
}

#[test]
fn monotonic_and_bounded_for_any_t() {
    let (from, to) = (0.52, 0.78);
    let mut prev = phase_t(-1.0, from, to);
    for i in -200..=400 {
        let t = f64::from(i) / 200.0;
        let v = phase_t(t, from, to);
        assert!((0.0..=1.0).contains(&v));
        assert!(v >= prev);
        prev = v;
    }
}

#[test]
fn degenerate_window_is_a_step() {
    assert_eq!(phase_t(0.29, 0.3, 0.3), 0.0);
    assert_eq!(phase_t(0.3, 0.3, 0.3), 0.0);
    assert_eq!(phase_t(0.31, 0.3, 0.3), 1.0);
    assert!(!phase_t(0.3, 0.3, 0.3).is_nan());
}

#[test]
fn nan_time_maps_to_zero() {
    assert_eq!(phase_t(f64::NAN, 0.0, 1.0), 0.0);
}

#[test]
fn window_validation() {
    assert!(PhaseWindow::new(0.2, 0.6).is_ok());
    assert!(PhaseWindow::new(0.3, 0.3).is_err());
    assert!(PhaseWindow::new(0.6, 0.2).is_err());
    assert!(PhaseWindow::new(-0.1, 0.2).is_err());
    assert!(PhaseWindow::new(0.1, 1.2).is_err());
    assert!(PhaseWindow::new(f64::NAN, 0.2).is_err());
}

#[test]
fn window_eased_uses_local_progress() {
    let w = PhaseWindow::new(0.2, 0.6).unwrap();
    assert!((w.local(0.5) - 0.75).abs() < 1e-12);
    assert_eq!(w.eased(0.4, Ease::InOutCubic), 0.5);
    assert!(w.contains(0.2) && w.contains(0.6) && !w.contains(0.61));
}

#[test]
fn overlap_detection() {
    let a = PhaseWindow::new(0.18, 0.50).unwrap();
    let b = PhaseWindow::new(0.42, 1.0).unwrap();
    let c = PhaseWindow::new(0.52, 0.78).unwrap();
    assert!(a.overlaps(&b));
    assert!(!a.overlaps(&c));
}
