use super::*;

#[test]
fn clamp01_maps_nan_to_zero() {
    assert_eq!(clamp01(f64::NAN), 0.0);
    assert_eq!(clamp01(-3.0), 0.0);
    assert_eq!(clamp01(3.0), 1.0);
    assert_eq!(clamp01(0.25), 0.25);
}

#[test]
fn coerce_unit_rejects_non_finite() {
    assert_eq!(coerce_unit(f64::INFINITY), 0.0);
    assert_eq!(coerce_unit(f64::NEG_INFINITY), 0.0);
    assert_eq!(coerce_unit(1.5), 1.0);
    assert_eq!(coerce_unit(0.4), 0.4);
}

#[test]
fn lerp_angle_takes_short_way_round() {
    let a = 0.1;
    let b = TAU - 0.1;
    let out = lerp_angle(a, b, 0.5);
    assert!((out - 0.0).abs() < 1e-9, "got {out}");
}

#[test]
fn rng_is_deterministic_and_in_range() {
    let mut a = Rng64::new(7);
    let mut b = Rng64::new(7);
    for _ in 0..256 {
        let x = a.next_f64_01();
        assert_eq!(x, b.next_f64_01());
        assert!((0.0..1.0).contains(&x));
    }
}

#[test]
fn range_inclusive_hits_both_ends() {
    let mut rng = Rng64::new(1);
    let mut seen_min = false;
    let mut seen_max = false;
    for _ in 0..512 {
        let v = rng.range_inclusive(6, 10);
        assert!((6..=10).contains(&v));
        seen_min |= v == 6;
        seen_max |= v == 10;
    }
    assert!(seen_min && seen_max);
    assert_eq!(rng.range_inclusive(4, 4), 4);
}
