use super::*;
use crate::foundation::core::Viewport;

fn field(viewport: Viewport) -> (Stage, AmbientParticles) {
    let mut stage = Stage::pensieve_page(viewport);
    let f = AmbientParticles::create(
        AmbientParticlesOptions {
            density_factor: 0.00012,
            ..AmbientParticlesOptions::default()
        },
        &mut stage,
    )
    .unwrap()
    .unwrap();
    (stage, f)
}

fn viewport(w: f64, h: f64) -> Viewport {
    Viewport::new(w, h, 1.0).unwrap()
}

#[test]
fn population_follows_area_up_to_the_cap() {
    let (_stage, big) = field(Viewport::default());
    assert_eq!(big.particle_count(), 70);
    assert!(big.is_looping());

    let (_stage, small) = field(viewport(300.0, 200.0));
    assert_eq!(small.particle_count(), 7);
}

#[test]
fn resize_keeps_an_existing_field() {
    let (mut stage, mut f) = field(viewport(300.0, 200.0));
    stage.set_viewport(Viewport::default());
    f.resize(&stage);
    assert_eq!(f.particle_count(), 7);
    assert_eq!(f.surface().unwrap().css_size(), (1280.0, 800.0));
}

#[test]
fn empty_field_idles_until_a_resize_seeds_it() {
    let (mut stage, mut f) = field(viewport(10.0, 10.0));
    assert_eq!(f.particle_count(), 0);
    assert!(!f.is_looping());

    stage.set_viewport(Viewport::default());
    f.resize(&stage);
    assert_eq!(f.particle_count(), 70);
    assert!(f.is_looping());
}

#[test]
fn motes_recycle_at_the_top() {
    let (_stage, mut f) = field(viewport(300.0, 200.0));
    let mut now = 0.0;
    // Long enough for the slowest mote to cross the canvas twice.
    while now < 60_000.0 {
        f.frame(now);
        now += 16.0;
    }
    assert_eq!(f.particle_count(), 7);
    let cmds = f.surface().unwrap().commands();
    assert_eq!(cmds.len(), 7);
    for cmd in cmds {
        let DrawCmd::Circle { center, radius, .. } = cmd else {
            panic!("unexpected draw {cmd:?}");
        };
        assert!(center.y >= -radius - 1e-9 && center.y - radius <= 200.0 + 1e-9);
    }
}

#[test]
fn missing_canvas_yields_none() {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let made = AmbientParticles::create(
        AmbientParticlesOptions {
            canvas_id: "nope".to_owned(),
            ..AmbientParticlesOptions::default()
        },
        &mut stage,
    )
    .unwrap();
    assert!(made.is_none());
    assert_eq!(stage.resize_listener_count(), 0);
}
