use super::*;
use crate::foundation::core::{Rect, Viewport};
use crate::foundation::error::PensieveError;

fn page() -> Stage {
    Stage::pensieve_page(Viewport::new(1000.0, 500.0, 2.0).unwrap())
}

#[test]
fn creates_and_sizes_backing_store() {
    let mut stage = page();
    let water = BasinWater::create(BasinWaterOptions::default(), &mut stage)
        .unwrap()
        .unwrap();
    // Basin canvas is 800 x 420 CSS px at DPR 2.
    assert_eq!(water.surface().unwrap().backing_size(), (1600, 840));
    assert_eq!(stage.resize_listener_count(), 1);
    assert_eq!(water.program().value("u_normal"), Some(UniformValue::Int(1)));
}

#[test]
fn missing_canvas_or_webgl_is_none() {
    let mut stage = page();
    let opts = BasinWaterOptions {
        canvas_id: "particles".to_owned(),
        ..BasinWaterOptions::default()
    };
    assert!(BasinWater::create(opts, &mut stage).unwrap().is_none());

    let opts = BasinWaterOptions {
        canvas_id: "nope".to_owned(),
        ..BasinWaterOptions::default()
    };
    assert!(BasinWater::create(opts, &mut stage).unwrap().is_none());
    assert_eq!(stage.resize_listener_count(), 0);
}

#[test]
fn broken_shader_is_a_hard_error_and_frees_the_canvas() {
    let mut stage = page();
    let err = BasinWater::create_with_shaders(
        BasinWaterOptions::default(),
        &mut stage,
        WATER_VERT,
        "void main() { gl_FragColor = vec4(1.0); ",
    )
    .unwrap_err();
    assert!(matches!(err, PensieveError::Shader(_)));

    // A shader without the expected uniforms also fails.
    let err = BasinWater::create_with_shaders(
        BasinWaterOptions::default(),
        &mut stage,
        WATER_VERT,
        "varying vec2 v_uv;\nvoid main() { gl_FragColor = vec4(v_uv, 0.0, 1.0); }",
    )
    .unwrap_err();
    assert!(matches!(err, PensieveError::Shader(_)));

    assert!(
        BasinWater::create(BasinWaterOptions::default(), &mut stage)
            .unwrap()
            .is_some()
    );
}

#[test]
fn wake_is_coerced() {
    let mut stage = page();
    let mut water = BasinWater::create(BasinWaterOptions::default(), &mut stage)
        .unwrap()
        .unwrap();
    water.set_wake(0.4);
    assert_eq!(water.wake(), 0.4);
    water.set_wake(f64::NAN);
    assert_eq!(water.wake(), 0.0);
    water.set_wake(7.0);
    assert_eq!(water.wake(), 1.0);
    water.accept(&Signal::Wake { level: -3.0 });
    assert_eq!(water.wake(), 0.0);
}

#[test]
fn visibility_starts_the_loop_and_frames_upload_uniforms() {
    let mut stage = page();
    let mut water = BasinWater::create(BasinWaterOptions::default(), &mut stage)
        .unwrap()
        .unwrap();
    assert!(!water.is_looping());
    water.accept(&Signal::Visibility {
        selector: ".scene".to_owned(),
        class: "basin-visible".to_owned(),
        shown: true,
    });
    assert!(water.is_looping());

    water.accept(&Signal::Wake { level: 0.5 });
    water.frame(1000.0);
    water.frame(1500.0);
    assert_eq!(water.draw_count(), 2);
    assert_eq!(water.program().value("u_time"), Some(UniformValue::Float(0.5)));
    assert_eq!(water.program().value("u_wake"), Some(UniformValue::Float(0.5)));
    assert_eq!(
        water.program().value("u_res"),
        Some(UniformValue::Vec2([1600.0, 840.0]))
    );

    water.stop();
    water.frame(2000.0);
    assert_eq!(water.draw_count(), 2);
}

#[test]
fn texture_wrap_depends_on_power_of_two() {
    let mut stage = page();
    let mut water = BasinWater::create(BasinWaterOptions::default(), &mut stage)
        .unwrap()
        .unwrap();
    water.texture_loaded(TextureUnit::Base, 1024, 512);
    water.texture_loaded(TextureUnit::Normal, 1000, 512);
    assert_eq!(water.texture(TextureUnit::Base).wrap, TextureWrap::Repeat);
    assert_eq!(water.texture(TextureUnit::Normal).wrap, TextureWrap::ClampToEdge);

    water.texture_failed(TextureUnit::Normal);
    assert_eq!(water.texture(TextureUnit::Normal).state, TextureState::Failed);
    assert_eq!(water.texture(TextureUnit::Normal).fallback, NORMAL_FALLBACK);
}

#[test]
fn resize_follows_canvas_rect() {
    let mut stage = page();
    let mut water = BasinWater::create(BasinWaterOptions::default(), &mut stage)
        .unwrap()
        .unwrap();
    stage.set_canvas_rect("basin-water", Rect::new(0.0, 0.0, 300.0, 200.0));
    water.resize(&stage);
    assert_eq!(water.surface().unwrap().backing_size(), (600, 400));
}

#[test]
fn wake_brightens_the_glow() {
    let mut stage = page();
    let water = BasinWater::create(BasinWaterOptions::default(), &mut stage)
        .unwrap()
        .unwrap();
    let calm = water.uniforms();
    let woken = WaterUniforms { wake: 1.0, ..calm };
    let base = water.texture(TextureUnit::Base).fallback_rgb();
    let normal = water.texture(TextureUnit::Normal).fallback_rgb();
    let a = calm.shade([0.5, 0.72], base, normal);
    let b = woken.shade([0.5, 0.72], base, normal);
    for i in 0..3 {
        assert!(a[i].is_finite() && a[i] >= 0.0);
        assert!(b[i] > a[i]);
    }
}

#[test]
fn destroy_releases_canvas_and_listener() {
    let mut stage = page();
    let mut water = BasinWater::create(BasinWaterOptions::default(), &mut stage)
        .unwrap()
        .unwrap();
    water.destroy(&mut stage);
    assert_eq!(stage.resize_listener_count(), 0);
    assert!(stage.claim_webgl_canvas("basin-water").is_some());
}
