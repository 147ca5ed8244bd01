use super::*;
use crate::audio::cues::{RecordingSound, SoundCall};
use crate::effects::circle_formation::FormationState;
use crate::host::frame::FrameDriver;

fn page() -> Orchestrator<RecordingSound> {
    Orchestrator::create(
        SceneConfig::default(),
        Stage::pensieve_page(Viewport::default()),
        RecordingSound::default(),
    )
    .unwrap()
}

/// Step frames until the orchestrator leaves `phase`, returning the last timestamp.
fn run_while(o: &mut Orchestrator<RecordingSound>, driver: &mut FrameDriver, phase: RunPhase) -> f64 {
    for _ in 0..2000 {
        if o.phase() != phase {
            break;
        }
        o.frame(driver.next_frame());
    }
    assert_ne!(o.phase(), phase, "phase never ended");
    driver.now()
}

#[test]
fn idle_frames_only_step_ambient_loops() {
    let mut o = page();
    assert_eq!(o.phase(), RunPhase::Idle);
    assert!(o.frame(16.0).is_none());
    assert!(o.modules().vials_orbit.as_ref().unwrap().is_looping());
    assert!(o.modules().ambient_particles.as_ref().unwrap().is_looping());
    assert!(!o.modules().basin_water.as_ref().unwrap().is_looping());
    assert!(o.sound().calls.is_empty());
}

#[test]
fn full_ceremony_runs_holds_and_returns() {
    let mut o = page();
    let mut driver = FrameDriver::new(60.0).starting_at(1000.0);

    assert!(!o.click("#vial-1", false, driver.now()));
    assert!(o.click("#vial-1", true, driver.now()));
    assert_eq!(o.phase(), RunPhase::Running);
    assert!(o.stage().query("#vial-1").unwrap().has_class(RUNNING_CLASS));
    assert_eq!(o.layer().unwrap().mounted().unwrap().caption, "Caption number 1");
    assert_eq!(o.active().unwrap().payload_id.as_deref(), Some("1"));

    // One ceremony at a time.
    o.frame(driver.next_frame());
    assert!(!o.click("#vial-2", true, driver.now()));
    assert_eq!(o.active().unwrap().trigger_element, "#vial-1");

    run_while(&mut o, &mut driver, RunPhase::Running);
    assert_eq!(o.phase(), RunPhase::Holding);
    let tick = o.last_tick().unwrap();
    assert_eq!(tick.raw_t, 1.0);
    assert_eq!(tick.t, 1.0);

    {
        let m = o.modules();
        let camera = m.scene_camera.as_ref().unwrap();
        assert!((camera.camera_y() - camera.travel_px()).abs() < 1e-9);
        assert!(m.media_reveal.as_ref().unwrap().is_completed());
        assert!(m.caption_reveal.as_ref().unwrap().is_completed());
        assert_eq!(m.vial_tilt.as_ref().unwrap().pose().tilt_deg, 20.0);
        assert_ne!(m.circle_formation.as_ref().unwrap().state(), FormationState::Idle);
        assert!(m.basin_water.as_ref().unwrap().is_looping());
        assert_eq!(m.basin_water.as_ref().unwrap().wake(), 1.0);
    }
    assert!(o.stage().query(".scene").unwrap().has_class("basin-visible"));
    let calls = &o.sound().calls;
    assert_eq!(
        calls[0],
        SoundCall::Play {
            key: "cork".to_owned(),
            volume: None
        }
    );
    assert_eq!(calls.len(), 3);
    assert_eq!(o.cues().ambience(), &["basin".to_owned()]);

    // Holding keeps the ring spinning.
    for _ in 0..30 {
        o.frame(driver.next_frame());
    }
    assert_eq!(o.phase(), RunPhase::Holding);
    assert!(o.modules().circle_formation.as_ref().unwrap().is_looping());

    assert!(o.begin_return(driver.now()));
    assert!(!o.begin_return(driver.now()));
    run_while(&mut o, &mut driver, RunPhase::Returning);
    assert_eq!(o.phase(), RunPhase::Idle);

    let m = o.modules();
    assert_eq!(m.scene_camera.as_ref().unwrap().camera_y(), 0.0);
    assert!(m.vial_tilt.as_ref().unwrap().vial().is_none());
    assert_eq!(m.circle_formation.as_ref().unwrap().state(), FormationState::Idle);
    assert!(!m.basin_water.as_ref().unwrap().is_looping());
    assert!(!m.media_reveal.as_ref().unwrap().is_completed());
    assert!(o.layer().unwrap().is_hidden());
    assert!(o.active().is_none());
    assert!(!o.stage().query("#vial-1").unwrap().has_class(RUNNING_CLASS));
    assert!(!o.stage().query(".scene").unwrap().has_class("basin-visible"));
    assert!(o.cues().ambience().is_empty());
    assert_eq!(
        o.sound().calls.last(),
        Some(&SoundCall::StopAmbience {
            key: "basin".to_owned(),
            fade_out_sec: None
        })
    );
}

#[test]
fn return_fades_reveals_and_rewinds_camera() {
    let mut o = page();
    let mut driver = FrameDriver::new(60.0);
    assert!(o.click("#vial-3", true, driver.now()));
    run_while(&mut o, &mut driver, RunPhase::Running);

    assert!(o.begin_return(driver.now()));
    // Roughly halfway through the return clock.
    for _ in 0..54 {
        o.frame(driver.next_frame());
    }
    assert_eq!(o.phase(), RunPhase::Returning);
    let m = o.modules();
    let camera = m.scene_camera.as_ref().unwrap();
    assert!(camera.camera_y() > 0.0 && camera.camera_y() < camera.travel_px());
    let opacity = m.media_reveal.as_ref().unwrap().visual().opacity;
    assert!(opacity > 0.0 && opacity < 1.0);
    let tilt = m.vial_tilt.as_ref().unwrap().pose().tilt_deg;
    assert!(tilt > 0.0 && tilt < 20.0);
}

#[test]
fn click_while_holding_restarts_on_the_new_vial() {
    let mut o = page();
    let mut driver = FrameDriver::new(60.0);
    assert!(o.click("#vial-1", true, driver.now()));
    run_while(&mut o, &mut driver, RunPhase::Running);
    assert_eq!(o.phase(), RunPhase::Holding);

    assert!(o.click("#vial-2", true, driver.now()));
    assert_eq!(o.phase(), RunPhase::Running);
    assert!(!o.stage().query("#vial-1").unwrap().has_class(RUNNING_CLASS));
    assert!(o.stage().query("#vial-2").unwrap().has_class(RUNNING_CLASS));
    assert_eq!(o.layer().unwrap().mounted().unwrap().id, "2");
    assert_eq!(o.modules().vial_tilt.as_ref().unwrap().vial(), Some("#vial-2"));
    assert!(!o.modules().media_reveal.as_ref().unwrap().is_completed());
}

#[test]
fn cork_stays_open_after_a_run() {
    let mut o = page();
    let mut driver = FrameDriver::new(60.0);
    assert!(o.click("#vial-1", true, driver.now()));
    run_while(&mut o, &mut driver, RunPhase::Running);
    o.teardown();
    assert_eq!(o.phase(), RunPhase::Idle);
    assert!(!o.click("#vial-1", true, driver.now()));
}

#[test]
fn resize_reaches_every_module() {
    let mut o = page();
    o.resize(Viewport::new(640.0, 400.0, 2.0).unwrap());
    let camera = o.modules().scene_camera.as_ref().unwrap();
    assert_eq!(camera.travel_px(), 400.0);
    let (w, h) = o.surface("particles").unwrap().css_size();
    assert_eq!((w, h), (640.0, 400.0));
    assert_eq!(o.surface("particles").unwrap().backing_size(), (1280, 800));
}

#[test]
fn destroy_releases_every_listener() {
    let mut o = page();
    assert!(o.stage().resize_listener_count() > 0);
    assert!(o.click("#vial-1", true, 0.0));
    o.destroy();
    assert_eq!(o.phase(), RunPhase::Idle);
    assert_eq!(o.stage().resize_listener_count(), 0);
}

#[test]
fn snapshot_lists_modules_in_update_order() {
    let mut o = page();
    o.click("#vial-2", true, 0.0);
    o.frame(100.0);
    let snap = o.snapshot();
    assert_eq!(snap["phase"], "running");
    assert_eq!(snap["active"]["payloadId"], "2");
    let modules = snap["modules"].as_object().unwrap();
    assert_eq!(modules.len(), 13);
    assert!(modules.contains_key("wisp-bridge"));
    assert!(snap["tick"]["t"].as_f64().unwrap() > 0.0);
}

#[test]
fn bad_wiring_fails_creation() {
    let mut cfg = SceneConfig::default();
    cfg.wiring.retain(|e| e.key != EffectKey::VialThreads);
    let made = Orchestrator::create(
        cfg,
        Stage::pensieve_page(Viewport::default()),
        RecordingSound::default(),
    );
    assert!(made.is_err());
}

#[test]
fn resize_reaches_only_registered_listeners() {
    let mut o = page();
    let camera_listener = o.modules().scene_camera.as_ref().unwrap().listener().unwrap();
    let before = o.modules().scene_camera.as_ref().unwrap().travel_px();
    assert!(o.stage.unlisten(camera_listener));

    o.resize(Viewport::new(640.0, 400.0, 1.0).unwrap());
    assert_eq!(o.modules().scene_camera.as_ref().unwrap().travel_px(), before);
    let (w, _) = o.surface("particles").unwrap().css_size();
    assert_eq!(w, 640.0);
    assert_eq!(EffectKey::parse("scene-camera"), Some(EffectKey::SceneCamera));
    assert_eq!(EffectKey::parse(MemoryLayer::LISTENER), None);
}
