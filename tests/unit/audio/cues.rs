use super::*;

fn sheet() -> CueSheet {
    serde_json::from_value::<Vec<Cue>>(serde_json::json!([
        { "on": "timeline", "at": 0.0, "action": "play", "key": "cork" },
        { "on": "wake", "at": 0.32, "action": "playAmbience", "key": "hum", "fadeInSec": 0.8 },
        { "on": "timeline", "at": 0.9, "action": "stopAmbience", "key": "hum" }
    ]))
    .map(CueSheet::new)
    .unwrap()
}

#[test]
fn cues_parse_from_flat_json() {
    let s = sheet();
    assert_eq!(s.cues().len(), 3);
    assert_eq!(s.cues()[1].trigger, CueTrigger::Wake { at: 0.32 });
    assert_eq!(
        s.cues()[1].action,
        CueAction::PlayAmbience {
            key: "hum".to_owned(),
            volume: None,
            fade_in_sec: Some(0.8),
        }
    );
}

#[test]
fn wake_cue_fires_once_per_upward_crossing() {
    let mut s = sheet();
    let mut sound = RecordingSound::default();
    for level in [0.1, 0.31, 0.32, 0.5, 0.9] {
        s.observe_signal(&Signal::Wake { level }, &mut sound);
    }
    assert_eq!(sound.calls.len(), 1);
    assert_eq!(s.ambience(), &["hum".to_owned()]);

    // Dropping below re-arms.
    s.observe_signal(&Signal::Wake { level: 0.0 }, &mut sound);
    s.observe_signal(&Signal::Wake { level: 0.4 }, &mut sound);
    assert_eq!(sound.calls.len(), 2);
}

#[test]
fn timeline_cues_ignore_wake_and_nan() {
    let mut s = sheet();
    let mut sound = RecordingSound::default();
    s.observe_t(f64::NAN, &mut sound);
    assert!(sound.calls.is_empty());

    s.observe_t(0.0, &mut sound);
    s.observe_t(0.5, &mut sound);
    assert_eq!(
        sound.calls,
        vec![SoundCall::Play {
            key: "cork".to_owned(),
            volume: None
        }]
    );
    s.observe_signal(
        &Signal::Visibility {
            selector: ".scene".to_owned(),
            class: "basin-visible".to_owned(),
            shown: true,
        },
        &mut sound,
    );
    assert_eq!(sound.calls.len(), 1);
}

#[test]
fn reset_fades_out_ambience_and_rearms() {
    let mut s = sheet();
    let mut sound = RecordingSound::default();
    s.observe_t(0.2, &mut sound);
    s.observe_signal(&Signal::Wake { level: 1.0 }, &mut sound);
    s.reset(&mut sound);
    assert!(s.ambience().is_empty());
    assert_eq!(
        sound.calls.last(),
        Some(&SoundCall::StopAmbience {
            key: "hum".to_owned(),
            fade_out_sec: None
        })
    );

    sound.calls.clear();
    s.observe_t(0.2, &mut sound);
    assert_eq!(sound.calls.len(), 1);
}

#[test]
fn stop_cue_forgets_the_ambience() {
    let mut s = sheet();
    let mut sound = RecordingSound::default();
    s.observe_signal(&Signal::Wake { level: 0.5 }, &mut sound);
    s.observe_t(0.95, &mut sound);
    assert!(s.ambience().is_empty());
    s.reset(&mut sound);
    // hum start, cork, hum stop; reset has nothing left to stop.
    assert_eq!(sound.calls.len(), 3);
}
