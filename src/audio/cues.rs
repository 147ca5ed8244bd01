use crate::effects::Signal;

/// Receiver of fire-and-forget sound calls. Mixing, decoding and unlock handling live
/// behind this trait; the engine only decides when to call it.
pub trait SoundSink {
    fn play(&mut self, key: &str, volume: Option<f64>);
    fn play_ambience(&mut self, key: &str, volume: Option<f64>, fade_in_sec: Option<f64>);
    fn stop_ambience(&mut self, key: &str, fade_out_sec: Option<f64>);
}

/// What a cue listens to.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "on", rename_all = "camelCase")]
pub enum CueTrigger {
    /// Global timeline value reaching `at`.
    Timeline { at: f64 },
    /// Basin wake level reaching `at`.
    Wake { at: f64 },
}

impl CueTrigger {
    fn threshold(&self) -> f64 {
        match self {
            Self::Timeline { at } | Self::Wake { at } => *at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CueAction {
    #[serde(rename_all = "camelCase")]
    Play {
        key: String,
        #[serde(default)]
        volume: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    PlayAmbience {
        key: String,
        #[serde(default)]
        volume: Option<f64>,
        #[serde(default)]
        fade_in_sec: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    StopAmbience {
        key: String,
        #[serde(default)]
        fade_out_sec: Option<f64>,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cue {
    #[serde(flatten)]
    pub trigger: CueTrigger,
    #[serde(flatten)]
    pub action: CueAction,
}

/// Threshold hooks that fire each cue once per upward crossing.
///
/// A cue re-arms when its input falls back below the threshold and on
/// [`CueSheet::reset`], which also fades out every ambience the sheet started.
#[derive(Clone, Debug, Default)]
pub struct CueSheet {
    cues: Vec<Cue>,
    armed: Vec<bool>,
    ambience: Vec<String>,
}

impl CueSheet {
    pub fn new(cues: Vec<Cue>) -> Self {
        let armed = vec![true; cues.len()];
        Self {
            cues,
            armed,
            ambience: Vec::new(),
        }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn observe_t(&mut self, t: f64, sink: &mut dyn SoundSink) {
        self.observe(|trig| matches!(trig, CueTrigger::Timeline { .. }), t, sink);
    }

    pub fn observe_signal(&mut self, signal: &Signal, sink: &mut dyn SoundSink) {
        if let Signal::Wake { level } = signal {
            self.observe(|trig| matches!(trig, CueTrigger::Wake { .. }), *level, sink);
        }
    }

    /// Ambience keys currently playing because of this sheet.
    pub fn ambience(&self) -> &[String] {
        &self.ambience
    }

    pub fn reset(&mut self, sink: &mut dyn SoundSink) {
        for key in self.ambience.drain(..) {
            sink.stop_ambience(&key, None);
        }
        self.armed.iter_mut().for_each(|a| *a = true);
    }

    fn observe(&mut self, wants: impl Fn(&CueTrigger) -> bool, value: f64, sink: &mut dyn SoundSink) {
        if !value.is_finite() {
            return;
        }
        for (cue, armed) in self.cues.iter().zip(self.armed.iter_mut()) {
            if !wants(&cue.trigger) {
                continue;
            }
            let at = cue.trigger.threshold();
            if value < at {
                *armed = true;
                continue;
            }
            if !*armed {
                continue;
            }
            *armed = false;
            tracing::debug!(action = ?cue.action, value, "sound cue");
            match &cue.action {
                CueAction::Play { key, volume } => sink.play(key, *volume),
                CueAction::PlayAmbience {
                    key,
                    volume,
                    fade_in_sec,
                } => {
                    sink.play_ambience(key, *volume, *fade_in_sec);
                    if !self.ambience.contains(key) {
                        self.ambience.push(key.clone());
                    }
                }
                CueAction::StopAmbience { key, fade_out_sec } => {
                    sink.stop_ambience(key, *fade_out_sec);
                    self.ambience.retain(|k| k != key);
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum SoundCall {
    Play {
        key: String,
        volume: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    PlayAmbience {
        key: String,
        volume: Option<f64>,
        fade_in_sec: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    StopAmbience {
        key: String,
        fade_out_sec: Option<f64>,
    },
}

/// Sink that only keeps a log of the calls it received.
#[derive(Clone, Debug, Default)]
pub struct RecordingSound {
    pub calls: Vec<SoundCall>,
}

impl SoundSink for RecordingSound {
    fn play(&mut self, key: &str, volume: Option<f64>) {
        self.calls.push(SoundCall::Play {
            key: key.to_owned(),
            volume,
        });
    }

    fn play_ambience(&mut self, key: &str, volume: Option<f64>, fade_in_sec: Option<f64>) {
        self.calls.push(SoundCall::PlayAmbience {
            key: key.to_owned(),
            volume,
            fade_in_sec,
        });
    }

    fn stop_ambience(&mut self, key: &str, fade_out_sec: Option<f64>) {
        self.calls.push(SoundCall::StopAmbience {
            key: key.to_owned(),
            fade_out_sec,
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/cues.rs"]
mod tests;
