use crate::audio::cues::{CueSheet, SoundSink};
use crate::clock::ceremony::{CeremonyClock, ClockObserver, ClockTick};
use crate::config::scene::SceneConfig;
use crate::effects::memory_layer::MemoryLayer;
use crate::effects::{Effect, EffectKey, Signal};
use crate::foundation::core::{Rect, Viewport};
use crate::foundation::error::PensieveResult;
use crate::host::stage::Stage;
use crate::host::surface::Surface;
use crate::orchestrate::content::ContentTable;
use crate::orchestrate::modules::Modules;
use crate::orchestrate::trigger::{Trigger, VialCork};
use crate::orchestrate::wiring::Wiring;

/// Class on the triggering vial while its ceremony is under way.
pub const RUNNING_CLASS: &str = "is-ceremony-running";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunPhase {
    Idle,
    /// The ceremony clock is broadcasting.
    Running,
    /// The clock ended; the final pose is held and the ring keeps spinning.
    Holding,
    /// The return clock is rewinding the camera and fading the memory out.
    Returning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Return,
}

/// Clock observer that broadcasts one tick to the wired modules and delivers the
/// signals each producer leaves behind to its dependents.
struct Fanout<'a> {
    modules: &'a mut Modules,
    wiring: &'a Wiring,
    stage: &'a mut Stage,
    cues: &'a mut CueSheet,
    sound: &'a mut dyn SoundSink,
    direction: Direction,
    ended: bool,
}

impl Fanout<'_> {
    fn route(&mut self, from: EffectKey) {
        let Some(producer) = self.modules.get_mut(from) else {
            return;
        };
        for signal in producer.drain_signals() {
            match &signal {
                Signal::Visibility {
                    selector,
                    class,
                    shown: true,
                } => {
                    self.stage.add_class(selector, class);
                }
                Signal::Visibility {
                    selector,
                    class,
                    shown: false,
                } => {
                    self.stage.remove_class(selector, class);
                }
                Signal::Wake { .. } => self.cues.observe_signal(&signal, self.sound),
                Signal::Egress(_) => {}
            }
            for &to in self.wiring.dependents(from) {
                if let Some(consumer) = self.modules.get_mut(to) {
                    consumer.accept(&signal);
                }
            }
        }
    }

    fn broadcast(&mut self, t: f64) {
        for &key in self.wiring.order() {
            if let Some(m) = self.modules.get_mut(key) {
                m.apply(t);
            }
            self.route(key);
        }
        self.cues.observe_t(t, self.sound);
    }

    fn rewind(&mut self, p: f64) {
        let level = 1.0 - p;
        if let Some(camera) = &mut self.modules.scene_camera {
            camera.apply_reverse(p);
        }
        for reveal in [&mut self.modules.media_reveal, &mut self.modules.caption_reveal]
            .into_iter()
            .flatten()
        {
            reveal.apply_level(level);
        }
        if let Some(tilt) = &mut self.modules.vial_tilt {
            tilt.apply_local(level);
        }
    }

    /// One frame of every self-driven loop, in wiring order.
    fn frame_loops(&mut self, now_ms: f64) {
        for &key in self.wiring.order() {
            if let Some(m) = self.modules.get_mut(key) {
                if m.is_looping() {
                    m.frame(now_ms);
                }
            }
            self.route(key);
        }
    }

    fn reset_all(&mut self) {
        for &key in self.wiring.order() {
            if let Some(m) = self.modules.get_mut(key) {
                m.reset();
            }
            self.route(key);
        }
    }
}

impl ClockObserver for Fanout<'_> {
    fn on_update(&mut self, tick: ClockTick) {
        match self.direction {
            Direction::Forward => self.broadcast(tick.t),
            Direction::Return => self.rewind(tick.t),
        }
    }

    fn on_end(&mut self) {
        self.ended = true;
    }
}

/// Runs ceremonies on a stage: cork clicks start them, the clock drives every wired
/// module, and a return clock puts the scene back.
///
/// The host feeds it animation-frame timestamps through [`Orchestrator::frame`], which
/// also steps every self-driven effect loop.
pub struct Orchestrator<S: SoundSink> {
    stage: Stage,
    wiring: Wiring,
    modules: Modules,
    layer: Option<MemoryLayer>,
    content: ContentTable,
    cork: Option<VialCork>,
    cues: CueSheet,
    sound: S,
    clock: CeremonyClock,
    return_clock: CeremonyClock,
    phase: RunPhase,
    active: Option<Trigger>,
    last_tick: Option<ClockTick>,
}

/// Build a [`Fanout`] over the orchestrator's fields, leaving the clocks free.
macro_rules! fanout {
    ($self:ident, $direction:expr) => {
        Fanout {
            modules: &mut $self.modules,
            wiring: &$self.wiring,
            stage: &mut $self.stage,
            cues: &mut $self.cues,
            sound: &mut $self.sound,
            direction: $direction,
            ended: false,
        }
    };
}

impl<S: SoundSink> Orchestrator<S> {
    pub fn create(cfg: SceneConfig, mut stage: Stage, sound: S) -> PensieveResult<Self> {
        let wiring = Wiring::resolve(&cfg.wiring)?;
        let modules = Modules::build(&cfg, &wiring, &mut stage)?;
        let layer = MemoryLayer::create(cfg.memory_layer.clone(), &mut stage);
        if layer.is_none() {
            tracing::warn!("memory layer disabled: basin elements missing");
        }
        let cork = VialCork::create(cfg.cork.clone(), &stage);
        Ok(Self {
            stage,
            wiring,
            modules,
            layer,
            content: cfg.content,
            cork,
            cues: CueSheet::new(cfg.cues),
            sound,
            clock: CeremonyClock::create(cfg.clock),
            return_clock: CeremonyClock::create(cfg.return_clock),
            phase: RunPhase::Idle,
            active: None,
            last_tick: None,
        })
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn modules(&self) -> &Modules {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut Modules {
        &mut self.modules
    }

    pub fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    pub fn layer(&self) -> Option<&MemoryLayer> {
        self.layer.as_ref()
    }

    pub fn cues(&self) -> &CueSheet {
        &self.cues
    }

    pub fn sound(&self) -> &S {
        &self.sound
    }

    pub fn active(&self) -> Option<&Trigger> {
        self.active.as_ref()
    }

    /// Last tick broadcast by whichever clock ran.
    pub fn last_tick(&self) -> Option<ClockTick> {
        self.last_tick
    }

    pub fn surface(&self, canvas_id: &str) -> Option<&Surface> {
        self.modules.surface(canvas_id)
    }

    /// A click on `vial`. Returns `true` when it started a ceremony.
    ///
    /// The cork opens first; the ceremony is refused while a clock runs. A click while
    /// holding tears the previous run down before starting the new one.
    #[tracing::instrument(skip(self), fields(phase = ?self.phase))]
    pub fn click(&mut self, vial: &str, on_cork: bool, now_ms: f64) -> bool {
        let Some(cork) = &self.cork else {
            return false;
        };
        let Some(trigger) = cork.click(&mut self.stage, vial, on_cork) else {
            return false;
        };
        match self.phase {
            RunPhase::Running | RunPhase::Returning => {
                tracing::debug!("ceremony already running; trigger ignored");
                return false;
            }
            RunPhase::Holding => self.teardown(),
            RunPhase::Idle => {}
        }
        self.start(trigger, now_ms);
        true
    }

    fn start(&mut self, trigger: Trigger, now_ms: f64) {
        let vial = trigger.trigger_element.as_str();
        self.stage.add_class(vial, RUNNING_CLASS);

        let content = trigger
            .payload_id
            .as_deref()
            .and_then(|id| self.content.lookup(id).map(|c| (id, c)));
        match (content, &mut self.layer) {
            (Some((id, content)), Some(layer)) => {
                layer.mount(&self.stage, id, content);
                for reveal in [&mut self.modules.media_reveal, &mut self.modules.caption_reveal]
                    .into_iter()
                    .flatten()
                {
                    reveal.reset();
                }
            }
            (None, _) => {
                tracing::warn!(payload = ?trigger.payload_id, "no memory content for vial");
            }
            (Some(_), None) => {}
        }

        if let Some(tilt) = &mut self.modules.vial_tilt {
            tilt.bind(&self.stage, vial);
        }
        if let Some(threads) = &mut self.modules.vial_threads {
            threads.bind(vial);
        }

        self.clock.start(now_ms);
        self.phase = RunPhase::Running;
        tracing::info!(
            vial,
            payload = ?trigger.payload_id,
            duration_ms = self.clock.config().total_duration_ms,
            "ceremony start"
        );
        self.active = Some(trigger);
    }

    /// Advance one animation frame: the running clock first, then every self-driven
    /// loop. Returns the tick the clock broadcast, if any.
    pub fn frame(&mut self, now_ms: f64) -> Option<ClockTick> {
        let mut fan = fanout!(self, Direction::Forward);
        let tick = match self.phase {
            RunPhase::Running => self.clock.frame(now_ms, &mut fan),
            RunPhase::Returning => {
                fan.direction = Direction::Return;
                self.return_clock.frame(now_ms, &mut fan)
            }
            RunPhase::Idle | RunPhase::Holding => None,
        };
        fan.frame_loops(now_ms);
        let ended = fan.ended;

        if tick.is_some() {
            self.last_tick = tick;
        }
        if ended {
            match self.phase {
                RunPhase::Running => {
                    self.phase = RunPhase::Holding;
                    tracing::info!(
                        payload = ?self.active.as_ref().and_then(|a| a.payload_id.as_deref()),
                        "ceremony end"
                    );
                }
                RunPhase::Returning => self.teardown(),
                RunPhase::Idle | RunPhase::Holding => {}
            }
        }
        tick
    }

    /// Start the return to the vial shelf. Only valid while holding.
    #[tracing::instrument(skip(self))]
    pub fn begin_return(&mut self, now_ms: f64) -> bool {
        if self.phase != RunPhase::Holding {
            return false;
        }
        self.return_clock.start(now_ms);
        self.phase = RunPhase::Returning;
        tracing::debug!("ceremony returning");
        true
    }

    /// Stop both clocks, reset every module, unmount the memory and clear the running
    /// class. The scene is left as it was before the first click.
    #[tracing::instrument(skip(self))]
    pub fn teardown(&mut self) {
        self.clock.stop();
        self.return_clock.stop();
        {
            let mut fan = fanout!(self, Direction::Forward);
            fan.reset_all();
        }
        if let Some(layer) = &mut self.layer {
            layer.clear();
        }
        if let Some(tilt) = &mut self.modules.vial_tilt {
            tilt.unbind();
        }
        if let Some(active) = self.active.take() {
            self.stage
                .remove_class(&active.trigger_element, RUNNING_CLASS);
        }
        self.cues.reset(&mut self.sound);
        if self.phase != RunPhase::Idle {
            tracing::info!("ceremony torn down");
        }
        self.phase = RunPhase::Idle;
    }

    /// A viewport change: every module and the memory layer recompute their geometry.
    #[tracing::instrument(skip(self))]
    pub fn resize(&mut self, viewport: Viewport) {
        self.stage.set_viewport(viewport);
        self.relayout();
    }

    /// A container changed size without the viewport changing.
    pub fn set_rect(&mut self, selector: &str, rect: Rect) -> bool {
        let changed = self.stage.set_rect(selector, rect);
        if changed {
            self.relayout();
        }
        changed
    }

    /// Dispatch a resize to every registered listener, in registration order.
    fn relayout(&mut self) {
        let owners: Vec<String> = self
            .stage
            .resize_listeners()
            .map(|(_, owner)| owner.to_owned())
            .collect();
        for owner in owners {
            if owner == MemoryLayer::LISTENER {
                if let Some(layer) = &mut self.layer {
                    layer.update_layout(&self.stage);
                }
                continue;
            }
            let Some(key) = EffectKey::parse(&owner) else {
                tracing::debug!(%owner, "resize listener without a module");
                continue;
            };
            if let Some(m) = self.modules.get_mut(key) {
                m.resize(&self.stage);
            }
        }
    }

    /// Release everything the modules registered on the stage.
    pub fn destroy(&mut self) {
        self.teardown();
        for &key in self.wiring.order() {
            if let Some(m) = self.modules.get_mut(key) {
                m.destroy(&mut self.stage);
            }
        }
        if let Some(layer) = &mut self.layer {
            layer.destroy(&mut self.stage);
        }
    }

    pub fn snapshot(&self) -> serde_json::Value {
        let modules: serde_json::Map<String, serde_json::Value> = self
            .wiring
            .order()
            .iter()
            .filter_map(|&k| self.modules.get(k).map(|m| (k.to_string(), m.snapshot())))
            .collect();
        serde_json::json!({
            "phase": self.phase,
            "tick": self.last_tick,
            "active": self.active,
            "modules": modules,
            "layer": self.layer.as_ref().map(MemoryLayer::snapshot),
            "ambience": self.cues.ambience(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/ceremony.rs"]
mod tests;
