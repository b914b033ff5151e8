use dojo_schema::{SessionReport, SessionSettings};
use log::{info, warn};

use crate::gameplay::session::{Session, SessionView, TapOutcome};
use crate::gameplay::TimeAnchor;
use crate::input::events::InputEvent;
use crate::store::{load_offset, OffsetStore, DEFAULT_OFFSET_KEY};
use crate::time::AudioClock;
use crate::DojoResult;

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Started(TimeAnchor),
    Tap(TapOutcome),
    Stopped,
    ModeChanged(bool),
    /// Event that does not apply in the current state, e.g. start while running.
    Ignored,
}

/// Wires a [`Session`] to an audio clock and an offset store.
///
/// All calls must come from one thread; other threads feed it through an
/// `InputQueue`.
pub struct Trainer<C: AudioClock, S: OffsetStore> {
    clock: C,
    store: S,
    offset_key: String,
    session: Session,
}

impl<C: AudioClock, S: OffsetStore> Trainer<C, S> {
    pub fn new(clock: C, store: S, settings: SessionSettings) -> DojoResult<Self> {
        Self::with_offset_key(clock, store, settings, DEFAULT_OFFSET_KEY)
    }

    /// Fails only if the clock cannot be brought up.
    pub fn with_offset_key(clock: C, store: S, settings: SessionSettings, offset_key: &str) -> DojoResult<Self> {
        clock.resume()?;
        let offset = load_offset(&store, offset_key);
        Ok(Self {
            clock,
            store,
            offset_key: offset_key.to_string(),
            session: Session::new(settings, offset),
        })
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn start(&mut self) -> TimeAnchor {
        self.session.start(self.clock.now())
    }

    pub fn stop(&mut self) {
        self.session.stop();
        self.clock.cancel_clicks();
    }

    pub fn handle(&mut self, event: InputEvent) -> DojoResult<Response> {
        match event {
            InputEvent::Tap { timestamp } if !self.session.is_running() => {
                // A tap while idle is a start request, never a judged tap.
                Ok(Response::Started(self.session.start(timestamp)))
            }
            InputEvent::Tap { timestamp } => {
                let outcome = self.session.tap(timestamp);
                match outcome {
                    TapOutcome::Calibrated { offset_ms, .. } => {
                        self.store.set_offset(&self.offset_key, offset_ms)?;
                    }
                    TapOutcome::SessionOver => self.clock.cancel_clicks(),
                    _ => {}
                }
                Ok(Response::Tap(outcome))
            }
            InputEvent::Start { timestamp } => {
                if self.session.is_running() {
                    return Ok(Response::Ignored);
                }
                Ok(Response::Started(self.session.start(timestamp)))
            }
            InputEvent::Stop => {
                if !self.session.is_running() {
                    return Ok(Response::Ignored);
                }
                self.stop();
                Ok(Response::Stopped)
            }
            InputEvent::SetMode(mode) => {
                let changed = self.session.set_mode(mode);
                if !changed {
                    warn!("mode change to {mode} refused while a session is running");
                }
                Ok(Response::ModeChanged(changed))
            }
        }
    }

    /// One scheduler tick: forwards due clicks to the clock. Returns how many
    /// clicks were scheduled.
    pub fn tick(&mut self) -> usize {
        let was_running = self.session.is_running();
        let clicks = self.session.tick(self.clock.now());
        for click in &clicks {
            self.clock.schedule_click(click.time, click.accented);
        }
        if was_running && !self.session.is_running() {
            info!("session time is up");
            self.clock.cancel_clicks();
        }
        clicks.len()
    }

    pub fn view(&self) -> SessionView {
        self.session.view(self.clock.now())
    }

    pub fn report(&self) -> SessionReport {
        let score = self.session.score();
        SessionReport {
            settings: self.session.settings().clone(),
            score: score.score,
            max_combo: score.max_combo,
            judged_taps: score.tier_counts.total(),
            tier_counts: score.tier_counts,
            stats: self.session.judge().stats(),
            latency_offset_ms: self.session.latency_offset_ms(),
        }
    }
}
