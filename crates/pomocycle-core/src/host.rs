//! Glue between the cycle engine and the outside world.
//!
//! [`TimerHost`] owns one engine and one session store. Every command is
//! forwarded to the engine and the returned events are applied in order:
//! state is persisted (or cleared), segment endings go to the notification
//! sink, and the display sink is refreshed. Failures in any of these are
//! logged and never reach the engine.

use tracing::{info, warn};

use crate::error::ValidationError;
use crate::events::Event;
use crate::notify::{DisplaySink, NotificationSink};
use crate::storage::session::Reconciliation;
use crate::storage::{KeyValueStore, SessionStore};
use crate::timer::{Clock, CycleEngine, Mode, Settings, Snapshot};

pub struct TimerHost<C: Clock, S: KeyValueStore> {
    engine: CycleEngine<C>,
    store: SessionStore<S>,
    goal_text: String,
    loaded_as: Reconciliation,
    notifier: Box<dyn NotificationSink>,
    display: Box<dyn DisplaySink>,
}

impl<C: Clock, S: KeyValueStore> TimerHost<C, S> {
    /// Load the persisted session and rebuild the engine from it.
    ///
    /// A session saved while running resumes immediately.
    pub fn open(
        store: S,
        clock: C,
        notifier: Box<dyn NotificationSink>,
        display: Box<dyn DisplaySink>,
    ) -> Self {
        let (mut host, events) = Self::load(store, clock, notifier, display);
        host.settle(&events);
        host
    }

    /// Like [`open`](Self::open), then start the countdown. The display is
    /// drawn once for the combined restore and start.
    pub fn open_running(
        store: S,
        clock: C,
        notifier: Box<dyn NotificationSink>,
        display: Box<dyn DisplaySink>,
    ) -> Self {
        let (mut host, mut events) = Self::load(store, clock, notifier, display);
        events.extend(host.engine.start());
        host.settle(&events);
        host
    }

    fn load(
        store: S,
        clock: C,
        notifier: Box<dyn NotificationSink>,
        display: Box<dyn DisplaySink>,
    ) -> (Self, Vec<Event>) {
        let store = SessionStore::new(store);
        let loaded = store.load();
        let (engine, events) = CycleEngine::restore(loaded.settings, loaded.state, clock);

        let host = Self {
            engine,
            store,
            goal_text: loaded.goal_text,
            loaded_as: loaded.reconciliation,
            notifier,
            display,
        };
        if host.loaded_as != Reconciliation::CycleFinished {
            host.persist_state();
        }
        (host, events)
    }

    pub fn engine(&self) -> &CycleEngine<C> {
        &self.engine
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// How the persisted timer state was interpreted when this host opened.
    pub fn loaded_as(&self) -> Reconciliation {
        self.loaded_as
    }

    pub fn goal_text(&self) -> &str {
        &self.goal_text
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Vec<Event> {
        let events = self.engine.start();
        self.dispatch(&events);
        events
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let events = self.engine.pause();
        self.dispatch(&events);
        events
    }

    /// Start if paused, pause if running.
    pub fn toggle(&mut self) -> Vec<Event> {
        if self.engine.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn tick(&mut self) -> Vec<Event> {
        let events = self.engine.tick();
        self.dispatch(&events);
        events
    }

    pub fn tick_at(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.tick_at(now_ms);
        self.dispatch(&events);
        events
    }

    pub fn switch_mode(&mut self, mode: Mode, keep_time: bool) -> Vec<Event> {
        let events = self.engine.switch_mode(mode, keep_time);
        self.dispatch(&events);
        events
    }

    /// # Errors
    /// Returns the validation failure; nothing is changed or persisted.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<Vec<Event>, ValidationError> {
        let events = self.engine.apply_settings(settings)?;
        self.dispatch(&events);
        Ok(events)
    }

    pub fn reset(&mut self) -> Vec<Event> {
        let events = self.engine.reset();
        self.dispatch(&events);
        events
    }

    pub fn set_goal(&mut self, text: &str) {
        self.goal_text = text.to_string();
        if let Err(e) = self.store.save_goal(text) {
            warn!("failed to save goal text: {e}");
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn settle(&mut self, events: &[Event]) {
        if events.is_empty() {
            self.render();
        } else {
            self.dispatch(events);
        }
    }

    /// Apply events in order. A `SessionCleared` removes the stored state;
    /// it is written again only if a later event changes it.
    fn dispatch(&mut self, events: &[Event]) {
        if events.is_empty() {
            return;
        }

        let mut dirty = false;
        for event in events {
            match event {
                Event::SegmentEnded { mode, .. } => {
                    info!(mode = %mode, "segment ended");
                    if let Err(e) = self.notifier.on_segment_ended(*mode) {
                        warn!("notification failed: {e}");
                    }
                    dirty = true;
                }
                Event::SettingsApplied { settings } => {
                    if let Err(e) = self.store.save_settings(settings) {
                        warn!("failed to save settings: {e}");
                    }
                    dirty = true;
                }
                Event::SessionCleared => {
                    if let Err(e) = self.store.clear() {
                        warn!("failed to clear session: {e}");
                    }
                    dirty = false;
                }
                other => dirty |= other.is_state_change(),
            }
        }

        if dirty {
            self.persist_state();
        }
        self.render();
    }

    fn persist_state(&self) {
        if let Err(e) = self.store.save_state(&self.engine.state()) {
            warn!("failed to save timer state: {e}");
        }
    }

    fn render(&mut self) {
        let label = self.engine.rep_label();
        self.display.on_tick(self.engine.remaining_secs(), &label);
    }
}
