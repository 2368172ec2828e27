//! Session persistence and load-time reconciliation.
//!
//! Three records are kept under independent keys so that changing one never
//! rewrites the others:
//!
//! | key          | shape                                                        |
//! |--------------|--------------------------------------------------------------|
//! | `settings`   | `{pomodoro, shortBreak, longBreak, pomodorosBeforeLong}`     |
//! | `timerState` | `{totalSeconds, currentMode, isRunning, repsCompleted}`      |
//! | `goalText`   | raw string                                                   |
//!
//! Missing or unreadable records are treated as absent. Nothing here is fatal
//! for the caller of [`SessionStore::load`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::DatabaseError;
use crate::timer::{CycleState, Mode, Settings};

pub const SETTINGS_KEY: &str = "settings";
pub const TIMER_STATE_KEY: &str = "timerState";
pub const GOAL_KEY: &str = "goalText";

/// On-disk shape of the timer state.
///
/// `total_seconds` is signed: a record written at the instant a segment ran
/// out may hold zero or less.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub total_seconds: i64,
    pub current_mode: Mode,
    pub is_running: bool,
    pub reps_completed: u32,
}

impl From<CycleState> for TimerRecord {
    fn from(state: CycleState) -> Self {
        Self {
            total_seconds: i64::from(state.remaining_secs),
            current_mode: state.mode,
            is_running: state.running,
            reps_completed: state.reps_completed,
        }
    }
}

/// How a persisted timer record was interpreted on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing was stored.
    Fresh,
    /// The record was saved at the moment a full cycle finished.
    CycleFinished,
    /// The segment had run out; it was refilled and paused.
    Expired,
    /// Mid-segment; restored as saved.
    Resumed,
}

/// Interpret a stored timer record against the current settings.
pub fn reconcile(record: &TimerRecord, settings: &Settings) -> (CycleState, Reconciliation) {
    let per_cycle = settings.pomodoros_before_long.max(1);
    if record.total_seconds <= 0
        && record.current_mode == Mode::LongBreak
        && record.reps_completed > 0
        && record.reps_completed % per_cycle == 0
    {
        return (CycleState::cycle_complete(), Reconciliation::CycleFinished);
    }

    if record.total_seconds <= 0 {
        let state = CycleState {
            mode: record.current_mode,
            remaining_secs: settings.duration_secs(record.current_mode),
            reps_completed: record.reps_completed,
            running: false,
        };
        return (state, Reconciliation::Expired);
    }

    let max = settings.duration_secs(record.current_mode);
    let remaining = u32::try_from(record.total_seconds).unwrap_or(u32::MAX).min(max);
    let state = CycleState {
        mode: record.current_mode,
        remaining_secs: remaining,
        reps_completed: record.reps_completed,
        running: record.is_running,
    };
    (state, Reconciliation::Resumed)
}

/// Everything restored from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSession {
    pub settings: Settings,
    pub state: CycleState,
    pub goal_text: String,
    pub reconciliation: Reconciliation,
}

/// Reads and writes session records through a [`KeyValueStore`].
pub struct SessionStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Write settings and timer state.
    pub fn save(&self, settings: &Settings, state: &CycleState) -> Result<(), DatabaseError> {
        self.save_settings(settings)?;
        self.save_state(state)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(settings)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.store.set(SETTINGS_KEY, &json)
    }

    pub fn save_state(&self, state: &CycleState) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(&TimerRecord::from(*state))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.store.set(TIMER_STATE_KEY, &json)
    }

    pub fn save_goal(&self, text: &str) -> Result<(), DatabaseError> {
        self.store.set(GOAL_KEY, text)
    }

    /// Remove the persisted timer state. Settings and goal text survive.
    pub fn clear(&self) -> Result<(), DatabaseError> {
        self.store.remove(TIMER_STATE_KEY)
    }

    /// Restore the session, reconciling stale timer state.
    ///
    /// A record saved at the moment a cycle finished is removed, so the next
    /// load starts fresh.
    pub fn load(&self) -> LoadedSession {
        let settings = self.load_settings();
        let goal_text = self.load_goal();

        let (state, reconciliation) = match self.load_record() {
            Some(record) => reconcile(&record, &settings),
            None => (CycleState::initial(&settings), Reconciliation::Fresh),
        };
        debug!(?reconciliation, mode = %state.mode, remaining = state.remaining_secs, "session loaded");

        if reconciliation == Reconciliation::CycleFinished {
            if let Err(e) = self.clear() {
                warn!("failed to clear finished session: {e}");
            }
        }

        LoadedSession {
            settings,
            state,
            goal_text,
            reconciliation,
        }
    }

    pub fn load_settings(&self) -> Settings {
        let Some(json) = self.read(SETTINGS_KEY) else {
            return Settings::default();
        };
        match serde_json::from_str::<Settings>(&json) {
            Ok(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    warn!("stored settings rejected, using defaults: {e}");
                    Settings::default()
                }
            },
            Err(e) => {
                warn!("stored settings unreadable, using defaults: {e}");
                Settings::default()
            }
        }
    }

    pub fn load_goal(&self) -> String {
        self.read(GOAL_KEY).unwrap_or_default()
    }

    fn load_record(&self) -> Option<TimerRecord> {
        let json = self.read(TIMER_STATE_KEY)?;
        match serde_json::from_str::<TimerRecord>(&json) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("stored timer state unreadable, starting fresh: {e}");
                None
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("failed to read '{key}': {e}");
                None
            }
        }
    }
}
