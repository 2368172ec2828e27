//! # Pomocycle Core Library
//!
//! Core logic for the Pomocycle Pomodoro timer: a cycle engine that moves
//! through work and break segments, and a session store that survives
//! restarts.
//!
//! ## Architecture
//!
//! - **Cycle Engine**: A wall-clock-based state machine that requires the
//!   caller to periodically invoke `tick()`. It performs no I/O; every
//!   operation returns the [`Event`]s it produced.
//! - **Session Store**: Settings, timer state and goal text in a key-value
//!   medium (SQLite in production), reconciled on load.
//! - **Host**: Applies engine events to storage and to the notification
//!   and display sinks.
//!
//! ## Key Components
//!
//! - [`CycleEngine`]: Core timer state machine
//! - [`SessionStore`]: Persistence and load-time reconciliation
//! - [`TimerHost`]: Engine + store + sinks
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod host;
pub mod notify;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, DatabaseError, NotifyError, ValidationError};
pub use events::Event;
pub use host::TimerHost;
pub use notify::{alarm_sequence, DisplaySink, NotificationSink, Silent, SoundCue, CUE_GAP};
pub use storage::session::Reconciliation;
pub use storage::{Config, Database, KeyValueStore, LoadedSession, MemoryStore, SessionStore};
pub use timer::{
    format_clock, greeting_for_hour, Clock, CycleEngine, CycleState, ManualClock, Mode, Settings,
    Snapshot, SystemClock,
};
