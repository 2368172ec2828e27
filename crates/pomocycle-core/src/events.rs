use serde::{Deserialize, Serialize};

use crate::timer::{Mode, Settings};

/// Every engine operation returns the events it produced, in order.
/// The host turns them into persistence writes, sounds and redraws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The countdown began; the host should start polling `tick`.
    TimerStarted { mode: Mode, remaining_secs: u32 },
    /// The countdown stopped; the host should stop polling.
    TimerPaused { mode: Mode, remaining_secs: u32 },
    /// Whole seconds were consumed without ending the segment.
    Ticked { remaining_secs: u32, rep_label: String },
    /// A segment ran out. Carries the mode that just ended.
    SegmentEnded { mode: Mode, reps_completed: u32 },
    ModeSwitched { mode: Mode, remaining_secs: u32 },
    SettingsApplied { settings: Settings },
    /// The long break finished; the cycle is over and the timer is paused.
    CycleCompleted { reps_completed: u32 },
    /// Persisted timer state should be removed.
    SessionCleared,
}

impl Event {
    /// Whether the event changed timer state that should be written back.
    pub fn is_state_change(&self) -> bool {
        !matches!(self, Event::SessionCleared)
    }
}
