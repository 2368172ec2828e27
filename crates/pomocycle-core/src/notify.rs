//! One-way collaborator interfaces fed by the host.
//!
//! The engine never calls these directly and never reads anything back.

use std::time::Duration;

use crate::error::NotifyError;
use crate::timer::Mode;

/// Which of the two alarm sounds to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Primary,
    Secondary,
}

/// Default spacing between the two cues of an alarm.
pub const CUE_GAP: Duration = Duration::from_millis(100);

/// The two cues played when a segment of `mode` ends.
///
/// Work and short-break endings double the primary sound; the end of a long
/// break (and so of the whole cycle) follows it with the secondary one.
pub fn alarm_sequence(mode: Mode) -> [SoundCue; 2] {
    match mode {
        Mode::Pomodoro | Mode::ShortBreak => [SoundCue::Primary, SoundCue::Primary],
        Mode::LongBreak => [SoundCue::Primary, SoundCue::Secondary],
    }
}

/// Receives "segment ended" notifications. Failures are logged by the host
/// and never stop the timer.
pub trait NotificationSink {
    fn on_segment_ended(&mut self, mode: Mode) -> Result<(), NotifyError>;
}

/// Receives the values to render after every change.
pub trait DisplaySink {
    fn on_tick(&mut self, remaining_secs: u32, rep_label: &str);
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl NotificationSink for Silent {
    fn on_segment_ended(&mut self, _mode: Mode) -> Result<(), NotifyError> {
        Ok(())
    }
}

impl DisplaySink for Silent {
    fn on_tick(&mut self, _remaining_secs: u32, _rep_label: &str) {}
}
