//! Formatting helpers for whatever renders the timer.

use super::mode::Mode;

pub const CYCLE_COMPLETE_LABEL: &str = "CYCLE COMPLETE";

/// `MM:SS`. Minutes are not wrapped at 60, so a 90 minute segment reads `90:00`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Label shown above the countdown.
pub fn state_label(mode: Mode, cycle_complete: bool) -> &'static str {
    if cycle_complete {
        CYCLE_COMPLETE_LABEL
    } else {
        mode.label()
    }
}

/// Time-of-day greeting for a local hour in `0..24`.
pub fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        0..=3 => "Late night grind?",
        4..=11 => "Good morning!",
        12..=16 => "Good afternoon!",
        _ => "Good evening!",
    }
}
