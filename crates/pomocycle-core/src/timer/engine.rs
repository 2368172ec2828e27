//! Cycle engine implementation.
//!
//! The cycle engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically while the timer is running, and for acting on the
//! [`Event`]s each operation returns.
//!
//! ## Cycle
//!
//! ```text
//! Pomodoro -> ShortBreak -> Pomodoro -> ... -> Pomodoro -> LongBreak -> (cycle complete)
//!              (reps % n != 0)                 (reps % n == 0)
//! ```
//!
//! The cycle-complete state is not a separate mode: it is `LongBreak` with
//! zero seconds left and the timer paused.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = CycleEngine::new(Settings::default(), SystemClock);
//! engine.start();
//! // Every ~50ms while running:
//! for event in engine.tick() { /* persist, play sounds, redraw */ }
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::display::{format_clock, state_label};
use super::mode::{Mode, Settings};
use crate::error::ValidationError;
use crate::events::Event;

/// The mutable part of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleState {
    pub mode: Mode,
    pub remaining_secs: u32,
    /// Completed Pomodoro segments in the current cycle.
    pub reps_completed: u32,
    pub running: bool,
}

impl CycleState {
    /// A fresh, paused Pomodoro at full length.
    pub fn initial(settings: &Settings) -> Self {
        Self {
            mode: Mode::Pomodoro,
            remaining_secs: settings.duration_secs(Mode::Pomodoro),
            reps_completed: 0,
            running: false,
        }
    }

    /// The terminal display state after a long break ends.
    pub fn cycle_complete() -> Self {
        Self {
            mode: Mode::LongBreak,
            remaining_secs: 0,
            reps_completed: 0,
            running: false,
        }
    }

    pub fn is_cycle_complete(&self) -> bool {
        !self.running && self.mode == Mode::LongBreak && self.remaining_secs == 0
    }
}

/// Point-in-time view for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub label: String,
    pub remaining_secs: u32,
    pub clock: String,
    pub reps_completed: u32,
    pub rep_label: String,
    pub running: bool,
    pub cycle_complete: bool,
    pub settings: Settings,
}

/// Core cycle engine.
///
/// Operates on wall-clock deltas read from the injected [`Clock`].
pub struct CycleEngine<C: Clock = SystemClock> {
    clock: C,
    settings: Settings,
    state: CycleState,
    /// Reference timestamp (ms) that elapsed time is measured from.
    /// Only set while running.
    last_tick_ms: Option<u64>,
}

impl<C: Clock> CycleEngine<C> {
    /// Create an engine in the initial state: Pomodoro, full length, paused.
    pub fn new(settings: Settings, clock: C) -> Self {
        Self {
            clock,
            settings,
            state: CycleState::initial(&settings),
            last_tick_ms: None,
        }
    }

    /// Rebuild an engine from a loaded session.
    ///
    /// A state persisted as running is resumed immediately, measuring
    /// elapsed time from now; the returned events carry the `TimerStarted`.
    pub fn restore(settings: Settings, state: CycleState, clock: C) -> (Self, Vec<Event>) {
        let mut engine = Self {
            clock,
            settings,
            state: CycleState {
                running: false,
                ..state
            },
            last_tick_ms: None,
        };
        engine.clamp_remaining();

        let events = if state.running && engine.state.remaining_secs > 0 {
            engine.start()
        } else {
            Vec::new()
        };
        (engine, events)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn reps_completed(&self) -> u32 {
        self.state.reps_completed
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_cycle_complete(&self) -> bool {
        self.state.is_cycle_complete()
    }

    /// Progress through the current set, e.g. `"2 / 4"`.
    pub fn rep_label(&self) -> String {
        let per_cycle = self.settings.pomodoros_before_long.max(1);
        format!("{} / {}", self.state.reps_completed % per_cycle, per_cycle)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.state.mode,
            label: state_label(self.state.mode, self.is_cycle_complete()).to_string(),
            remaining_secs: self.state.remaining_secs,
            clock: format_clock(self.state.remaining_secs),
            reps_completed: self.state.reps_completed,
            rep_label: self.rep_label(),
            running: self.state.running,
            cycle_complete: self.is_cycle_complete(),
            settings: self.settings,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the countdown. No-op if already running.
    ///
    /// Starting from the cycle-complete state begins a new cycle with a
    /// full Pomodoro.
    pub fn start(&mut self) -> Vec<Event> {
        if self.state.running {
            return Vec::new();
        }
        let mut events = Vec::new();
        if self.state.remaining_secs == 0 {
            events.extend(self.switch_mode(Mode::Pomodoro, false));
        }
        self.state.running = true;
        self.last_tick_ms = Some(self.clock.now_ms());
        debug!(mode = %self.state.mode, remaining = self.state.remaining_secs, "timer started");
        events.push(Event::TimerStarted {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
        });
        events
    }

    /// Stop the countdown. No-op if not running.
    pub fn pause(&mut self) -> Vec<Event> {
        if !self.state.running {
            return Vec::new();
        }
        self.state.running = false;
        self.last_tick_ms = None;
        debug!(mode = %self.state.mode, remaining = self.state.remaining_secs, "timer paused");
        vec![Event::TimerPaused {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
        }]
    }

    /// Call periodically while running.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        self.tick_at(now)
    }

    /// Consume the whole seconds elapsed between the reference timestamp
    /// and `now_ms`.
    ///
    /// The reference only advances by the seconds consumed, so the
    /// sub-second remainder carries into the next call and irregular
    /// callback spacing never accumulates drift.
    pub fn tick_at(&mut self, now_ms: u64) -> Vec<Event> {
        if !self.state.running {
            return Vec::new();
        }
        let Some(last) = self.last_tick_ms else {
            self.last_tick_ms = Some(now_ms);
            return Vec::new();
        };

        let elapsed_secs = now_ms.saturating_sub(last) / 1000;
        if elapsed_secs < 1 {
            return Vec::new();
        }
        self.last_tick_ms = Some(last + elapsed_secs * 1000);

        if elapsed_secs >= u64::from(self.state.remaining_secs) {
            self.state.remaining_secs = 0;
            return self.complete_segment_at(now_ms);
        }

        self.state.remaining_secs -= elapsed_secs as u32;
        vec![Event::Ticked {
            remaining_secs: self.state.remaining_secs,
            rep_label: self.rep_label(),
        }]
    }

    /// End the current segment and move to the next one.
    pub fn complete_segment(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        self.complete_segment_at(now)
    }

    fn complete_segment_at(&mut self, now_ms: u64) -> Vec<Event> {
        let ended = self.state.mode;
        self.state.remaining_secs = 0;

        let next = match ended {
            Mode::Pomodoro => {
                self.state.reps_completed = self.state.reps_completed.saturating_add(1);
                if self.state.reps_completed % self.settings.pomodoros_before_long.max(1) == 0 {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak => Mode::Pomodoro,
            Mode::LongBreak => return self.complete_cycle(),
        };

        debug!(ended = %ended, next = %next, reps = self.state.reps_completed, "segment ended");
        let mut events = vec![Event::SegmentEnded {
            mode: ended,
            reps_completed: self.state.reps_completed,
        }];
        events.extend(self.switch_mode(next, false));

        let was_running = self.state.running;
        self.state.running = true;
        self.last_tick_ms = Some(now_ms);
        if !was_running {
            events.push(Event::TimerStarted {
                mode: self.state.mode,
                remaining_secs: self.state.remaining_secs,
            });
        }
        events
    }

    fn complete_cycle(&mut self) -> Vec<Event> {
        let mut events = self.pause();
        events.push(Event::SegmentEnded {
            mode: Mode::LongBreak,
            reps_completed: self.state.reps_completed,
        });
        self.state = CycleState::cycle_complete();
        debug!("cycle complete");
        events.push(Event::CycleCompleted { reps_completed: 0 });
        events.push(Event::SessionCleared);
        events
    }

    /// Change the current mode.
    ///
    /// The remaining time is reset to the mode's full length unless
    /// `keep_time` is set and there is time left.
    pub fn switch_mode(&mut self, mode: Mode, keep_time: bool) -> Vec<Event> {
        self.state.mode = mode;
        if !keep_time || self.state.remaining_secs == 0 {
            self.state.remaining_secs = self.settings.duration_secs(mode);
        }
        self.clamp_remaining();
        vec![Event::ModeSwitched {
            mode,
            remaining_secs: self.state.remaining_secs,
        }]
    }

    /// Replace the settings.
    ///
    /// While paused the current mode is refilled to its new full length.
    /// A running countdown is left alone unless it now exceeds the new
    /// length, in which case it is cut down to it.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] and leaves the engine untouched if any
    /// value is below 1.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<Vec<Event>, ValidationError> {
        settings.validate()?;
        self.settings = settings;

        let mut events = vec![Event::SettingsApplied { settings }];
        if self.state.running {
            if self.clamp_remaining() {
                events.push(Event::Ticked {
                    remaining_secs: self.state.remaining_secs,
                    rep_label: self.rep_label(),
                });
            }
        } else {
            events.extend(self.switch_mode(self.state.mode, false));
        }
        Ok(events)
    }

    /// Pause, forget progress and return to a full Pomodoro.
    pub fn reset(&mut self) -> Vec<Event> {
        let mut events = self.pause();
        self.state.reps_completed = 0;
        events.push(Event::SessionCleared);
        events.extend(self.switch_mode(Mode::Pomodoro, false));
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Keep `remaining <= duration(mode)`. Returns whether it changed.
    fn clamp_remaining(&mut self) -> bool {
        let max = self.settings.duration_secs(self.state.mode);
        if self.state.remaining_secs > max {
            self.state.remaining_secs = max;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualClock;
    use proptest::prelude::*;

    fn engine_with(settings: Settings) -> (CycleEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        (CycleEngine::new(settings, clock.clone()), clock)
    }

    fn run_out(engine: &mut CycleEngine<ManualClock>, clock: &ManualClock) -> Vec<Event> {
        let secs = u64::from(engine.remaining_secs());
        clock.advance(secs * 1000);
        engine.tick()
    }

    #[test]
    fn new_engine_is_full_paused_pomodoro() {
        let (engine, _) = engine_with(Settings::default());
        assert_eq!(engine.mode(), Mode::Pomodoro);
        assert_eq!(engine.remaining_secs(), 25 * 60);
        assert_eq!(engine.reps_completed(), 0);
        assert!(!engine.is_running());
        assert_eq!(engine.rep_label(), "0 / 4");
    }

    #[test]
    fn start_and_pause_are_idempotent() {
        let (mut engine, _) = engine_with(Settings::default());
        assert_eq!(engine.start().len(), 1);
        assert!(engine.start().is_empty());
        assert!(engine.is_running());

        assert_eq!(engine.pause().len(), 1);
        assert!(engine.pause().is_empty());
        assert!(!engine.is_running());
    }

    #[test]
    fn tick_while_paused_does_nothing() {
        let (mut engine, clock) = engine_with(Settings::default());
        clock.advance(10_000);
        assert!(engine.tick().is_empty());
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn sub_second_ticks_change_nothing() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.start();
        clock.advance(400);
        assert!(engine.tick().is_empty());
        clock.advance(599);
        assert!(engine.tick().is_empty());
        assert_eq!(engine.remaining_secs(), 1500);

        clock.advance(1);
        let events = engine.tick();
        assert_eq!(
            events,
            vec![Event::Ticked {
                remaining_secs: 1499,
                rep_label: "0 / 4".into()
            }]
        );
    }

    #[test]
    fn irregular_ticks_keep_fractional_remainder() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.start();
        // 10.9 seconds in awkward steps
        for step in [730, 1_480, 60, 2_950, 999, 1_001, 333, 2_347, 1_000] {
            clock.advance(step);
            engine.tick();
        }
        assert_eq!(engine.remaining_secs(), 1500 - 10);

        // The 0.9s residual is still owed: 100ms more completes the 11th second.
        clock.advance(100);
        engine.tick();
        assert_eq!(engine.remaining_secs(), 1500 - 11);
    }

    #[test]
    fn pause_discards_time_spent_paused() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.start();
        clock.advance(2_500);
        engine.tick();
        engine.pause();
        clock.advance(60_000);
        engine.start();
        clock.advance(1_000);
        engine.tick();
        assert_eq!(engine.remaining_secs(), 1500 - 3);
    }

    #[test]
    fn four_pomodoros_lead_to_long_break() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.start();

        let mut reps = Vec::new();
        let mut breaks = Vec::new();
        for _ in 0..4 {
            assert_eq!(engine.mode(), Mode::Pomodoro);
            run_out(&mut engine, &clock);
            reps.push(engine.reps_completed());
            breaks.push(engine.mode());
            assert!(engine.is_running());
            if engine.mode() == Mode::ShortBreak {
                run_out(&mut engine, &clock);
            }
        }
        assert_eq!(reps, vec![1, 2, 3, 4]);
        assert_eq!(
            breaks,
            vec![Mode::ShortBreak, Mode::ShortBreak, Mode::ShortBreak, Mode::LongBreak]
        );
        assert_eq!(engine.remaining_secs(), 15 * 60);
    }

    #[test]
    fn pomodoro_completion_events() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.start();
        let events = run_out(&mut engine, &clock);
        assert_eq!(
            events,
            vec![
                Event::SegmentEnded {
                    mode: Mode::Pomodoro,
                    reps_completed: 1
                },
                Event::ModeSwitched {
                    mode: Mode::ShortBreak,
                    remaining_secs: 300
                },
            ]
        );
    }

    #[test]
    fn short_break_returns_to_pomodoro() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.switch_mode(Mode::ShortBreak, false);
        engine.start();
        let events = run_out(&mut engine, &clock);
        assert_eq!(events[0], Event::SegmentEnded { mode: Mode::ShortBreak, reps_completed: 0 });
        assert_eq!(engine.mode(), Mode::Pomodoro);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(engine.is_running());
    }

    #[test]
    fn auto_resume_measures_from_completing_tick() {
        let (mut engine, clock) = engine_with(Settings::new(1, 1, 1, 4).unwrap());
        engine.start();
        clock.advance(60_700);
        engine.tick();
        assert_eq!(engine.mode(), Mode::ShortBreak);
        clock.advance(999);
        assert!(engine.tick().is_empty());
        clock.advance(1);
        engine.tick();
        assert_eq!(engine.remaining_secs(), 59);
    }

    #[test]
    fn long_break_completion_ends_cycle() {
        let (mut engine, clock) = engine_with(Settings::new(1, 1, 1, 1).unwrap());
        engine.start();
        run_out(&mut engine, &clock);
        assert_eq!(engine.mode(), Mode::LongBreak);
        assert_eq!(engine.reps_completed(), 1);

        let events = run_out(&mut engine, &clock);
        assert_eq!(
            events,
            vec![
                Event::TimerPaused {
                    mode: Mode::LongBreak,
                    remaining_secs: 0
                },
                Event::SegmentEnded {
                    mode: Mode::LongBreak,
                    reps_completed: 1
                },
                Event::CycleCompleted { reps_completed: 0 },
                Event::SessionCleared,
            ]
        );
        assert!(engine.is_cycle_complete());
        assert_eq!(engine.reps_completed(), 0);
        assert_eq!(engine.snapshot().label, "CYCLE COMPLETE");

        // Stays put until the user acts.
        clock.advance(120_000);
        assert!(engine.tick().is_empty());
    }

    #[test]
    fn start_after_cycle_complete_begins_new_cycle() {
        let (mut engine, clock) = engine_with(Settings::new(1, 1, 1, 1).unwrap());
        engine.start();
        run_out(&mut engine, &clock);
        run_out(&mut engine, &clock);
        assert!(engine.is_cycle_complete());

        let events = engine.start();
        assert_eq!(engine.mode(), Mode::Pomodoro);
        assert_eq!(engine.remaining_secs(), 60);
        assert!(matches!(events.last(), Some(Event::TimerStarted { .. })));
    }

    #[test]
    fn large_gap_clamps_to_zero_and_completes_once() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.start();
        clock.advance(10 * 3_600_000);
        engine.tick();
        assert_eq!(engine.mode(), Mode::ShortBreak);
        assert_eq!(engine.reps_completed(), 1);
        assert_eq!(engine.remaining_secs(), 300);
    }

    #[test]
    fn switch_mode_keep_time() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.start();
        clock.advance(100_000);
        engine.tick();
        engine.switch_mode(Mode::Pomodoro, true);
        assert_eq!(engine.remaining_secs(), 1400);
        // Never more than the new mode allows.
        engine.switch_mode(Mode::LongBreak, true);
        assert_eq!(engine.remaining_secs(), 900);
        engine.switch_mode(Mode::Pomodoro, false);
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn invalid_settings_are_rejected_without_mutation() {
        let (mut engine, _) = engine_with(Settings::default());
        let bad = Settings {
            pomodoros_before_long: 0,
            ..Settings::default()
        };
        assert!(engine.apply_settings(bad).is_err());
        assert_eq!(engine.settings(), &Settings::default());
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn settings_refresh_duration_while_paused() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.start();
        clock.advance(30_000);
        engine.tick();
        engine.pause();

        engine.apply_settings(Settings::new(50, 10, 30, 2).unwrap()).unwrap();
        assert_eq!(engine.remaining_secs(), 50 * 60);
        assert_eq!(engine.rep_label(), "0 / 2");
    }

    #[test]
    fn settings_leave_running_countdown_alone() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.start();
        clock.advance(30_000);
        engine.tick();

        engine.apply_settings(Settings::new(50, 10, 30, 2).unwrap()).unwrap();
        assert_eq!(engine.remaining_secs(), 1470);

        let events = engine.apply_settings(Settings::new(10, 5, 15, 4).unwrap()).unwrap();
        assert_eq!(engine.remaining_secs(), 600);
        assert!(matches!(events.last(), Some(Event::Ticked { remaining_secs: 600, .. })));
    }

    #[test]
    fn reset_returns_to_fresh_pomodoro() {
        let (mut engine, clock) = engine_with(Settings::default());
        engine.start();
        run_out(&mut engine, &clock);
        assert_eq!(engine.reps_completed(), 1);

        let events = engine.reset();
        assert!(events.contains(&Event::SessionCleared));
        assert!(!engine.is_running());
        assert_eq!(engine.reps_completed(), 0);
        assert_eq!(engine.mode(), Mode::Pomodoro);
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn restore_resumes_running_state() {
        let clock = ManualClock::new(0);
        let state = CycleState {
            mode: Mode::Pomodoro,
            remaining_secs: 300,
            reps_completed: 2,
            running: true,
        };
        let (mut engine, events) = CycleEngine::restore(Settings::default(), state, clock.clone());
        assert!(engine.is_running());
        assert_eq!(engine.remaining_secs(), 300);
        assert!(matches!(events.as_slice(), [Event::TimerStarted { .. }]));

        clock.advance(5_000);
        engine.tick();
        assert_eq!(engine.remaining_secs(), 295);
    }

    proptest! {
        #[test]
        fn switch_mode_fills_to_configured_duration(
            p in 1u32..=600, s in 1u32..=600, l in 1u32..=600, n in 1u32..=12,
            mode_idx in 0usize..3,
        ) {
            let (mut engine, _) = engine_with(Settings::default());
            let settings = Settings::new(p, s, l, n).unwrap();
            prop_assert!(engine.apply_settings(settings).is_ok());
            let mode = Mode::ALL[mode_idx];
            engine.switch_mode(mode, false);
            prop_assert_eq!(engine.remaining_secs(), settings.duration_min(mode) * 60);
        }

        #[test]
        fn elapsed_time_is_consumed_exactly(steps in proptest::collection::vec(1u64..2_500, 1..60)) {
            let (mut engine, clock) = engine_with(Settings::default());
            engine.start();
            let total: u64 = steps.iter().sum();
            for step in &steps {
                clock.advance(*step);
                engine.tick();
            }
            prop_assert_eq!(u64::from(1500 - engine.remaining_secs()), total / 1000);
        }
    }
}
