//! Foreground runner and terminal sinks.
//!
//! `timer start` keeps a single-threaded tokio loop polling the engine
//! every `runtime.tick_interval_ms` until the cycle completes or the user
//! presses Ctrl-C, which pauses and saves before exiting.

use std::cell::RefCell;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::rc::Rc;
use std::time::Duration;

use chrono::{Local, Timelike};
use pomocycle_core::storage::data_dir;
use pomocycle_core::{
    alarm_sequence, format_clock, greeting_for_hour, Config, Database, DisplaySink, Mode,
    NotificationSink, NotifyError, SessionStore, SoundCue, SystemClock, TimerHost,
};
use tokio::process::{Child, Command};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Sound cues still playing (or waiting for their gap) on the runtime.
#[derive(Clone, Default)]
struct PendingCues(Rc<RefCell<JoinSet<()>>>);

impl PendingCues {
    fn push<F>(&self, cue: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.0.borrow_mut().spawn(cue);
    }

    /// Wait for every scheduled cue, including the player processes.
    async fn drain(&self) {
        let mut cues = self.0.take();
        while let Some(res) = cues.join_next().await {
            if let Err(e) = res {
                warn!("sound cue task failed: {e}");
            }
        }
    }
}

/// Plays alarm cues through an external player and/or the terminal bell.
struct TerminalNotifier {
    enabled: bool,
    bell: bool,
    player: Option<String>,
    primary: PathBuf,
    secondary: PathBuf,
    gap: Duration,
    cues: PendingCues,
}

impl TerminalNotifier {
    fn new(config: &Config, cues: PendingCues) -> Self {
        let cfg = &config.notifications;
        let base = data_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            enabled: cfg.enabled,
            bell: cfg.bell,
            player: cfg.player.clone().filter(|p| !p.trim().is_empty()),
            primary: resolve_sound(&base, &cfg.primary_sound),
            secondary: resolve_sound(&base, &cfg.secondary_sound),
            gap: Duration::from_millis(cfg.repeat_gap_ms),
            cues,
        }
    }

    fn sound_path(&self, cue: SoundCue) -> &Path {
        match cue {
            SoundCue::Primary => &self.primary,
            SoundCue::Secondary => &self.secondary,
        }
    }
}

fn resolve_sound(base: &Path, name: &str) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn ring_bell() -> std::io::Result<()> {
    let mut out = std::io::stdout();
    out.write_all(b"\x07")?;
    out.flush()
}

/// Launch the player for one sound without waiting for it.
fn spawn_player(player: Option<&str>, sound: &Path) -> Result<Option<Child>, NotifyError> {
    let Some(player) = player else {
        return Ok(None);
    };
    Command::new(player)
        .arg(sound)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(Some)
        .map_err(|e| NotifyError::PlaybackFailed {
            sound: sound.display().to_string(),
            message: e.to_string(),
        })
}

async fn wait_player(mut child: Child, sound: PathBuf) {
    match child.wait().await {
        Ok(status) if !status.success() => {
            warn!("player exited with {status} for {}", sound.display());
        }
        Ok(_) => {}
        Err(e) => warn!("player for {} failed: {e}", sound.display()),
    }
}

impl NotificationSink for TerminalNotifier {
    fn on_segment_ended(&mut self, mode: Mode) -> Result<(), NotifyError> {
        let mut playback = Ok(());
        if self.enabled {
            let [first, second] = alarm_sequence(mode);

            let sound = self.sound_path(first).to_path_buf();
            match spawn_player(self.player.as_deref(), &sound) {
                Ok(Some(child)) => self.cues.push(wait_player(child, sound)),
                Ok(None) => {}
                Err(e) => playback = Err(e),
            }

            let (bell, player, sound, gap) = (
                self.bell,
                self.player.clone(),
                self.sound_path(second).to_path_buf(),
                self.gap,
            );
            self.cues.push(async move {
                tokio::time::sleep(gap).await;
                if bell {
                    if let Err(e) = ring_bell() {
                        debug!("bell failed: {e}");
                    }
                }
                match spawn_player(player.as_deref(), &sound) {
                    Ok(Some(child)) => wait_player(child, sound).await,
                    Ok(None) => {}
                    Err(e) => warn!("notification failed: {e}"),
                }
            });
        }

        writeln!(std::io::stdout(), "\n{} finished", mode.label())?;
        if self.enabled && self.bell {
            ring_bell()?;
        }
        playback
    }
}

/// Redraws a single status line in place.
#[derive(Default)]
pub struct TerminalDisplay;

impl DisplaySink for TerminalDisplay {
    fn on_tick(&mut self, remaining_secs: u32, rep_label: &str) {
        let mut out = std::io::stdout();
        // A closed stdout must not stop the timer.
        let _ = write!(out, "\r  {}   [{}]   ", format_clock(remaining_secs), rep_label);
        let _ = out.flush();
    }
}

pub fn run_foreground(db: Database, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive(db, config))
}

async fn drive(db: Database, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // A closed stdout must not stop the timer; these lines are best effort.
    let mut out = std::io::stdout();
    let goal = SessionStore::new(&db).load_goal();
    let _ = writeln!(out, "{}", greeting_for_hour(Local::now().hour()));
    if !goal.is_empty() {
        let _ = writeln!(out, "Goal: {goal}");
    }

    let cues = PendingCues::default();
    let mut host = TimerHost::open_running(
        db,
        SystemClock,
        Box::new(TerminalNotifier::new(config, cues.clone())),
        Box::new(TerminalDisplay),
    );

    let mut interval = tokio::time::interval(config.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut interrupted = false;
    while host.is_running() {
        tokio::select! {
            _ = interval.tick() => {
                host.tick();
            }
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!("failed to listen for Ctrl-C: {e}");
                }
                host.pause();
                interrupted = true;
            }
        }
    }

    let _ = if interrupted {
        writeln!(out, "\npaused at {}", host.snapshot().clock)
    } else {
        writeln!(out, "\n{}", host.snapshot().label)
    };
    cues.drain().await;
    Ok(())
}
