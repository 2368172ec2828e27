use clap::Subcommand;
use pomocycle_core::{Config, Database, Mode};

use super::quiet_host;
use crate::terminal;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown and keep it ticking in the foreground
    Start,
    /// Alias of `start`
    Run,
    /// Pause the countdown
    Pause,
    /// Forget progress and return to a full Pomodoro
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Switch to another segment
    Mode {
        /// pomodoro, short-break or long-break
        mode: String,
        /// Keep the remaining time instead of refilling the segment
        #[arg(long)]
        keep_time: bool,
    },
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TimerAction::Start | TimerAction::Run => {
            return terminal::run_foreground(db, config);
        }
        TimerAction::Pause => {
            let mut host = quiet_host(&db);
            host.pause();
            println!("{}", serde_json::to_string_pretty(&host.snapshot())?);
        }
        TimerAction::Reset => {
            let mut host = quiet_host(&db);
            host.reset();
            println!("{}", serde_json::to_string_pretty(&host.snapshot())?);
        }
        TimerAction::Status => {
            let host = quiet_host(&db);
            let mut json = serde_json::to_value(host.snapshot())?;
            json["goal"] = serde_json::Value::String(host.goal_text().to_string());
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        TimerAction::Mode { mode, keep_time } => {
            let mode: Mode = mode.parse()?;
            let mut host = quiet_host(&db);
            host.switch_mode(mode, keep_time);
            println!("{}", serde_json::to_string_pretty(&host.snapshot())?);
        }
    }
    Ok(())
}
