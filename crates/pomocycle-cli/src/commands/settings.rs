use clap::Subcommand;
use pomocycle_core::timer::parse_positive;
use pomocycle_core::{Database, Settings};

use super::quiet_host;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current settings as JSON
    Show,
    /// Change one or more durations (minutes)
    Set {
        #[arg(long, allow_hyphen_values = true)]
        pomodoro: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        short_break: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        long_break: Option<String>,
        /// Pomodoros before a long break
        #[arg(long, allow_hyphen_values = true)]
        before_long: Option<String>,
    },
    /// Restore 25 / 5 / 15 / 4
    Defaults,
}

fn field(name: &str, raw: Option<&str>, current: u32) -> Result<u32, pomocycle_core::ValidationError> {
    match raw {
        Some(raw) => parse_positive(name, raw),
        None => Ok(current),
    }
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut host = quiet_host(&db);

    match action {
        SettingsAction::Show => {}
        SettingsAction::Set {
            pomodoro,
            short_break,
            long_break,
            before_long,
        } => {
            let current = *host.engine().settings();
            let updated = Settings {
                pomodoro: field("pomodoro", pomodoro.as_deref(), current.pomodoro)?,
                short_break: field("shortBreak", short_break.as_deref(), current.short_break)?,
                long_break: field("longBreak", long_break.as_deref(), current.long_break)?,
                pomodoros_before_long: field(
                    "pomodorosBeforeLong",
                    before_long.as_deref(),
                    current.pomodoros_before_long,
                )?,
            };
            host.apply_settings(updated)?;
        }
        SettingsAction::Defaults => {
            host.apply_settings(Settings::default())?;
        }
    }

    println!("{}", serde_json::to_string_pretty(host.engine().settings())?);
    Ok(())
}
