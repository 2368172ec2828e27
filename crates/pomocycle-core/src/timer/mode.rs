use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The three kinds of segment a cycle is built from.
///
/// Serialized with the persisted names `pomodoro`, `shortBreak`, `longBreak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Pomodoro, Mode::ShortBreak, Mode::LongBreak];

    /// Persisted name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Pomodoro => "pomodoro",
            Mode::ShortBreak => "shortBreak",
            Mode::LongBreak => "longBreak",
        }
    }

    /// Human-facing state label.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Pomodoro => "POMODORO",
            Mode::ShortBreak => "SHORT BREAK",
            Mode::LongBreak => "LONG BREAK",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    /// Accepts the persisted camelCase names as well as kebab and snake case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "pomodoro" => Ok(Mode::Pomodoro),
            "shortbreak" => Ok(Mode::ShortBreak),
            "longbreak" => Ok(Mode::LongBreak),
            _ => Err(ValidationError::invalid(
                "mode",
                format!("unknown mode '{s}' (expected pomodoro, short-break or long-break)"),
            )),
        }
    }
}

/// User-tunable segment lengths.
///
/// Durations are whole minutes. Every field must be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub pomodoro: u32,
    pub short_break: u32,
    pub long_break: u32,
    pub pomodoros_before_long: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pomodoro: 25,
            short_break: 5,
            long_break: 15,
            pomodoros_before_long: 4,
        }
    }
}

impl Settings {
    /// Build validated settings.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] naming the first field below 1.
    pub fn new(
        pomodoro: u32,
        short_break: u32,
        long_break: u32,
        pomodoros_before_long: u32,
    ) -> Result<Self, ValidationError> {
        let settings = Self {
            pomodoro,
            short_break,
            long_break,
            pomodoros_before_long,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from raw text inputs, as typed by a user.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] for the first non-numeric or non-positive field.
    pub fn from_inputs(
        pomodoro: &str,
        short_break: &str,
        long_break: &str,
        pomodoros_before_long: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            pomodoro: parse_positive("pomodoro", pomodoro)?,
            short_break: parse_positive("shortBreak", short_break)?,
            long_break: parse_positive("longBreak", long_break)?,
            pomodoros_before_long: parse_positive("pomodorosBeforeLong", pomodoros_before_long)?,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("pomodoro", self.pomodoro),
            ("shortBreak", self.short_break),
            ("longBreak", self.long_break),
            ("pomodorosBeforeLong", self.pomodoros_before_long),
        ];
        for (field, value) in fields {
            if value < 1 {
                return Err(ValidationError::invalid(field, "must be at least 1"));
            }
        }
        Ok(())
    }

    pub fn duration_min(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Pomodoro => self.pomodoro,
            Mode::ShortBreak => self.short_break,
            Mode::LongBreak => self.long_break,
        }
    }

    /// Segment length in seconds. Saturates instead of overflowing.
    pub fn duration_secs(&self, mode: Mode) -> u32 {
        self.duration_min(mode).saturating_mul(60)
    }
}

/// Parse one positive integer field from user input.
///
/// # Errors
/// Returns a [`ValidationError`] if `raw` is not a whole number of at least 1.
pub fn parse_positive(field: &str, raw: &str) -> Result<u32, ValidationError> {
    let value: u32 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::invalid(field, format!("'{raw}' is not a positive number")))?;
    if value < 1 {
        return Err(ValidationError::invalid(field, "must be at least 1"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_all_spellings() {
        assert_eq!("pomodoro".parse::<Mode>().unwrap(), Mode::Pomodoro);
        assert_eq!("shortBreak".parse::<Mode>().unwrap(), Mode::ShortBreak);
        assert_eq!("short-break".parse::<Mode>().unwrap(), Mode::ShortBreak);
        assert_eq!("long_break".parse::<Mode>().unwrap(), Mode::LongBreak);
        assert!("lunch".parse::<Mode>().is_err());
    }

    #[test]
    fn mode_serializes_as_persisted_name() {
        assert_eq!(serde_json::to_string(&Mode::ShortBreak).unwrap(), "\"shortBreak\"");
        for mode in Mode::ALL {
            assert_eq!(mode.to_string(), mode.as_str());
        }
    }

    #[test]
    fn default_settings() {
        let s = Settings::default();
        assert_eq!((s.pomodoro, s.short_break, s.long_break, s.pomodoros_before_long), (25, 5, 15, 4));
        assert_eq!(s.duration_secs(Mode::LongBreak), 900);
    }

    #[test]
    fn settings_json_shape() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["shortBreak"], 5);
        assert_eq!(json["pomodorosBeforeLong"], 4);
    }

    #[test]
    fn zero_is_rejected() {
        let err = Settings::new(25, 0, 15, 4).unwrap_err();
        assert_eq!(err, ValidationError::invalid("shortBreak", "must be at least 1"));
    }

    #[test]
    fn from_inputs_rejects_non_numeric_and_negative() {
        assert!(Settings::from_inputs("25", "five", "15", "4").is_err());
        assert!(Settings::from_inputs("25", "5", "-15", "4").is_err());
        assert!(Settings::from_inputs("", "5", "15", "4").is_err());
        assert_eq!(
            Settings::from_inputs(" 50 ", "10", "30", "2").unwrap(),
            Settings::new(50, 10, 30, 2).unwrap()
        );
    }
}
