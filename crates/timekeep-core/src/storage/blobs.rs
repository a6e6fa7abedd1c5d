//! Feature-local settings stored next to the preferences: the world clock,
//! alarms, and the custom Pomodoro lengths.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::timer::TimerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockSettings {
    #[serde(default = "default_true")]
    pub use_24_hour: bool,
    #[serde(default = "default_true")]
    pub show_seconds: bool,
    /// Fixed offset from UTC; `None` follows the local zone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

fn default_true() -> bool {
    true
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            use_24_hour: true,
            show_seconds: true,
            utc_offset_minutes: None,
        }
    }
}

impl ClockSettings {
    fn local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match self
            .utc_offset_minutes
            .and_then(|m| FixedOffset::east_opt(m.saturating_mul(60)))
        {
            Some(offset) => now.with_timezone(&offset).naive_local(),
            None => now.with_timezone(&Local).naive_local(),
        }
    }

    pub fn format_clock(&self, now: DateTime<Utc>) -> String {
        let pattern = match (self.use_24_hour, self.show_seconds) {
            (true, true) => "%H:%M:%S",
            (true, false) => "%H:%M",
            (false, true) => "%I:%M:%S %p",
            (false, false) => "%I:%M %p",
        };
        self.local(now).format(pattern).to_string()
    }

    pub fn format_date(&self, now: DateTime<Utc>) -> String {
        self.local(now).format("%A, %B %-d, %Y").to_string()
    }

    /// Wall time in the configured zone, used to match alarms.
    pub fn time_of_day(&self, now: DateTime<Utc>) -> NaiveTime {
        self.local(now).time()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: String,
    pub hour: u8,
    pub minute: u8,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Alarm {
    pub fn new(hour: u8, minute: u8, label: impl Into<String>) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError::InvalidValue {
                field: "hour".into(),
                message: format!("{hour} is not in 0..=23"),
            });
        }
        if minute > 59 {
            return Err(ValidationError::InvalidValue {
                field: "minute".into(),
                message: format!("{minute} is not in 0..=59"),
            });
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            hour,
            minute,
            label: label.into(),
            enabled: true,
        })
    }

    pub fn matches(&self, time: NaiveTime) -> bool {
        self.enabled
            && u32::from(self.hour) == time.hour()
            && u32::from(self.minute) == time.minute()
    }
}

/// Enabled alarms set for the hour and minute of `time`.
pub fn due_alarms(alarms: &[Alarm], time: NaiveTime) -> Vec<&Alarm> {
    alarms.iter().filter(|a| a.matches(time)).collect()
}

/// User-chosen Pomodoro lengths, used as setup defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroSettings {
    pub work_ms: u64,
    pub short_break_ms: u64,
    pub long_break_ms: u64,
    pub sessions_until_long_break: u32,
    pub total_sessions: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_ms: 25 * 60 * 1000,
            short_break_ms: 5 * 60 * 1000,
            long_break_ms: 15 * 60 * 1000,
            sessions_until_long_break: 4,
            total_sessions: 4,
        }
    }
}

impl PomodoroSettings {
    pub fn to_config(&self) -> TimerConfig {
        TimerConfig::Pomodoro {
            work_ms: self.work_ms,
            short_break_ms: self.short_break_ms,
            long_break_ms: self.long_break_ms,
            sessions_until_long_break: self.sessions_until_long_break,
            total_sessions: self.total_sessions,
        }
    }
}
