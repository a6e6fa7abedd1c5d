mod blobs;
mod config;
pub mod database;
mod dotpath;
pub mod stats;
mod store;

pub use blobs::{due_alarms, Alarm, ClockSettings, PomodoroSettings};
pub use config::{
    AudioConfig, Config, EngineConfig, NotificationBackendKind, NotificationsConfig, ServerConfig,
};
pub use database::Database;
pub use stats::{Achievement, UserStats};
pub use store::{ExportData, HistoryEntry, Preferences, Store, Theme, HISTORY_LIMIT};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Storage keys of the JSON blobs in the key-value table.
pub mod keys {
    pub const PREFERENCES: &str = "preferences";
    pub const HISTORY: &str = "history";
    pub const USER_STATS: &str = "user_stats";
    pub const TIMER_STATES: &str = "timer_states";
    pub const ALARMS: &str = "alarms";
    pub const CLOCK_SETTINGS: &str = "clock_settings";
    pub const POMODORO_SETTINGS: &str = "pomodoro_settings";
}

/// Returns the data directory, creating it if needed.
///
/// `TIMEKEEP_HOME` overrides the location. Otherwise `~/.config/timekeep`,
/// or `~/.config/timekeep-dev` when `TIMEKEEP_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TIMEKEEP_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TIMEKEEP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("timekeep-dev")
            } else {
                base_dir.join("timekeep")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
