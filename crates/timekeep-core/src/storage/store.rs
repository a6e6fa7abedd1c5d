//! Preference and history store over the key-value table.
//!
//! Reads never fail: a missing or corrupt blob is logged and replaced by
//! its default. Writes return errors so callers can decide whether to
//! surface them (CLI) or log and move on (runtime).

use chrono::{DateTime, Local, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::blobs::{Alarm, ClockSettings, PomodoroSettings};
use super::database::Database;
use super::stats::UserStats;
use super::{dotpath, keys};
use crate::error::{ConfigError, CoreError, ValidationError};
use crate::events::Event;
use crate::timer::TimerKind;

/// Maximum number of history entries kept; the oldest are dropped.
pub const HISTORY_LIMIT: usize = 100;

const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub audio_enabled: bool,
    /// 0-100.
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    /// Ask before resetting a running timer.
    #[serde(default = "default_true")]
    pub confirm_reset: bool,
    #[serde(default = "default_presets")]
    pub favorite_presets_ms: Vec<u64>,
    #[serde(default)]
    pub ads_disabled: bool,
}

fn default_true() -> bool {
    true
}
fn default_volume() -> u8 {
    70
}
fn default_presets() -> Vec<u64> {
    vec![60_000, 5 * 60_000, 10 * 60_000, 25 * 60_000]
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            audio_enabled: true,
            volume: default_volume(),
            notifications_enabled: true,
            confirm_reset: true,
            favorite_presets_ms: default_presets(),
            ads_disabled: false,
        }
    }
}

/// One finished (or abandoned) timing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timer_type: TimerKind,
    pub duration_ms: u64,
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laps: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl HistoryEntry {
    pub fn new(timer_type: TimerKind, duration_ms: u64, completed: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timer_type,
            duration_ms,
            completed,
            timestamp: Utc::now(),
            laps: None,
            name: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_laps(mut self, laps: Vec<u64>) -> Self {
        self.laps = Some(laps);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build the entry for a `SessionEnded` event; other events yield `None`.
    pub fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::SessionEnded {
                kind,
                duration_ms,
                completed,
                laps,
                name,
                at,
            } => Some(Self {
                id: Uuid::new_v4().to_string(),
                timer_type: *kind,
                duration_ms: *duration_ms,
                completed: *completed,
                timestamp: *at,
                laps: laps.clone(),
                name: name.clone(),
            }),
            _ => None,
        }
    }
}

/// Whole-state export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub preferences: Preferences,
    pub history: Vec<HistoryEntry>,
    pub stats: UserStats,
    #[serde(default)]
    pub alarms: Vec<Alarm>,
    #[serde(default)]
    pub clock_settings: ClockSettings,
    #[serde(default)]
    pub pomodoro_settings: PomodoroSettings,
}

pub struct Store {
    db: Database,
}

impl Store {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the store in the default data directory.
    pub fn open() -> Result<Self, CoreError> {
        Ok(Self::new(Database::open()?))
    }

    pub fn open_memory() -> Result<Self, CoreError> {
        Ok(Self::new(Database::open_memory()?))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.db.kv_get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, "storage read failed: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "ignoring corrupt stored value: {e}");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        let json = serde_json::to_string(value)?;
        self.db.kv_set(key, &json)?;
        Ok(())
    }

    // ── Preferences ──────────────────────────────────────────────────

    pub fn preferences(&self) -> Preferences {
        self.read(keys::PREFERENCES).unwrap_or_default()
    }

    pub fn set_preferences(&self, prefs: &Preferences) -> Result<(), CoreError> {
        self.write(keys::PREFERENCES, prefs)
    }

    /// Get one preference by dot-separated key.
    pub fn preference(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self.preferences()).ok()?;
        dotpath::get_string(&json, key)
    }

    /// Set one preference by key, validating it against the current type.
    pub fn set_preference(&self, key: &str, value: &str) -> Result<Preferences, CoreError> {
        let mut json = serde_json::to_value(self.preferences())?;
        dotpath::set(&mut json, key, value)?;
        let mut prefs: Preferences =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        prefs.volume = prefs.volume.min(100);
        self.set_preferences(&prefs)?;
        Ok(prefs)
    }

    // ── History ──────────────────────────────────────────────────────

    /// Full history, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.read(keys::HISTORY).unwrap_or_default()
    }

    /// Prepend an entry, drop anything past [`HISTORY_LIMIT`], and refresh
    /// the stats view.
    pub fn add_history_entry(&self, entry: HistoryEntry) -> Result<UserStats, CoreError> {
        let mut history = self.history();
        history.insert(0, entry);
        history.truncate(HISTORY_LIMIT);
        self.write(keys::HISTORY, &history)?;

        let stats = UserStats::from_history(&history, Local::now().date_naive());
        self.write(keys::USER_STATS, &stats)?;
        Ok(stats)
    }

    /// Drop all history and reset the stats view. Preferences stay.
    pub fn clear_history(&self) -> Result<(), CoreError> {
        self.db.kv_delete(keys::HISTORY)?;
        self.write(keys::USER_STATS, &UserStats::default())
    }

    pub fn recent_history(&self, limit: usize) -> Vec<HistoryEntry> {
        let mut history = self.history();
        history.truncate(limit);
        history
    }

    pub fn history_by_type(&self, kind: TimerKind) -> Vec<HistoryEntry> {
        self.history()
            .into_iter()
            .filter(|e| e.timer_type == kind)
            .collect()
    }

    /// Stats recomputed from the current history.
    pub fn stats(&self) -> UserStats {
        UserStats::from_history(&self.history(), Local::now().date_naive())
    }

    /// The stats view as last written.
    pub fn stored_stats(&self) -> Option<UserStats> {
        self.read(keys::USER_STATS)
    }

    // ── Feature blobs ────────────────────────────────────────────────

    pub fn alarms(&self) -> Vec<Alarm> {
        self.read(keys::ALARMS).unwrap_or_default()
    }

    pub fn set_alarms(&self, alarms: &[Alarm]) -> Result<(), CoreError> {
        self.write(keys::ALARMS, alarms)
    }

    pub fn clock_settings(&self) -> ClockSettings {
        self.read(keys::CLOCK_SETTINGS).unwrap_or_default()
    }

    pub fn set_clock_settings(&self, settings: &ClockSettings) -> Result<(), CoreError> {
        self.write(keys::CLOCK_SETTINGS, settings)
    }

    pub fn pomodoro_settings(&self) -> PomodoroSettings {
        self.read(keys::POMODORO_SETTINGS).unwrap_or_default()
    }

    pub fn set_pomodoro_settings(&self, settings: &PomodoroSettings) -> Result<(), CoreError> {
        self.write(keys::POMODORO_SETTINGS, settings)
    }

    // ── Whole-state operations ───────────────────────────────────────

    pub fn export_data(&self) -> Result<String, CoreError> {
        let data = ExportData {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            preferences: self.preferences(),
            history: self.history(),
            stats: self.stats(),
            alarms: self.alarms(),
            clock_settings: self.clock_settings(),
            pomodoro_settings: self.pomodoro_settings(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Replace preferences, history and feature blobs with an export.
    /// Stats are rebuilt from the imported history.
    pub fn import_data(&self, json: &str) -> Result<ExportData, CoreError> {
        let mut data: ExportData = serde_json::from_str(json)
            .map_err(|e| ValidationError::InvalidImport(e.to_string()))?;
        if data.version > EXPORT_VERSION {
            return Err(ValidationError::InvalidImport(format!(
                "unsupported export version {}",
                data.version
            ))
            .into());
        }
        data.history.truncate(HISTORY_LIMIT);
        data.stats = UserStats::from_history(&data.history, Local::now().date_naive());

        self.set_preferences(&data.preferences)?;
        self.write(keys::HISTORY, &data.history)?;
        self.write(keys::USER_STATS, &data.stats)?;
        self.set_alarms(&data.alarms)?;
        self.set_clock_settings(&data.clock_settings)?;
        self.set_pomodoro_settings(&data.pomodoro_settings)?;
        Ok(data)
    }

    /// Remove everything, including the timer snapshot.
    pub fn clear_all_data(&self) -> Result<(), CoreError> {
        self.db.kv_clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_default_when_missing_or_corrupt() {
        let store = Store::open_memory().unwrap();
        assert_eq!(store.preferences(), Preferences::default());
        store.db().kv_set(keys::PREFERENCES, "{not json").unwrap();
        assert_eq!(store.preferences(), Preferences::default());
    }

    #[test]
    fn set_preference_by_key() {
        let store = Store::open_memory().unwrap();
        store.set_preference("theme", "dark").unwrap();
        store.set_preference("volume", "300").unwrap_err();
        assert_eq!(store.set_preference("volume", "250").unwrap().volume, 100);
        store.set_preference("volume", "40").unwrap();
        let prefs = store.preferences();
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.volume, 40);
        assert_eq!(store.preference("audio_enabled").as_deref(), Some("true"));
        assert!(store.set_preference("nope", "1").is_err());
    }

    #[test]
    fn history_is_newest_first_and_filterable() {
        let store = Store::open_memory().unwrap();
        store
            .add_history_entry(HistoryEntry::new(TimerKind::Egg, 1000, true))
            .unwrap();
        store
            .add_history_entry(HistoryEntry::new(TimerKind::Bomb, 2000, false))
            .unwrap();
        let recent = store.recent_history(1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].timer_type, TimerKind::Bomb);
        assert_eq!(store.history_by_type(TimerKind::Egg).len(), 1);
        assert_eq!(store.stored_stats().unwrap().total_sessions, 2);
    }

    #[test]
    fn from_event_ignores_non_session_events() {
        let event = Event::TimerReset {
            kind: TimerKind::Egg,
            at: Utc::now(),
        };
        assert!(HistoryEntry::from_event(&event).is_none());
    }

    #[test]
    fn import_rejects_garbage() {
        let store = Store::open_memory().unwrap();
        let err = store.import_data("[1, 2, 3]").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidImport(_))
        ));
    }

    #[test]
    fn clear_history_keeps_preferences() {
        let store = Store::open_memory().unwrap();
        store.set_preference("volume", "40").unwrap();
        store
            .add_history_entry(HistoryEntry::new(TimerKind::Egg, 1_000, true))
            .unwrap();
        store.clear_history().unwrap();
        assert!(store.history().is_empty());
        assert_eq!(store.stored_stats(), Some(UserStats::default()));
        assert_eq!(store.preferences().volume, 40);
    }
}
