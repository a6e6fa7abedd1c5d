//! Saved engine state and wall-clock fast-forward.
//!
//! A snapshot is the whole engine plus the time it was taken. Restoring it
//! advances every running timer by the real time that passed since, using
//! the same reducer as a regular tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::engine::TimerEngine;
use crate::error::CoreError;
use crate::events::Event;
use crate::storage::{keys, Database};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub engine: TimerEngine,
    pub saved_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn capture(engine: &TimerEngine, now: DateTime<Utc>) -> Self {
        Self {
            engine: engine.clone(),
            saved_at: now,
        }
    }

    /// Milliseconds between `saved_at` and `now`. A clock that went
    /// backwards counts as no time at all.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        (now - self.saved_at).num_milliseconds().max(0) as u64
    }

    /// Fast-forward the saved engine to `now`.
    ///
    /// Stopped timers come back untouched; running timers see a single tick
    /// of the elapsed time, so anything that expired in the meantime reports
    /// its completion events here.
    pub fn restore(self, now: DateTime<Utc>) -> (TimerEngine, Vec<Event>) {
        let elapsed = self.elapsed_ms(now);
        let mut engine = self.engine;
        let events = if elapsed > 0 && engine.any_running() {
            debug!(elapsed, "fast-forwarding restored timers");
            engine.tick(elapsed)
        } else {
            Vec::new()
        };
        (engine, events)
    }

    /// Read the last snapshot. Missing or unreadable data yields `None`.
    pub fn load(db: &Database) -> Option<Self> {
        let raw = match db.kv_get(keys::TIMER_STATES) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("failed to read timer snapshot: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("discarding unreadable timer snapshot: {e}");
                None
            }
        }
    }

    pub fn save(&self, db: &Database) -> Result<(), CoreError> {
        let json = serde_json::to_string(self)?;
        db.kv_set(keys::TIMER_STATES, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{Command, Timer, TimerConfig, TimerKind};
    use chrono::Duration;

    fn running_countdown(ms: u64) -> TimerEngine {
        let mut engine = TimerEngine::new();
        engine.dispatch(Command::Setup(TimerConfig::Countdown { duration_ms: ms }));
        engine.dispatch(Command::Start(TimerKind::Countdown));
        engine
    }

    #[test]
    fn restore_subtracts_hidden_time() {
        let saved_at = Utc::now();
        let snapshot = Snapshot::capture(&running_countdown(60_000), saved_at);
        let (engine, events) = snapshot.restore(saved_at + Duration::seconds(20));
        assert_eq!(engine.get(TimerKind::Countdown).unwrap().display_ms(), 40_000);
        assert!(events.is_empty());
    }

    #[test]
    fn restore_expires_overdue_countdown() {
        let saved_at = Utc::now();
        let snapshot = Snapshot::capture(&running_countdown(5_000), saved_at);
        let (engine, events) = snapshot.restore(saved_at + Duration::seconds(30));
        let Some(Timer::Countdown(cd)) = engine.get(TimerKind::Countdown) else {
            panic!("countdown missing");
        };
        assert_eq!(cd.remaining_ms, 0);
        assert!(cd.is_expired);
        assert!(!cd.is_running);
        assert!(events.iter().any(Event::is_terminal));
    }

    #[test]
    fn clock_skew_counts_as_zero() {
        let saved_at = Utc::now();
        let snapshot = Snapshot::capture(&running_countdown(5_000), saved_at);
        assert_eq!(snapshot.elapsed_ms(saved_at - Duration::seconds(10)), 0);
        let (engine, _) = snapshot.restore(saved_at - Duration::seconds(10));
        assert_eq!(engine.get(TimerKind::Countdown).unwrap().display_ms(), 5_000);
    }

    #[test]
    fn stopped_timers_are_untouched() {
        let mut engine = running_countdown(5_000);
        engine.dispatch(Command::Stop(TimerKind::Countdown));
        let saved_at = Utc::now();
        let (restored, _) =
            Snapshot::capture(&engine, saved_at).restore(saved_at + Duration::seconds(3));
        assert_eq!(restored, engine);
    }

    #[test]
    fn save_and_load_through_database() {
        let db = Database::open_memory().unwrap();
        assert!(Snapshot::load(&db).is_none());
        let snapshot = Snapshot::capture(&running_countdown(1_000), Utc::now());
        snapshot.save(&db).unwrap();
        assert_eq!(Snapshot::load(&db), Some(snapshot));

        db.kv_set(keys::TIMER_STATES, "garbage").unwrap();
        assert!(Snapshot::load(&db).is_none());
    }
}
