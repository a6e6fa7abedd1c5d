use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, SessionType, Side, TimerKind};

/// Every state change in the engine produces an Event.
/// The runtime turns them into sounds, notifications and history entries;
/// the CLI prints them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerConfigured {
        kind: TimerKind,
        at: DateTime<Utc>,
    },
    TimerStarted {
        kind: TimerKind,
        /// Remaining time for countdown-style timers, elapsed for the stopwatch.
        time_ms: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        kind: TimerKind,
        time_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        kind: TimerKind,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        kind: TimerKind,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        kind: TimerKind,
        phase: Phase,
        cycle: u32,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    PomodoroSessionCompleted {
        session: u32,
        session_type: SessionType,
        next: SessionType,
        at: DateTime<Utc>,
    },
    LapRecorded {
        lap: usize,
        split_ms: u64,
        at: DateTime<Utc>,
    },
    BombDefused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    BombExploded {
        at: DateTime<Utc>,
    },
    SegmentCompleted {
        index: usize,
        title: String,
        at: DateTime<Utc>,
    },
    PeriodEnded {
        kind: TimerKind,
        period: u32,
        at: DateTime<Utc>,
    },
    ScoreChanged {
        kind: TimerKind,
        side: Side,
        home: u32,
        away: u32,
        at: DateTime<Utc>,
    },
    /// A timing session finished or was abandoned; feeds the history log.
    SessionEnded {
        kind: TimerKind,
        duration_ms: u64,
        completed: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        laps: Option<Vec<u64>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The timer kind this event concerns.
    pub fn kind(&self) -> TimerKind {
        match self {
            Event::TimerConfigured { kind, .. }
            | Event::TimerStarted { kind, .. }
            | Event::TimerStopped { kind, .. }
            | Event::TimerReset { kind, .. }
            | Event::TimerCompleted { kind, .. }
            | Event::PhaseChanged { kind, .. }
            | Event::PeriodEnded { kind, .. }
            | Event::ScoreChanged { kind, .. }
            | Event::SessionEnded { kind, .. } => *kind,
            Event::PomodoroSessionCompleted { .. } => TimerKind::Pomodoro,
            Event::LapRecorded { .. } => TimerKind::Stopwatch,
            Event::BombDefused { .. } | Event::BombExploded { .. } => TimerKind::Bomb,
            Event::SegmentCompleted { .. } => TimerKind::Presentation,
        }
    }

    /// Whether this event ends a run (used to wake the background worker).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::TimerCompleted { .. } | Event::BombExploded { .. } | Event::BombDefused { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::TimerCompleted {
            kind: TimerKind::Countdown,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TimerCompleted");
        assert_eq!(json["kind"], "countdown");
    }

    #[test]
    fn session_ended_omits_empty_laps() {
        let event = Event::SessionEnded {
            kind: TimerKind::Egg,
            duration_ms: 1000,
            completed: true,
            laps: None,
            name: None,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("laps").is_none());
        assert_eq!(event.kind(), TimerKind::Egg);
    }
}
