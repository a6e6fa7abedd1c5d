//! Pomodoro cycle: work sessions separated by short breaks, with a long
//! break after every `sessions_until_long_break` work sessions.
//!
//! ```text
//! Work(1) -> Short -> Work(2) -> ... -> Work(n) -> Long -> ... -> Completed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{drain, Phase, TimerKind};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn phase(&self) -> Phase {
        match self {
            SessionType::Work => Phase::Work,
            SessionType::ShortBreak => Phase::ShortBreak,
            SessionType::LongBreak => Phase::LongBreak,
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionType::Work)
    }
}

/// One finished Pomodoro segment. Appended, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroRecord {
    pub session_type: SessionType,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pomodoro {
    pub is_running: bool,
    pub is_paused: bool,
    pub work_ms: u64,
    pub short_break_ms: u64,
    pub long_break_ms: u64,
    pub sessions_until_long_break: u32,
    pub total_sessions: u32,
    /// 1-based work session counter.
    pub current_session: u32,
    pub session_type: SessionType,
    pub remaining_ms: u64,
    pub is_completed: bool,
    pub total_work_ms: u64,
    pub total_break_ms: u64,
    #[serde(default)]
    pub history: Vec<PomodoroRecord>,
}

impl Default for Pomodoro {
    fn default() -> Self {
        Self::new(25 * 60 * 1000, 5 * 60 * 1000, 15 * 60 * 1000, 4, 4)
    }
}

impl Pomodoro {
    pub fn new(
        work_ms: u64,
        short_break_ms: u64,
        long_break_ms: u64,
        sessions_until_long_break: u32,
        total_sessions: u32,
    ) -> Self {
        Self {
            is_running: false,
            is_paused: false,
            work_ms,
            short_break_ms,
            long_break_ms,
            sessions_until_long_break: sessions_until_long_break.max(1),
            total_sessions: total_sessions.max(1),
            current_session: 1,
            session_type: SessionType::Work,
            remaining_ms: work_ms,
            is_completed: false,
            total_work_ms: 0,
            total_break_ms: 0,
            history: Vec::new(),
        }
    }

    pub fn duration_of(&self, session_type: SessionType) -> u64 {
        match session_type {
            SessionType::Work => self.work_ms,
            SessionType::ShortBreak => self.short_break_ms,
            SessionType::LongBreak => self.long_break_ms,
        }
    }

    pub fn start(&mut self) -> bool {
        let any_zero = self.work_ms == 0 || self.short_break_ms == 0 || self.long_break_ms == 0;
        if self.is_running || any_zero {
            return false;
        }
        if self.is_completed {
            self.reset();
        }
        self.is_running = true;
        self.is_paused = false;
        true
    }

    pub fn stop(&mut self) -> bool {
        if !self.is_running {
            return false;
        }
        self.is_running = false;
        self.is_paused = true;
        true
    }

    /// Back to session 1. The session history survives a reset.
    pub fn reset(&mut self) {
        let history = std::mem::take(&mut self.history);
        *self = Self::new(
            self.work_ms,
            self.short_break_ms,
            self.long_break_ms,
            self.sessions_until_long_break,
            self.total_sessions,
        );
        self.history = history;
    }

    pub fn tick(&mut self, delta_ms: u64, events: &mut Vec<Event>) {
        if !self.is_running {
            return;
        }
        let consumed = delta_ms.min(self.remaining_ms);
        if self.session_type.is_break() {
            self.total_break_ms += consumed;
        } else {
            self.total_work_ms += consumed;
        }
        if drain(&mut self.remaining_ms, delta_ms) {
            self.session_end(true, events);
        }
    }

    /// Jump to the next session without recording the current one.
    pub fn skip_session(&mut self, events: &mut Vec<Event>) -> bool {
        if self.is_completed {
            return false;
        }
        self.session_end(false, events);
        true
    }

    /// Which break follows the current work session.
    pub fn next_break(&self) -> SessionType {
        if self.current_session % self.sessions_until_long_break == 0 {
            SessionType::LongBreak
        } else {
            SessionType::ShortBreak
        }
    }

    fn session_end(&mut self, record: bool, events: &mut Vec<Event>) {
        let finished = self.session_type;
        let at = Utc::now();
        if record {
            self.history.push(PomodoroRecord {
                session_type: finished,
                duration_ms: self.duration_of(finished),
                completed_at: at,
            });
        }

        let next = match finished {
            SessionType::Work => Some(self.next_break()),
            SessionType::ShortBreak | SessionType::LongBreak => {
                if self.current_session >= self.total_sessions {
                    None
                } else {
                    self.current_session += 1;
                    Some(SessionType::Work)
                }
            }
        };

        match next {
            Some(next) => {
                if record {
                    events.push(Event::PomodoroSessionCompleted {
                        session: self.current_session,
                        session_type: finished,
                        next,
                        at,
                    });
                }
                self.session_type = next;
                self.remaining_ms = self.duration_of(next);
                events.push(Event::PhaseChanged {
                    kind: TimerKind::Pomodoro,
                    phase: next.phase(),
                    cycle: self.current_session,
                    remaining_ms: self.remaining_ms,
                    at,
                });
            }
            None => {
                self.is_completed = true;
                self.is_running = false;
                self.is_paused = false;
                self.remaining_ms = 0;
                events.push(Event::TimerCompleted {
                    kind: TimerKind::Pomodoro,
                    at,
                });
                events.push(Event::SessionEnded {
                    kind: TimerKind::Pomodoro,
                    duration_ms: self.total_work_ms + self.total_break_ms,
                    completed: true,
                    laps: None,
                    name: None,
                    at,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> Pomodoro {
        Pomodoro::new(1000, 200, 500, 2, 4)
    }

    #[test]
    fn work_end_records_history_and_picks_short_break() {
        let mut p = quick();
        let mut events = Vec::new();
        p.start();
        p.tick(1000, &mut events);
        assert_eq!(p.session_type, SessionType::ShortBreak);
        assert_eq!(p.remaining_ms, 200);
        assert_eq!(p.history.len(), 1);
        assert_eq!(p.history[0].session_type, SessionType::Work);
    }

    #[test]
    fn long_break_on_multiple_of_interval() {
        let mut p = quick();
        let mut events = Vec::new();
        p.start();
        p.tick(1000, &mut events); // work 1
        p.tick(200, &mut events); // short break
        assert_eq!(p.current_session, 2);
        p.tick(1000, &mut events); // work 2
        assert_eq!(p.session_type, SessionType::LongBreak);
        assert_eq!(p.remaining_ms, 500);
    }

    #[test]
    fn completes_after_total_sessions() {
        let mut p = Pomodoro::new(100, 50, 80, 2, 2);
        let mut events = Vec::new();
        p.start();
        for _ in 0..4 {
            p.tick(100, &mut events);
        }
        assert!(p.is_completed);
        assert!(!p.is_running);
        assert_eq!(p.current_session, 2);
        assert_eq!(p.history.len(), 4);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::TimerCompleted { kind: TimerKind::Pomodoro, .. })));
    }

    #[test]
    fn skip_does_not_record() {
        let mut p = quick();
        let mut events = Vec::new();
        p.start();
        assert!(p.skip_session(&mut events));
        assert_eq!(p.session_type, SessionType::ShortBreak);
        assert!(p.history.is_empty());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let p = Pomodoro::new(1000, 200, 500, 0, 0);
        assert_eq!(p.sessions_until_long_break, 1);
        assert_eq!(p.total_sessions, 1);
    }
}
