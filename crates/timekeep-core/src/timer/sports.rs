//! Period clocks for basketball and hockey.
//!
//! Both share one shape: a period countdown, a period counter and two
//! home/away tallies. Basketball tallies points, hockey tallies penalties.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{drain, TimerKind};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum League {
    Basketball,
    Hockey,
}

impl League {
    pub fn kind(&self) -> TimerKind {
        match self {
            League::Basketball => TimerKind::Basketball,
            League::Hockey => TimerKind::Hockey,
        }
    }

    pub fn default_period_ms(&self) -> u64 {
        match self {
            League::Basketball => 12 * 60 * 1000,
            League::Hockey => 20 * 60 * 1000,
        }
    }

    pub fn default_periods(&self) -> u32 {
        match self {
            League::Basketball => 4,
            League::Hockey => 3,
        }
    }

    pub fn tally_label(&self) -> &'static str {
        match self {
            League::Basketball => "points",
            League::Hockey => "penalties",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sports {
    pub league: League,
    pub is_running: bool,
    pub is_paused: bool,
    pub period_ms: u64,
    pub remaining_ms: u64,
    /// 1-based.
    pub current_period: u32,
    pub total_periods: u32,
    pub home: u32,
    pub away: u32,
    pub period_ended: bool,
    pub is_game_over: bool,
}

impl Sports {
    pub fn new(league: League, period_ms: u64, total_periods: u32) -> Self {
        Self {
            league,
            is_running: false,
            is_paused: false,
            period_ms,
            remaining_ms: period_ms,
            current_period: 1,
            total_periods: total_periods.max(1),
            home: 0,
            away: 0,
            period_ended: false,
            is_game_over: false,
        }
    }

    pub fn for_league(league: League) -> Self {
        Self::new(league, league.default_period_ms(), league.default_periods())
    }

    pub fn kind(&self) -> TimerKind {
        self.league.kind()
    }

    /// Starting after a period ended rolls into the next period.
    pub fn start(&mut self) -> bool {
        if self.is_running || self.period_ms == 0 {
            return false;
        }
        if self.is_game_over {
            self.reset();
        } else if self.period_ended && !self.advance_period() {
            return false;
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

    pub fn reset(&mut self) {
        *self = Self::new(self.league, self.period_ms, self.total_periods);
    }

    /// Move to the next period with a fresh clock, stopped. Leaving a
    /// period early ends it: a running clock reports `TimerStopped` and the
    /// period reports `PeriodEnded`.
    pub fn next_period(&mut self, events: &mut Vec<Event>) -> bool {
        if self.is_game_over || self.current_period >= self.total_periods {
            return false;
        }
        let at = Utc::now();
        if self.is_running {
            events.push(Event::TimerStopped {
                kind: self.kind(),
                time_ms: self.remaining_ms,
                at,
            });
        }
        if !self.period_ended {
            events.push(Event::PeriodEnded {
                kind: self.kind(),
                period: self.current_period,
                at,
            });
        }
        self.advance_period();
        self.is_running = false;
        self.is_paused = false;
        true
    }

    fn advance_period(&mut self) -> bool {
        if self.current_period >= self.total_periods {
            return false;
        }
        self.current_period += 1;
        self.remaining_ms = self.period_ms;
        self.period_ended = false;
        true
    }

    /// Add `delta` to one side's tally, clamped at zero.
    pub fn adjust(&mut self, side: Side, delta: i32) -> Event {
        let counter = match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        };
        *counter = (i64::from(*counter) + i64::from(delta)).clamp(0, i64::from(u32::MAX)) as u32;
        Event::ScoreChanged {
            kind: self.kind(),
            side,
            home: self.home,
            away: self.away,
            at: Utc::now(),
        }
    }

    pub fn tick(&mut self, delta_ms: u64, events: &mut Vec<Event>) {
        if !self.is_running || !drain(&mut self.remaining_ms, delta_ms) {
            return;
        }
        self.is_running = false;
        self.is_paused = false;
        self.period_ended = true;
        let at = Utc::now();
        events.push(Event::PeriodEnded {
            kind: self.kind(),
            period: self.current_period,
            at,
        });
        if self.current_period >= self.total_periods {
            self.is_game_over = true;
            events.push(Event::TimerCompleted {
                kind: self.kind(),
                at,
            });
            events.push(Event::SessionEnded {
                kind: self.kind(),
                duration_ms: self.period_ms * u64::from(self.total_periods),
                completed: true,
                laps: None,
                name: Some(format!("{}-{}", self.home, self.away)),
                at,
            });
        }
    }

    /// Game clock consumed so far.
    pub fn played_ms(&self) -> u64 {
        let finished = u64::from(self.current_period.saturating_sub(1)) * self.period_ms;
        finished + self.period_ms.saturating_sub(self.remaining_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_end_stops_clock() {
        let mut game = Sports::new(League::Hockey, 1000, 3);
        let mut events = Vec::new();
        game.start();
        game.tick(1000, &mut events);
        assert!(game.period_ended);
        assert!(!game.is_running);
        assert!(!game.is_game_over);

        assert!(game.start(), "start rolls into next period");
        assert_eq!(game.current_period, 2);
        assert_eq!(game.remaining_ms, 1000);
    }

    #[test]
    fn last_period_ends_game() {
        let mut game = Sports::new(League::Basketball, 500, 2);
        let mut events = Vec::new();
        game.start();
        game.tick(500, &mut events);
        assert!(game.next_period(&mut events));
        game.start();
        game.tick(500, &mut events);
        assert!(game.is_game_over);
        assert!(!game.next_period(&mut events));
        assert_eq!(game.played_ms(), 1000);
    }

    #[test]
    fn tallies_clamp_at_zero() {
        let mut game = Sports::for_league(League::Basketball);
        game.adjust(Side::Home, 3);
        game.adjust(Side::Away, -2);
        game.adjust(Side::Home, -1);
        assert_eq!(game.home, 2);
        assert_eq!(game.away, 0);
    }

    #[test]
    fn next_period_mid_clock_reports_stop_and_period_end() {
        let mut game = Sports::new(League::Hockey, 1000, 3);
        let mut events = Vec::new();
        game.start();
        game.tick(400, &mut events);
        assert!(events.is_empty());

        assert!(game.next_period(&mut events));
        assert!(matches!(
            events.as_slice(),
            [
                Event::TimerStopped { time_ms: 600, .. },
                Event::PeriodEnded { period: 1, .. }
            ]
        ));
        assert!(!game.is_running);
        assert_eq!(game.current_period, 2);
        assert_eq!(game.remaining_ms, 1000);

        // The clock already stopped at the buzzer: nothing more to report.
        events.clear();
        game.start();
        game.tick(1000, &mut events);
        events.clear();
        assert!(game.next_period(&mut events));
        assert!(events.is_empty());
        assert_eq!(game.current_period, 3);
    }
}
