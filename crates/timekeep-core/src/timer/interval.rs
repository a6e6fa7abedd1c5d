use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{drain, Phase, TimerKind};
use crate::events::Event;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub is_running: bool,
    pub is_paused: bool,
    pub work_ms: u64,
    pub rest_ms: u64,
    pub total_cycles: u32,
    /// 1-based.
    pub current_cycle: u32,
    pub is_work_phase: bool,
    pub remaining_ms: u64,
    pub is_completed: bool,
    pub total_work_ms: u64,
    pub total_rest_ms: u64,
}

impl Default for Interval {
    fn default() -> Self {
        Self::new(20_000, 10_000, 8)
    }
}

impl Interval {
    pub fn new(work_ms: u64, rest_ms: u64, total_cycles: u32) -> Self {
        Self {
            is_running: false,
            is_paused: false,
            work_ms,
            rest_ms,
            total_cycles,
            current_cycle: 1,
            is_work_phase: true,
            remaining_ms: work_ms,
            is_completed: false,
            total_work_ms: 0,
            total_rest_ms: 0,
        }
    }

    pub fn start(&mut self) -> bool {
        if self.is_running || self.work_ms == 0 || self.total_cycles == 0 {
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

    pub fn reset(&mut self) {
        *self = Self::new(self.work_ms, self.rest_ms, self.total_cycles);
    }

    pub fn tick(&mut self, delta_ms: u64, events: &mut Vec<Event>) {
        if !self.is_running {
            return;
        }
        let consumed = delta_ms.min(self.remaining_ms);
        if self.is_work_phase {
            self.total_work_ms += consumed;
        } else {
            self.total_rest_ms += consumed;
        }
        if drain(&mut self.remaining_ms, delta_ms) {
            self.phase_end(events);
        }
    }

    /// End the current phase early, applying the same transition as reaching zero.
    pub fn skip_phase(&mut self, events: &mut Vec<Event>) -> bool {
        if self.is_completed {
            return false;
        }
        self.phase_end(events);
        true
    }

    fn phase_end(&mut self, events: &mut Vec<Event>) {
        if self.is_work_phase && self.rest_ms > 0 {
            self.is_work_phase = false;
            self.remaining_ms = self.rest_ms;
            events.push(self.phase_event(Phase::Rest));
            return;
        }

        if self.current_cycle >= self.total_cycles {
            self.is_completed = true;
            self.is_running = false;
            self.is_paused = false;
            self.remaining_ms = 0;
            let at = Utc::now();
            events.push(Event::TimerCompleted {
                kind: TimerKind::Interval,
                at,
            });
            events.push(Event::SessionEnded {
                kind: TimerKind::Interval,
                duration_ms: self.total_work_ms + self.total_rest_ms,
                completed: true,
                laps: None,
                name: None,
                at,
            });
        } else {
            self.current_cycle += 1;
            self.is_work_phase = true;
            self.remaining_ms = self.work_ms;
            events.push(self.phase_event(Phase::Work));
        }
    }

    fn phase_event(&self, phase: Phase) -> Event {
        Event::PhaseChanged {
            kind: TimerKind::Interval,
            phase,
            cycle: self.current_cycle,
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        }
    }

    pub fn current_phase_ms(&self) -> u64 {
        if self.is_work_phase {
            self.work_ms
        } else {
            self.rest_ms
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_end_enters_rest() {
        let mut it = Interval::new(30_000, 10_000, 3);
        let mut events = Vec::new();
        it.start();
        it.tick(30_000, &mut events);
        assert!(!it.is_work_phase);
        assert_eq!(it.remaining_ms, 10_000);
        assert_eq!(it.total_work_ms, 30_000);
        assert!(matches!(
            events.last(),
            Some(Event::PhaseChanged { phase: Phase::Rest, .. })
        ));
    }

    #[test]
    fn final_rest_completes() {
        let mut it = Interval::new(1000, 500, 2);
        let mut events = Vec::new();
        it.start();
        for _ in 0..2 {
            it.tick(1000, &mut events);
            it.tick(500, &mut events);
        }
        assert!(it.is_completed);
        assert!(!it.is_running);
        assert_eq!(it.current_cycle, 2);
        assert_eq!(it.total_work_ms, 2000);
        assert_eq!(it.total_rest_ms, 1000);
    }

    #[test]
    fn zero_rest_goes_straight_to_next_cycle() {
        let mut it = Interval::new(1000, 0, 3);
        let mut events = Vec::new();
        it.start();
        it.tick(1000, &mut events);
        assert!(it.is_work_phase);
        assert_eq!(it.current_cycle, 2);
    }

    #[test]
    fn skip_phase_on_completed_is_noop() {
        let mut it = Interval::new(1000, 0, 1);
        let mut events = Vec::new();
        it.start();
        it.tick(1000, &mut events);
        assert!(it.is_completed);
        assert!(!it.skip_phase(&mut events));
    }
}
