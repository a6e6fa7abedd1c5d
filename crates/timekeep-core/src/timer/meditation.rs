use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{drain, Phase, TimerKind};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathPhase {
    In,
    Hold,
    Out,
}

impl BreathPhase {
    pub fn phase(&self) -> Phase {
        match self {
            BreathPhase::In => Phase::BreatheIn,
            BreathPhase::Hold => Phase::Hold,
            BreathPhase::Out => Phase::BreatheOut,
        }
    }
}

/// Guided breathing: in, optional hold, out, repeated `total_cycles` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meditation {
    pub is_running: bool,
    pub is_paused: bool,
    pub breathe_in_secs: u32,
    /// 0 disables the hold phase.
    #[serde(default)]
    pub hold_secs: u32,
    pub breathe_out_secs: u32,
    pub total_cycles: u32,
    /// 1-based.
    pub current_cycle: u32,
    pub phase: BreathPhase,
    pub remaining_ms: u64,
    pub is_completed: bool,
    pub sound_enabled: bool,
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl Default for Meditation {
    fn default() -> Self {
        Self::new(4, 0, 6, 10, true)
    }
}

impl Meditation {
    pub fn new(
        breathe_in_secs: u32,
        hold_secs: u32,
        breathe_out_secs: u32,
        total_cycles: u32,
        sound_enabled: bool,
    ) -> Self {
        Self {
            is_running: false,
            is_paused: false,
            breathe_in_secs,
            hold_secs,
            breathe_out_secs,
            total_cycles,
            current_cycle: 1,
            phase: BreathPhase::In,
            remaining_ms: secs_to_ms(breathe_in_secs),
            is_completed: false,
            sound_enabled,
            elapsed_ms: 0,
        }
    }

    pub fn phase_ms(&self, phase: BreathPhase) -> u64 {
        secs_to_ms(match phase {
            BreathPhase::In => self.breathe_in_secs,
            BreathPhase::Hold => self.hold_secs,
            BreathPhase::Out => self.breathe_out_secs,
        })
    }

    pub fn start(&mut self) -> bool {
        let invalid =
            self.breathe_in_secs == 0 || self.breathe_out_secs == 0 || self.total_cycles == 0;
        if self.is_running || invalid {
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
        *self = Self::new(
            self.breathe_in_secs,
            self.hold_secs,
            self.breathe_out_secs,
            self.total_cycles,
            self.sound_enabled,
        );
    }

    pub fn tick(&mut self, delta_ms: u64, events: &mut Vec<Event>) {
        if !self.is_running {
            return;
        }
        self.elapsed_ms += delta_ms.min(self.remaining_ms);
        if drain(&mut self.remaining_ms, delta_ms) {
            self.phase_end(events);
        }
    }

    pub fn skip_phase(&mut self, events: &mut Vec<Event>) -> bool {
        if self.is_completed {
            return false;
        }
        self.phase_end(events);
        true
    }

    fn phase_end(&mut self, events: &mut Vec<Event>) {
        let next = match self.phase {
            BreathPhase::In if self.hold_secs > 0 => Some(BreathPhase::Hold),
            BreathPhase::In | BreathPhase::Hold => Some(BreathPhase::Out),
            BreathPhase::Out if self.current_cycle < self.total_cycles => {
                self.current_cycle += 1;
                Some(BreathPhase::In)
            }
            BreathPhase::Out => None,
        };

        let at = Utc::now();
        match next {
            Some(phase) => {
                self.phase = phase;
                self.remaining_ms = self.phase_ms(phase);
                events.push(Event::PhaseChanged {
                    kind: TimerKind::Meditation,
                    phase: phase.phase(),
                    cycle: self.current_cycle,
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
                    kind: TimerKind::Meditation,
                    at,
                });
                events.push(Event::SessionEnded {
                    kind: TimerKind::Meditation,
                    duration_ms: self.elapsed_ms,
                    completed: true,
                    laps: None,
                    name: None,
                    at,
                });
            }
        }
    }
}

fn secs_to_ms(secs: u32) -> u64 {
    u64::from(secs) * 1000
}
