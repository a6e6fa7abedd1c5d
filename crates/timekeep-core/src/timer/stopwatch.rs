use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{now_ms, TimerKind};
use crate::events::Event;

pub const MAX_LAPS: usize = 99;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stopwatch {
    pub is_running: bool,
    pub is_paused: bool,
    pub elapsed_ms: u64,
    /// Split times in milliseconds from the start.
    pub laps: Vec<u64>,
    /// Wall-clock time spent paused during this run.
    pub paused_ms: u64,
    #[serde(default)]
    paused_since_ms: Option<u64>,
}

impl Stopwatch {
    pub fn start(&mut self) -> bool {
        if self.is_running {
            return false;
        }
        if let Some(since) = self.paused_since_ms.take() {
            self.paused_ms = self
                .paused_ms
                .saturating_add(now_ms().saturating_sub(since));
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
        self.paused_since_ms = Some(now_ms());
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record the current elapsed time as a split.
    pub fn add_lap(&mut self) -> Option<Event> {
        if self.elapsed_ms == 0 || self.laps.len() >= MAX_LAPS {
            return None;
        }
        self.laps.push(self.elapsed_ms);
        Some(Event::LapRecorded {
            lap: self.laps.len(),
            split_ms: self.elapsed_ms,
            at: Utc::now(),
        })
    }

    /// Individual lap durations (difference between consecutive splits).
    pub fn lap_durations(&self) -> Vec<u64> {
        let mut prev = 0;
        self.laps
            .iter()
            .map(|&split| {
                let d = split.saturating_sub(prev);
                prev = split;
                d
            })
            .collect()
    }

    pub fn tick(&mut self, delta_ms: u64, _events: &mut Vec<Event>) {
        if self.is_running {
            self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        }
    }

    pub(crate) fn session_end(&self) -> Option<Event> {
        if self.elapsed_ms == 0 {
            return None;
        }
        Some(Event::SessionEnded {
            kind: TimerKind::Stopwatch,
            duration_ms: self.elapsed_ms,
            completed: true,
            laps: (!self.laps.is_empty()).then(|| self.laps.clone()),
            name: None,
            at: Utc::now(),
        })
    }
}
