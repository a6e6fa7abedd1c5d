//! Presentation timer: an ordered list of timed segments.
//!
//! Running out of time on a segment and calling `next_segment` do the same
//! thing: the segment is marked completed and the next one starts. After
//! the last segment the presentation is complete and the clock stops.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{drain, TimerKind};
use crate::events::Event;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub title: String,
    pub duration_ms: u64,
    pub completed: bool,
}

/// Segment description used to configure the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub title: String,
    pub duration_ms: u64,
}

impl SegmentSpec {
    pub fn new(title: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            title: title.into(),
            duration_ms,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub is_running: bool,
    pub is_paused: bool,
    pub segments: Vec<Segment>,
    pub current_segment: usize,
    pub remaining_ms: u64,
    pub is_complete: bool,
}

impl Presentation {
    /// Zero-length segments are dropped.
    pub fn new(specs: Vec<SegmentSpec>) -> Self {
        let segments: Vec<Segment> = specs
            .into_iter()
            .filter(|s| s.duration_ms > 0)
            .map(|s| Segment {
                id: Uuid::new_v4().to_string(),
                title: s.title,
                duration_ms: s.duration_ms,
                completed: false,
            })
            .collect();
        let remaining_ms = segments.first().map(|s| s.duration_ms).unwrap_or(0);
        Self {
            is_running: false,
            is_paused: false,
            segments,
            current_segment: 0,
            remaining_ms,
            is_complete: false,
        }
    }

    pub fn current(&self) -> Option<&Segment> {
        self.segments.get(self.current_segment)
    }

    pub fn total_ms(&self) -> u64 {
        self.segments.iter().map(|s| s.duration_ms).sum()
    }

    pub fn start(&mut self) -> bool {
        if self.is_running || self.segments.is_empty() {
            return false;
        }
        if self.is_complete {
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
        for segment in &mut self.segments {
            segment.completed = false;
        }
        self.current_segment = 0;
        self.remaining_ms = self.segments.first().map(|s| s.duration_ms).unwrap_or(0);
        self.is_running = false;
        self.is_paused = false;
        self.is_complete = false;
    }

    pub fn tick(&mut self, delta_ms: u64, events: &mut Vec<Event>) {
        if self.is_running && drain(&mut self.remaining_ms, delta_ms) {
            self.advance(events);
        }
    }

    pub fn next_segment(&mut self, events: &mut Vec<Event>) -> bool {
        if self.is_complete || self.segments.is_empty() {
            return false;
        }
        self.advance(events);
        true
    }

    fn advance(&mut self, events: &mut Vec<Event>) {
        let at = Utc::now();
        let index = self.current_segment;
        let Some(segment) = self.segments.get_mut(index) else {
            return;
        };
        segment.completed = true;
        events.push(Event::SegmentCompleted {
            index,
            title: segment.title.clone(),
            at,
        });

        if index + 1 < self.segments.len() {
            self.current_segment = index + 1;
            self.remaining_ms = self.segments[index + 1].duration_ms;
        } else {
            self.is_complete = true;
            self.is_running = false;
            self.is_paused = false;
            self.remaining_ms = 0;
            events.push(Event::TimerCompleted {
                kind: TimerKind::Presentation,
                at,
            });
            events.push(Event::SessionEnded {
                kind: TimerKind::Presentation,
                duration_ms: self.total_ms(),
                completed: true,
                laps: None,
                name: None,
                at,
            });
        }
    }

    /// Time spent on completed segments plus the current one.
    pub fn elapsed_ms(&self) -> u64 {
        let done: u64 = self
            .segments
            .iter()
            .filter(|s| s.completed)
            .map(|s| s.duration_ms)
            .sum();
        let current = self
            .current()
            .filter(|s| !s.completed)
            .map(|s| s.duration_ms.saturating_sub(self.remaining_ms))
            .unwrap_or(0);
        done + current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn talk() -> Presentation {
        Presentation::new(vec![
            SegmentSpec::new("Intro", 1000),
            SegmentSpec::new("Skipped", 0),
            SegmentSpec::new("Body", 3000),
            SegmentSpec::new("Q&A", 2000),
        ])
    }

    #[test]
    fn zero_segments_are_dropped() {
        assert_eq!(talk().segments.len(), 3);
    }

    #[test]
    fn reaching_zero_advances_and_keeps_running() {
        let mut p = talk();
        let mut events = Vec::new();
        p.start();
        p.tick(1000, &mut events);
        assert!(p.segments[0].completed);
        assert_eq!(p.current_segment, 1);
        assert_eq!(p.remaining_ms, 3000);
        assert!(p.is_running);
    }

    #[test]
    fn manual_advance_matches_auto_advance() {
        let mut p = talk();
        let mut events = Vec::new();
        p.start();
        assert!(p.next_segment(&mut events));
        assert!(p.next_segment(&mut events));
        assert!(p.next_segment(&mut events));
        assert!(p.is_complete);
        assert!(!p.is_running);
        assert!(p.segments.iter().all(|s| s.completed));
        assert!(!p.next_segment(&mut events));
    }

    #[test]
    fn empty_presentation_does_not_start() {
        let mut p = Presentation::default();
        assert!(!p.start());
    }
}
