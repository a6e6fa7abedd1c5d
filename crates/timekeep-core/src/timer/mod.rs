mod countdown;
mod engine;
mod interval;
mod kind;
mod meditation;
mod pomodoro;
mod presentation;
pub mod snapshot;
mod sports;
mod stopwatch;

pub use countdown::{Bomb, Countdown, Difficulty, EggPreset, EggTimer};
pub use engine::{Command, Timer, TimerConfig, TimerEngine};
pub use interval::Interval;
pub use kind::{Phase, TimerKind};
pub use meditation::{BreathPhase, Meditation};
pub use pomodoro::{Pomodoro, PomodoroRecord, SessionType};
pub use presentation::{Presentation, Segment, SegmentSpec};
pub use snapshot::Snapshot;
pub use sports::{League, Side, Sports};
pub use stopwatch::{Stopwatch, MAX_LAPS};

/// Subtract `delta_ms` from a countdown field.
///
/// Returns `true` only on the call that takes `remaining` from non-zero to
/// zero, so completion side effects fire once.
pub(crate) fn drain(remaining: &mut u64, delta_ms: u64) -> bool {
    if *remaining == 0 {
        return false;
    }
    *remaining = remaining.saturating_sub(delta_ms);
    *remaining == 0
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::drain;

    #[test]
    fn drain_is_edge_triggered() {
        let mut remaining = 30;
        assert!(!drain(&mut remaining, 10));
        assert!(drain(&mut remaining, 50));
        assert_eq!(remaining, 0);
        assert!(!drain(&mut remaining, 10));
    }
}
