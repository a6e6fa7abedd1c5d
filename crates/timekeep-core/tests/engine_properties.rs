//! Property and scenario tests for the timer engine.

use proptest::prelude::*;
use timekeep_core::timer::{Command, SessionType, Timer, TimerConfig, TimerEngine, TimerKind};

fn kind_strategy() -> impl Strategy<Value = TimerKind> {
    prop::sample::select(TimerKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn countdown_remaining_stays_in_range(
        initial in 1u64..100_000,
        ticks in prop::collection::vec(0u64..20_000, 0..40),
    ) {
        let mut engine = TimerEngine::new();
        engine.dispatch(Command::Setup(TimerConfig::Countdown { duration_ms: initial }));
        engine.dispatch(Command::Start(TimerKind::Countdown));

        let mut total = 0u64;
        for delta in ticks {
            engine.tick(delta);
            total += delta;
            let Some(Timer::Countdown(cd)) = engine.get(TimerKind::Countdown) else {
                panic!("countdown missing");
            };
            prop_assert!(cd.remaining_ms <= initial);
            prop_assert_eq!(cd.remaining_ms, initial.saturating_sub(total));
            prop_assert_eq!(cd.is_expired, cd.remaining_ms == 0);
            prop_assert_eq!(cd.is_running, cd.remaining_ms > 0);
        }
    }

    #[test]
    fn phase_remaining_never_exceeds_phase_length(
        work in 1u64..5_000,
        rest in 0u64..5_000,
        cycles in 1u32..5,
        ticks in prop::collection::vec(0u64..3_000, 0..60),
    ) {
        let mut engine = TimerEngine::new();
        engine.dispatch(Command::Setup(TimerConfig::Interval {
            work_ms: work,
            rest_ms: rest,
            cycles,
        }));
        engine.dispatch(Command::Start(TimerKind::Interval));
        for delta in ticks {
            engine.tick(delta);
            let Some(Timer::Interval(t)) = engine.get(TimerKind::Interval) else {
                panic!("interval missing");
            };
            prop_assert!(t.remaining_ms <= t.current_phase_ms());
            prop_assert!(t.current_cycle <= t.total_cycles);
        }
    }

    #[test]
    fn every_kind_stays_within_its_phase_and_index_bounds(
        kind in kind_strategy(),
        steps in prop::collection::vec((0u64..900_000, any::<bool>()), 1..60),
    ) {
        let mut engine = TimerEngine::new();
        engine.dispatch(Command::Start(kind));
        for (delta, restart) in steps {
            if restart {
                engine.dispatch(Command::Start(kind));
            }
            engine.tick(delta);
            let timer = engine.get(kind).unwrap();
            if let Some(total) = timer.phase_total_ms() {
                prop_assert!(
                    timer.display_ms() <= total,
                    "{:?}: {} > {}", kind, timer.display_ms(), total
                );
            }
            match timer {
                Timer::Interval(t) => prop_assert!(t.current_cycle <= t.total_cycles),
                Timer::Pomodoro(t) => prop_assert!(t.current_session <= t.total_sessions),
                Timer::Meditation(t) => prop_assert!(t.current_cycle <= t.total_cycles),
                Timer::Basketball(t) | Timer::Hockey(t) => {
                    prop_assert!(t.current_period <= t.total_periods)
                }
                Timer::Presentation(t) => prop_assert!(t.current_segment <= t.segments.len()),
                _ => {}
            }
        }
    }

    #[test]
    fn at_most_one_timer_runs(starts in prop::collection::vec(kind_strategy(), 1..20)) {
        let mut engine = TimerEngine::new();
        for kind in starts {
            engine.dispatch(Command::Start(kind));
            engine.tick(7);
            prop_assert!(engine.timers().filter(|t| t.is_running()).count() <= 1);
        }
    }
}

#[test]
fn starting_a_stops_b() {
    let mut engine = TimerEngine::new();
    engine.dispatch(Command::Start(TimerKind::Interval));
    engine.dispatch(Command::Start(TimerKind::Meditation));
    assert!(!engine.get(TimerKind::Interval).unwrap().is_running());
    assert!(engine.get(TimerKind::Meditation).unwrap().is_running());
}

#[test]
fn interval_work_to_rest_and_completion() {
    let mut engine = TimerEngine::new();
    engine.dispatch(Command::Setup(TimerConfig::Interval {
        work_ms: 20_000,
        rest_ms: 10_000,
        cycles: 2,
    }));
    engine.dispatch(Command::Start(TimerKind::Interval));

    engine.tick(20_000);
    let Some(Timer::Interval(t)) = engine.get(TimerKind::Interval) else {
        panic!("interval missing");
    };
    assert!(!t.is_work_phase);
    assert_eq!(t.remaining_ms, 10_000);

    engine.tick(10_000);
    engine.tick(20_000);
    engine.tick(10_000);
    let Some(Timer::Interval(t)) = engine.get(TimerKind::Interval) else {
        panic!("interval missing");
    };
    assert!(t.is_completed);
    assert!(!t.is_running);
    assert_eq!(t.current_cycle, 2);
}

#[test]
fn pomodoro_long_break_every_fourth_session() {
    let mut engine = TimerEngine::new();
    engine.dispatch(Command::Setup(TimerConfig::Pomodoro {
        work_ms: 1_000,
        short_break_ms: 500,
        long_break_ms: 2_000,
        sessions_until_long_break: 4,
        total_sessions: 8,
    }));
    engine.dispatch(Command::Start(TimerKind::Pomodoro));

    let mut breaks = Vec::new();
    for _ in 0..8 {
        engine.tick(1_000);
        let Some(Timer::Pomodoro(p)) = engine.get(TimerKind::Pomodoro) else {
            panic!("pomodoro missing");
        };
        breaks.push((p.current_session, p.session_type));
        let length = p.duration_of(p.session_type);
        engine.tick(length);
    }

    for (session, break_type) in &breaks {
        let expected = if session % 4 == 0 {
            SessionType::LongBreak
        } else {
            SessionType::ShortBreak
        };
        assert_eq!(*break_type, expected, "after session {session}");
    }
    assert!(engine.get(TimerKind::Pomodoro).unwrap().is_finished());
}

#[test]
fn bomb_fifteen_seconds_explodes() {
    let mut engine = TimerEngine::new();
    engine.dispatch(Command::Setup(TimerConfig::Bomb {
        duration_ms: Some(15_000),
        difficulty: Default::default(),
    }));
    engine.dispatch(Command::Start(TimerKind::Bomb));
    let events = engine.tick(15_000);
    let Some(Timer::Bomb(b)) = engine.get(TimerKind::Bomb) else {
        panic!("bomb missing");
    };
    assert!(b.is_exploded);
    assert!(events.iter().any(|e| e.is_terminal()));
}
