//! Timer engine implementation.
//!
//! The engine is a plain state container holding one [`Timer`] per kind. It
//! does not use internal threads: the caller feeds it commands through
//! [`TimerEngine::dispatch`] and wall-clock deltas through
//! [`TimerEngine::tick`]. Both return the [`Event`]s the change produced.
//!
//! ## Exclusivity
//!
//! At most one timer runs at a time. Starting kind `K` stops every other
//! running timer first.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new();
//! engine.dispatch(Command::Setup(TimerConfig::Countdown { duration_ms: 5_000 }));
//! engine.dispatch(Command::Start(TimerKind::Countdown));
//! // In a loop:
//! let events = engine.tick(10);
//! ```

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::countdown::{Bomb, Countdown, Difficulty, EggPreset, EggTimer};
use super::interval::Interval;
use super::kind::TimerKind;
use super::meditation::Meditation;
use super::pomodoro::Pomodoro;
use super::presentation::{Presentation, SegmentSpec};
use super::sports::{League, Side, Sports};
use super::stopwatch::Stopwatch;
use crate::events::Event;

/// State of one timer variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Timer {
    Stopwatch(Stopwatch),
    Countdown(Countdown),
    Interval(Interval),
    Pomodoro(Pomodoro),
    Egg(EggTimer),
    Bomb(Bomb),
    Meditation(Meditation),
    Basketball(Sports),
    Hockey(Sports),
    Presentation(Presentation),
}

/// Parameters for `setup`. Configures a timer without starting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerConfig {
    Stopwatch,
    Countdown {
        duration_ms: u64,
    },
    Interval {
        work_ms: u64,
        rest_ms: u64,
        cycles: u32,
    },
    Pomodoro {
        work_ms: u64,
        short_break_ms: u64,
        long_break_ms: u64,
        sessions_until_long_break: u32,
        total_sessions: u32,
    },
    Egg {
        #[serde(default)]
        duration_ms: Option<u64>,
        #[serde(default)]
        preset: Option<EggPreset>,
    },
    Bomb {
        #[serde(default)]
        duration_ms: Option<u64>,
        #[serde(default)]
        difficulty: Difficulty,
    },
    Meditation {
        breathe_in_secs: u32,
        #[serde(default)]
        hold_secs: u32,
        breathe_out_secs: u32,
        cycles: u32,
        #[serde(default = "default_true")]
        sound_enabled: bool,
    },
    Basketball {
        #[serde(default)]
        period_ms: Option<u64>,
        #[serde(default)]
        periods: Option<u32>,
    },
    Hockey {
        #[serde(default)]
        period_ms: Option<u64>,
        #[serde(default)]
        periods: Option<u32>,
    },
    Presentation {
        segments: Vec<SegmentSpec>,
    },
}

fn default_true() -> bool {
    true
}

/// A named engine operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Setup(TimerConfig),
    Start(TimerKind),
    Stop(TimerKind),
    Reset(TimerKind),
    AddLap,
    SkipPhase(TimerKind),
    SkipSession,
    Defuse,
    NextSegment,
    AdjustScore {
        kind: TimerKind,
        side: Side,
        delta: i32,
    },
    NextPeriod(TimerKind),
}

impl TimerConfig {
    pub fn kind(&self) -> TimerKind {
        match self {
            TimerConfig::Stopwatch => TimerKind::Stopwatch,
            TimerConfig::Countdown { .. } => TimerKind::Countdown,
            TimerConfig::Interval { .. } => TimerKind::Interval,
            TimerConfig::Pomodoro { .. } => TimerKind::Pomodoro,
            TimerConfig::Egg { .. } => TimerKind::Egg,
            TimerConfig::Bomb { .. } => TimerKind::Bomb,
            TimerConfig::Meditation { .. } => TimerKind::Meditation,
            TimerConfig::Basketball { .. } => TimerKind::Basketball,
            TimerConfig::Hockey { .. } => TimerKind::Hockey,
            TimerConfig::Presentation { .. } => TimerKind::Presentation,
        }
    }

    fn build(self) -> Timer {
        match self {
            TimerConfig::Stopwatch => Timer::Stopwatch(Stopwatch::default()),
            TimerConfig::Countdown { duration_ms } => Timer::Countdown(Countdown::new(duration_ms)),
            TimerConfig::Interval {
                work_ms,
                rest_ms,
                cycles,
            } => Timer::Interval(Interval::new(work_ms, rest_ms, cycles)),
            TimerConfig::Pomodoro {
                work_ms,
                short_break_ms,
                long_break_ms,
                sessions_until_long_break,
                total_sessions,
            } => Timer::Pomodoro(Pomodoro::new(
                work_ms,
                short_break_ms,
                long_break_ms,
                sessions_until_long_break,
                total_sessions,
            )),
            TimerConfig::Egg {
                duration_ms,
                preset,
            } => {
                let duration = duration_ms
                    .or_else(|| preset.map(|p| p.duration_ms()))
                    .unwrap_or_else(|| EggPreset::Medium.duration_ms());
                Timer::Egg(EggTimer::new(duration, preset))
            }
            TimerConfig::Bomb {
                duration_ms,
                difficulty,
            } => Timer::Bomb(Bomb::new(
                duration_ms.unwrap_or_else(|| difficulty.default_duration_ms()),
                difficulty,
            )),
            TimerConfig::Meditation {
                breathe_in_secs,
                hold_secs,
                breathe_out_secs,
                cycles,
                sound_enabled,
            } => Timer::Meditation(Meditation::new(
                breathe_in_secs,
                hold_secs,
                breathe_out_secs,
                cycles,
                sound_enabled,
            )),
            TimerConfig::Basketball { period_ms, periods } => {
                Timer::Basketball(sports(League::Basketball, period_ms, periods))
            }
            TimerConfig::Hockey { period_ms, periods } => {
                Timer::Hockey(sports(League::Hockey, period_ms, periods))
            }
            TimerConfig::Presentation { segments } => {
                Timer::Presentation(Presentation::new(segments))
            }
        }
    }
}

fn sports(league: League, period_ms: Option<u64>, periods: Option<u32>) -> Sports {
    Sports::new(
        league,
        period_ms.unwrap_or_else(|| league.default_period_ms()),
        periods.unwrap_or_else(|| league.default_periods()),
    )
}

impl Timer {
    /// A timer of `kind` with default parameters.
    pub fn default_for(kind: TimerKind) -> Self {
        match kind {
            TimerKind::Stopwatch => Timer::Stopwatch(Stopwatch::default()),
            TimerKind::Countdown => Timer::Countdown(Countdown::default()),
            TimerKind::Interval => Timer::Interval(Interval::default()),
            TimerKind::Pomodoro => Timer::Pomodoro(Pomodoro::default()),
            TimerKind::Egg => Timer::Egg(EggTimer::default()),
            TimerKind::Bomb => Timer::Bomb(Bomb::default()),
            TimerKind::Meditation => Timer::Meditation(Meditation::default()),
            TimerKind::Basketball => Timer::Basketball(Sports::for_league(League::Basketball)),
            TimerKind::Hockey => Timer::Hockey(Sports::for_league(League::Hockey)),
            TimerKind::Presentation => Timer::Presentation(Presentation::default()),
        }
    }

    pub fn kind(&self) -> TimerKind {
        match self {
            Timer::Stopwatch(_) => TimerKind::Stopwatch,
            Timer::Countdown(_) => TimerKind::Countdown,
            Timer::Interval(_) => TimerKind::Interval,
            Timer::Pomodoro(_) => TimerKind::Pomodoro,
            Timer::Egg(_) => TimerKind::Egg,
            Timer::Bomb(_) => TimerKind::Bomb,
            Timer::Meditation(_) => TimerKind::Meditation,
            Timer::Basketball(_) => TimerKind::Basketball,
            Timer::Hockey(_) => TimerKind::Hockey,
            Timer::Presentation(_) => TimerKind::Presentation,
        }
    }

    pub fn is_running(&self) -> bool {
        match self {
            Timer::Stopwatch(t) => t.is_running,
            Timer::Countdown(t) => t.is_running,
            Timer::Interval(t) => t.is_running,
            Timer::Pomodoro(t) => t.is_running,
            Timer::Egg(t) => t.is_running,
            Timer::Bomb(t) => t.is_running,
            Timer::Meditation(t) => t.is_running,
            Timer::Basketball(t) | Timer::Hockey(t) => t.is_running,
            Timer::Presentation(t) => t.is_running,
        }
    }

    pub fn is_paused(&self) -> bool {
        match self {
            Timer::Stopwatch(t) => t.is_paused,
            Timer::Countdown(t) => t.is_paused,
            Timer::Interval(t) => t.is_paused,
            Timer::Pomodoro(t) => t.is_paused,
            Timer::Egg(t) => t.is_paused,
            Timer::Bomb(t) => t.is_paused,
            Timer::Meditation(t) => t.is_paused,
            Timer::Basketball(t) | Timer::Hockey(t) => t.is_paused,
            Timer::Presentation(t) => t.is_paused,
        }
    }

    /// Whether the current run reached its end state.
    pub fn is_finished(&self) -> bool {
        match self {
            Timer::Stopwatch(_) => false,
            Timer::Countdown(t) => t.is_expired,
            Timer::Interval(t) => t.is_completed,
            Timer::Pomodoro(t) => t.is_completed,
            Timer::Egg(t) => t.is_completed,
            Timer::Bomb(t) => t.is_exploded || t.is_defused,
            Timer::Meditation(t) => t.is_completed,
            Timer::Basketball(t) | Timer::Hockey(t) => t.is_game_over,
            Timer::Presentation(t) => t.is_complete,
        }
    }

    /// Time shown on the clock face: elapsed for the stopwatch, remaining
    /// in the current phase for everything else.
    pub fn display_ms(&self) -> u64 {
        match self {
            Timer::Stopwatch(t) => t.elapsed_ms,
            Timer::Countdown(t) => t.remaining_ms,
            Timer::Interval(t) => t.remaining_ms,
            Timer::Pomodoro(t) => t.remaining_ms,
            Timer::Egg(t) => t.remaining_ms,
            Timer::Bomb(t) => t.remaining_ms,
            Timer::Meditation(t) => t.remaining_ms,
            Timer::Basketball(t) | Timer::Hockey(t) => t.remaining_ms,
            Timer::Presentation(t) => t.remaining_ms,
        }
    }

    /// Full length of the current phase; `None` for the stopwatch.
    pub fn phase_total_ms(&self) -> Option<u64> {
        match self {
            Timer::Stopwatch(_) => None,
            Timer::Countdown(t) => Some(t.initial_ms),
            Timer::Interval(t) => Some(t.current_phase_ms()),
            Timer::Pomodoro(t) => Some(t.duration_of(t.session_type)),
            Timer::Egg(t) => Some(t.initial_ms),
            Timer::Bomb(t) => Some(t.initial_ms),
            Timer::Meditation(t) => Some(t.phase_ms(t.phase)),
            Timer::Basketball(t) | Timer::Hockey(t) => Some(t.period_ms),
            Timer::Presentation(t) => Some(t.current().map(|s| s.duration_ms).unwrap_or(0)),
        }
    }

    /// Time consumed in the current run.
    pub fn progress_ms(&self) -> u64 {
        match self {
            Timer::Stopwatch(t) => t.elapsed_ms,
            Timer::Countdown(t) => t.initial_ms.saturating_sub(t.remaining_ms),
            Timer::Interval(t) => t.total_work_ms + t.total_rest_ms,
            Timer::Pomodoro(t) => t.total_work_ms + t.total_break_ms,
            Timer::Egg(t) => t.initial_ms.saturating_sub(t.remaining_ms),
            Timer::Bomb(t) => t.initial_ms.saturating_sub(t.remaining_ms),
            Timer::Meditation(t) => t.elapsed_ms,
            Timer::Basketball(t) | Timer::Hockey(t) => t.played_ms(),
            Timer::Presentation(t) => t.elapsed_ms(),
        }
    }

    fn start(&mut self) -> bool {
        match self {
            Timer::Stopwatch(t) => t.start(),
            Timer::Countdown(t) => t.start(),
            Timer::Interval(t) => t.start(),
            Timer::Pomodoro(t) => t.start(),
            Timer::Egg(t) => t.start(),
            Timer::Bomb(t) => t.start(),
            Timer::Meditation(t) => t.start(),
            Timer::Basketball(t) | Timer::Hockey(t) => t.start(),
            Timer::Presentation(t) => t.start(),
        }
    }

    fn stop(&mut self) -> bool {
        match self {
            Timer::Stopwatch(t) => t.stop(),
            Timer::Countdown(t) => t.stop(),
            Timer::Interval(t) => t.stop(),
            Timer::Pomodoro(t) => t.stop(),
            Timer::Egg(t) => t.stop(),
            Timer::Bomb(t) => t.stop(),
            Timer::Meditation(t) => t.stop(),
            Timer::Basketball(t) | Timer::Hockey(t) => t.stop(),
            Timer::Presentation(t) => t.stop(),
        }
    }

    fn reset(&mut self) {
        match self {
            Timer::Stopwatch(t) => t.reset(),
            Timer::Countdown(t) => t.reset(),
            Timer::Interval(t) => t.reset(),
            Timer::Pomodoro(t) => t.reset(),
            Timer::Egg(t) => t.reset(),
            Timer::Bomb(t) => t.reset(),
            Timer::Meditation(t) => t.reset(),
            Timer::Basketball(t) | Timer::Hockey(t) => t.reset(),
            Timer::Presentation(t) => t.reset(),
        }
    }

    fn tick(&mut self, delta_ms: u64, events: &mut Vec<Event>) {
        match self {
            Timer::Stopwatch(t) => t.tick(delta_ms, events),
            Timer::Countdown(t) => t.tick(delta_ms, events),
            Timer::Interval(t) => t.tick(delta_ms, events),
            Timer::Pomodoro(t) => t.tick(delta_ms, events),
            Timer::Egg(t) => t.tick(delta_ms, events),
            Timer::Bomb(t) => t.tick(delta_ms, events),
            Timer::Meditation(t) => t.tick(delta_ms, events),
            Timer::Basketball(t) | Timer::Hockey(t) => t.tick(delta_ms, events),
            Timer::Presentation(t) => t.tick(delta_ms, events),
        }
    }

    /// History event for a run abandoned by `reset`.
    fn abandoned(&self) -> Option<Event> {
        if let Timer::Stopwatch(sw) = self {
            return sw.session_end();
        }
        let progress = self.progress_ms();
        if progress == 0 || self.is_finished() {
            return None;
        }
        Some(Event::SessionEnded {
            kind: self.kind(),
            duration_ms: progress,
            completed: false,
            laps: None,
            name: None,
            at: Utc::now(),
        })
    }
}

/// State container for every timer variant.
///
/// Timers are created lazily the first time a kind is configured or used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerEngine {
    #[serde(default)]
    timers: BTreeMap<TimerKind, Timer>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, kind: TimerKind) -> Option<&Timer> {
        self.timers.get(&kind)
    }

    pub fn timers(&self) -> impl Iterator<Item = &Timer> {
        self.timers.values()
    }

    pub fn any_running(&self) -> bool {
        self.timers.values().any(Timer::is_running)
    }

    pub fn running_kind(&self) -> Option<TimerKind> {
        self.timers.values().find(|t| t.is_running()).map(Timer::kind)
    }

    /// Remove a timer entirely; the next use recreates it with defaults.
    pub fn remove(&mut self, kind: TimerKind) -> Option<Timer> {
        self.timers.remove(&kind)
    }

    fn entry(&mut self, kind: TimerKind) -> &mut Timer {
        self.timers
            .entry(kind)
            .or_insert_with(|| Timer::default_for(kind))
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn dispatch(&mut self, command: Command) -> Vec<Event> {
        debug!(?command, "dispatch");
        let mut events = Vec::new();
        match command {
            Command::Setup(config) => self.setup(config, &mut events),
            Command::Start(kind) => self.start(kind, &mut events),
            Command::Stop(kind) => self.stop(kind, &mut events),
            Command::Reset(kind) => self.reset(kind, &mut events),
            Command::AddLap => {
                if let Timer::Stopwatch(sw) = self.entry(TimerKind::Stopwatch) {
                    events.extend(sw.add_lap());
                }
            }
            Command::SkipPhase(kind) => match self.entry(kind) {
                Timer::Interval(t) => {
                    t.skip_phase(&mut events);
                }
                Timer::Meditation(t) => {
                    t.skip_phase(&mut events);
                }
                Timer::Pomodoro(t) => {
                    t.skip_session(&mut events);
                }
                _ => {}
            },
            Command::SkipSession => {
                if let Timer::Pomodoro(p) = self.entry(TimerKind::Pomodoro) {
                    p.skip_session(&mut events);
                }
            }
            Command::Defuse => {
                if let Timer::Bomb(b) = self.entry(TimerKind::Bomb) {
                    b.defuse(&mut events);
                }
            }
            Command::NextSegment => {
                if let Timer::Presentation(p) = self.entry(TimerKind::Presentation) {
                    p.next_segment(&mut events);
                }
            }
            Command::AdjustScore { kind, side, delta } => {
                if let Timer::Basketball(s) | Timer::Hockey(s) = self.entry(kind) {
                    events.push(s.adjust(side, delta));
                }
            }
            Command::NextPeriod(kind) => {
                if let Timer::Basketball(s) | Timer::Hockey(s) = self.entry(kind) {
                    s.next_period(&mut events);
                }
            }
        }
        events
    }

    /// Replacing a timer mid-run ends its session as abandoned and stops it.
    fn setup(&mut self, config: TimerConfig, events: &mut Vec<Event>) {
        let kind = config.kind();
        if let Some(previous) = self.timers.get_mut(&kind) {
            events.extend(previous.abandoned());
            if previous.stop() {
                events.push(Event::TimerStopped {
                    kind,
                    time_ms: previous.display_ms(),
                    at: Utc::now(),
                });
            }
        }
        self.timers.insert(kind, config.build());
        events.push(Event::TimerConfigured {
            kind,
            at: Utc::now(),
        });
    }

    fn start(&mut self, kind: TimerKind, events: &mut Vec<Event>) {
        let timer = self.entry(kind);
        if !timer.start() {
            debug!(%kind, "start declined");
            return;
        }
        let time_ms = timer.display_ms();

        let at = Utc::now();
        for other in self.timers.values_mut() {
            if other.kind() != kind && other.stop() {
                events.push(Event::TimerStopped {
                    kind: other.kind(),
                    time_ms: other.display_ms(),
                    at,
                });
            }
        }
        events.push(Event::TimerStarted { kind, time_ms, at });
    }

    fn stop(&mut self, kind: TimerKind, events: &mut Vec<Event>) {
        if let Some(timer) = self.timers.get_mut(&kind) {
            if timer.stop() {
                events.push(Event::TimerStopped {
                    kind,
                    time_ms: timer.display_ms(),
                    at: Utc::now(),
                });
            }
        }
    }

    fn reset(&mut self, kind: TimerKind, events: &mut Vec<Event>) {
        let timer = self.entry(kind);
        events.extend(timer.abandoned());
        timer.reset();
        events.push(Event::TimerReset {
            kind,
            at: Utc::now(),
        });
    }

    /// Advance every running timer by `delta_ms`.
    pub fn tick(&mut self, delta_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for timer in self.timers.values_mut() {
            if timer.is_running() {
                timer.tick(delta_ms, &mut events);
            }
        }
        events
    }
}
