use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use timekeep_core::storage::{PomodoroSettings, Store};
use timekeep_core::timer::{
    Difficulty, EggPreset, SegmentSpec, Side, Timer, TimerConfig, TimerKind,
};
use timekeep_core::{Command, Config, Event, Runtime};

use super::print_json;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Configure a timer without starting it
    Setup(SetupArgs),
    /// Start (or resume) a timer; any other running timer is paused
    Start { kind: TimerKind },
    /// Pause a timer
    Stop { kind: TimerKind },
    /// Reset a timer to its configured state
    Reset { kind: TimerKind },
    /// Print a timer's state as JSON
    Status {
        /// Timer kind; all timers when omitted
        kind: Option<TimerKind>,
    },
    /// Record a stopwatch lap
    Lap,
    /// Skip the current phase (interval, meditation) or Pomodoro session
    Skip { kind: TimerKind },
    /// Defuse the bomb
    Defuse,
    /// Move the presentation to its next segment
    Next,
    /// Adjust a scoreboard tally (points or penalties)
    Score {
        kind: TimerKind,
        /// Amount to add; negative values subtract
        #[arg(allow_hyphen_values = true)]
        delta: i32,
        /// Apply to the away side instead of home
        #[arg(long)]
        away: bool,
    },
    /// Advance a game clock to its next period
    NextPeriod { kind: TimerKind },
}

/// Setup parameters. Durations are in seconds; anything omitted keeps the
/// timer's current value.
#[derive(Args)]
pub struct SetupArgs {
    kind: TimerKind,
    /// Countdown, egg or bomb duration
    #[arg(long)]
    duration: Option<u64>,
    /// Interval or Pomodoro work length
    #[arg(long)]
    work: Option<u64>,
    /// Interval rest length
    #[arg(long)]
    rest: Option<u64>,
    /// Interval or meditation cycles
    #[arg(long)]
    cycles: Option<u32>,
    /// Pomodoro short break length
    #[arg(long)]
    short_break: Option<u64>,
    /// Pomodoro long break length
    #[arg(long)]
    long_break: Option<u64>,
    /// Pomodoro work sessions between long breaks
    #[arg(long)]
    sessions_until_long_break: Option<u32>,
    /// Pomodoro total work sessions
    #[arg(long)]
    sessions: Option<u32>,
    /// Egg preset (soft, medium, hard)
    #[arg(long)]
    preset: Option<EggPreset>,
    /// Bomb difficulty (easy, medium, hard)
    #[arg(long)]
    difficulty: Option<Difficulty>,
    /// Meditation breathe-in length
    #[arg(long)]
    inhale: Option<u32>,
    /// Meditation hold length
    #[arg(long)]
    hold: Option<u32>,
    /// Meditation breathe-out length
    #[arg(long)]
    exhale: Option<u32>,
    /// Silence meditation phase sounds
    #[arg(long, conflicts_with = "unmute")]
    mute: bool,
    /// Turn meditation phase sounds back on
    #[arg(long)]
    unmute: bool,
    /// Game clock period length
    #[arg(long)]
    period: Option<u64>,
    /// Game clock number of periods
    #[arg(long)]
    periods: Option<u32>,
    /// Presentation segment as "Title=SECONDS"; repeat for each segment
    #[arg(long = "segment", value_parser = parse_segment)]
    segments: Vec<SegmentSpec>,
}

fn parse_segment(raw: &str) -> Result<SegmentSpec, String> {
    let (title, secs) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected TITLE=SECONDS, got {raw:?}"))?;
    let secs: u64 = secs
        .trim()
        .parse()
        .map_err(|_| format!("invalid seconds in {raw:?}"))?;
    Ok(SegmentSpec::new(title.trim(), secs.saturating_mul(1000)))
}

fn secs(value: Option<u64>) -> Option<u64> {
    value.map(|s| s.saturating_mul(1000))
}

/// Build the setup config for `args.kind`, filling gaps from `current`.
fn build_config(args: SetupArgs, current: &Timer, pomodoro: &PomodoroSettings) -> TimerConfig {
    match current {
        Timer::Stopwatch(_) => TimerConfig::Stopwatch,
        Timer::Countdown(t) => TimerConfig::Countdown {
            duration_ms: secs(args.duration).unwrap_or(t.initial_ms),
        },
        Timer::Interval(t) => TimerConfig::Interval {
            work_ms: secs(args.work).unwrap_or(t.work_ms),
            rest_ms: secs(args.rest).unwrap_or(t.rest_ms),
            cycles: args.cycles.unwrap_or(t.total_cycles),
        },
        Timer::Pomodoro(_) => TimerConfig::Pomodoro {
            work_ms: secs(args.work).unwrap_or(pomodoro.work_ms),
            short_break_ms: secs(args.short_break).unwrap_or(pomodoro.short_break_ms),
            long_break_ms: secs(args.long_break).unwrap_or(pomodoro.long_break_ms),
            sessions_until_long_break: args
                .sessions_until_long_break
                .unwrap_or(pomodoro.sessions_until_long_break),
            total_sessions: args.sessions.unwrap_or(pomodoro.total_sessions),
        },
        Timer::Egg(t) => match (secs(args.duration), args.preset) {
            (None, None) => TimerConfig::Egg {
                duration_ms: Some(t.initial_ms),
                preset: t.preset,
            },
            (duration_ms, preset) => TimerConfig::Egg {
                duration_ms,
                preset,
            },
        },
        Timer::Bomb(t) => TimerConfig::Bomb {
            duration_ms: match (secs(args.duration), args.difficulty) {
                (None, None) => Some(t.initial_ms),
                (duration_ms, _) => duration_ms,
            },
            difficulty: args.difficulty.unwrap_or(t.difficulty),
        },
        Timer::Meditation(t) => TimerConfig::Meditation {
            breathe_in_secs: args.inhale.unwrap_or(t.breathe_in_secs),
            hold_secs: args.hold.unwrap_or(t.hold_secs),
            breathe_out_secs: args.exhale.unwrap_or(t.breathe_out_secs),
            cycles: args.cycles.unwrap_or(t.total_cycles),
            sound_enabled: (t.sound_enabled || args.unmute) && !args.mute,
        },
        Timer::Basketball(t) => TimerConfig::Basketball {
            period_ms: secs(args.period).or(Some(t.period_ms)),
            periods: args.periods.or(Some(t.total_periods)),
        },
        Timer::Hockey(t) => TimerConfig::Hockey {
            period_ms: secs(args.period).or(Some(t.period_ms)),
            periods: args.periods.or(Some(t.total_periods)),
        },
        Timer::Presentation(t) => TimerConfig::Presentation {
            segments: if args.segments.is_empty() {
                t.segments
                    .iter()
                    .map(|s| SegmentSpec::new(s.title.clone(), s.duration_ms))
                    .collect()
            } else {
                args.segments
            },
        },
    }
}

/// Persist the Pomodoro lengths so the next setup starts from them.
fn remember_pomodoro(
    store: &Store,
    config: &TimerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let TimerConfig::Pomodoro {
        work_ms,
        short_break_ms,
        long_break_ms,
        sessions_until_long_break,
        total_sessions,
    } = *config
    {
        store.set_pomodoro_settings(&PomodoroSettings {
            work_ms,
            short_break_ms,
            long_break_ms,
            sessions_until_long_break,
            total_sessions,
        })?;
    }
    Ok(())
}

/// `timer status` output: the requested state plus whatever restoring the
/// saved timers just reported, as one document.
#[derive(Serialize)]
#[serde(untagged)]
enum Status<'a> {
    One { timer: Timer, events: &'a [Event] },
    All { timers: Vec<&'a Timer>, events: &'a [Event] },
}

fn timer_of(runtime: &Runtime, kind: TimerKind) -> Timer {
    runtime
        .engine()
        .get(kind)
        .cloned()
        .unwrap_or_else(|| Timer::default_for(kind))
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut runtime = Runtime::open(&config)?;
    let mut events: Vec<Event> = runtime.load(Utc::now());

    let command = match action {
        TimerAction::Status { kind } => {
            let status = match kind {
                Some(kind) => Status::One {
                    timer: timer_of(&runtime, kind),
                    events: &events,
                },
                None => Status::All {
                    timers: runtime.engine().timers().collect(),
                    events: &events,
                },
            };
            return print_json(&status);
        }
        TimerAction::Setup(args) => {
            let current = timer_of(&runtime, args.kind);
            let setup = build_config(args, &current, &runtime.store().pomodoro_settings());
            remember_pomodoro(runtime.store(), &setup)?;
            Command::Setup(setup)
        }
        TimerAction::Start { kind } => Command::Start(kind),
        TimerAction::Stop { kind } => Command::Stop(kind),
        TimerAction::Reset { kind } => Command::Reset(kind),
        TimerAction::Lap => Command::AddLap,
        TimerAction::Skip { kind: TimerKind::Pomodoro } => Command::SkipSession,
        TimerAction::Skip { kind } => Command::SkipPhase(kind),
        TimerAction::Defuse => Command::Defuse,
        TimerAction::Next => Command::NextSegment,
        TimerAction::Score { kind, delta, away } => Command::AdjustScore {
            kind,
            side: if away { Side::Away } else { Side::Home },
            delta,
        },
        TimerAction::NextPeriod { kind } => Command::NextPeriod(kind),
    };

    events.extend(runtime.apply(command));
    print_json(&events)?;
    Ok(())
}
