//! Plain-text rendering of each page.

use std::fmt::Write;

use crate::routes::Route;
use crate::storage::{Achievement, HistoryEntry, Preferences, UserStats};
use crate::timer::{Timer, TimerEngine, TimerKind};

/// `HH:MM:SS`.
pub fn format_hms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// `MM:SS.cc`, with an `H:` prefix past the hour.
pub fn format_precise(ms: u64) -> String {
    let centis = (ms / 10) % 100;
    let secs = ms / 1000;
    let hours = secs / 3600;
    if hours > 0 {
        format!("{hours}:{:02}:{:02}.{centis:02}", (secs / 60) % 60, secs % 60)
    } else {
        format!("{:02}:{:02}.{centis:02}", secs / 60, secs % 60)
    }
}

/// Coarse human form for totals, e.g. `2h 05m` or `45s`.
pub fn format_total(ms: u64) -> String {
    let secs = ms / 1000;
    match (secs / 3600, (secs / 60) % 60, secs % 60) {
        (0, 0, s) => format!("{s}s"),
        (0, m, s) => format!("{m}m {s:02}s"),
        (h, m, _) => format!("{h}h {m:02}m"),
    }
}

/// Share of the current phase already used, 0-100.
pub fn progress_percent(timer: &Timer) -> u8 {
    let Some(total) = timer.phase_total_ms().filter(|t| *t > 0) else {
        return 0;
    };
    let used = total.saturating_sub(timer.display_ms());
    ((used * 100) / total).min(100) as u8
}

fn status(timer: &Timer) -> &'static str {
    if timer.is_finished() {
        "finished"
    } else if timer.is_running() {
        "running"
    } else if timer.is_paused() {
        "paused"
    } else {
        "ready"
    }
}

/// Detail lines for one timer, below the clock face.
pub fn render_timer(timer: &Timer) -> String {
    let mut out = String::new();
    let clock = match timer {
        Timer::Stopwatch(_) => format_precise(timer.display_ms()),
        _ => format_hms(timer.display_ms()),
    };
    let _ = writeln!(out, "{}  [{}]", clock, status(timer));

    match timer {
        Timer::Stopwatch(sw) => {
            for (i, (split, lap)) in sw.laps.iter().zip(sw.lap_durations()).enumerate() {
                let _ = writeln!(
                    out,
                    "  lap {:>2}  {}  (+{})",
                    i + 1,
                    format_precise(*split),
                    format_precise(lap)
                );
            }
        }
        Timer::Countdown(_) => {
            let _ = writeln!(out, "  {}% elapsed", progress_percent(timer));
        }
        Timer::Interval(t) => {
            let phase = if t.is_work_phase { "Work" } else { "Rest" };
            let _ = writeln!(
                out,
                "  {phase}  cycle {}/{}",
                t.current_cycle, t.total_cycles
            );
        }
        Timer::Pomodoro(p) => {
            let _ = writeln!(
                out,
                "  {}  session {}/{}",
                p.session_type.phase().label(),
                p.current_session,
                p.total_sessions
            );
            let _ = writeln!(
                out,
                "  focused {}  rested {}",
                format_total(p.total_work_ms),
                format_total(p.total_break_ms)
            );
        }
        Timer::Egg(e) => {
            if let Some(preset) = e.preset {
                let _ = writeln!(out, "  {}", preset.label());
            }
        }
        Timer::Bomb(b) => {
            let state = if b.is_exploded {
                "BOOM"
            } else if b.is_defused {
                "defused"
            } else {
                "armed"
            };
            let _ = writeln!(out, "  {state}  ({})", b.difficulty.as_str());
        }
        Timer::Meditation(m) => {
            let _ = writeln!(
                out,
                "  {}  cycle {}/{}",
                m.phase.phase().label(),
                m.current_cycle,
                m.total_cycles
            );
        }
        Timer::Basketball(s) | Timer::Hockey(s) => {
            let _ = writeln!(
                out,
                "  period {}/{}  home {} - away {} ({})",
                s.current_period,
                s.total_periods,
                s.home,
                s.away,
                s.league.tally_label()
            );
            if s.is_game_over {
                let _ = writeln!(out, "  game over");
            } else if s.period_ended {
                let _ = writeln!(out, "  end of period");
            }
        }
        Timer::Presentation(p) => {
            for (i, segment) in p.segments.iter().enumerate() {
                let marker = if segment.completed {
                    "x"
                } else if i == p.current_segment && !p.is_complete {
                    ">"
                } else {
                    " "
                };
                let _ = writeln!(
                    out,
                    "  [{marker}] {}  {}",
                    segment.title,
                    format_hms(segment.duration_ms)
                );
            }
        }
    }
    out
}

/// Everything a page may draw from.
pub struct ViewContext<'a> {
    pub engine: &'a TimerEngine,
    pub preferences: &'a Preferences,
    pub stats: &'a UserStats,
    pub history: &'a [HistoryEntry],
}

pub fn render(route: Route, ctx: &ViewContext<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", route.title());
    let _ = writeln!(out, "{}", "=".repeat(route.title().len()));

    match route {
        Route::Home => {
            for kind in TimerKind::ALL {
                let state = ctx.engine.get(kind).map(status).unwrap_or("ready");
                let _ = writeln!(
                    out,
                    "{:<16} {:<14} {}",
                    kind.label(),
                    Route::Timer(kind).path(),
                    state
                );
            }
        }
        Route::Timer(kind) => {
            let timer = ctx
                .engine
                .get(kind)
                .cloned()
                .unwrap_or_else(|| Timer::default_for(kind));
            out.push_str(&render_timer(&timer));
        }
        Route::Settings => {
            let p = ctx.preferences;
            let _ = writeln!(out, "theme          {:?}", p.theme);
            let _ = writeln!(out, "audio          {}", on_off(p.audio_enabled));
            let _ = writeln!(out, "volume         {}%", p.volume);
            let _ = writeln!(out, "notifications  {}", on_off(p.notifications_enabled));
            let _ = writeln!(out, "confirm reset  {}", on_off(p.confirm_reset));
            let presets: Vec<String> = p
                .favorite_presets_ms
                .iter()
                .map(|ms| format_total(*ms))
                .collect();
            let _ = writeln!(out, "presets        {}", presets.join(", "));
        }
        Route::Stats => {
            let s = ctx.stats;
            let _ = writeln!(out, "sessions       {}", s.total_sessions);
            let _ = writeln!(out, "total time     {}", format_total(s.total_time_ms));
            let _ = writeln!(out, "average        {}", format_total(s.average_session_ms));
            let favorite = s.favorite_timer_type.map(|k| k.label()).unwrap_or("-");
            let _ = writeln!(out, "favorite       {favorite}");
            let _ = writeln!(out, "streak         {} day(s)", s.streak_days);
            if !ctx.history.is_empty() {
                let _ = writeln!(out, "\nrecent");
                for entry in ctx.history.iter().take(10) {
                    let _ = writeln!(
                        out,
                        "  {}  {:<14} {:>9}  {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.timer_type.label(),
                        format_total(entry.duration_ms),
                        if entry.completed { "done" } else { "stopped" }
                    );
                }
            }
        }
        Route::Achievements => {
            for achievement in Achievement::ALL {
                let mark = if achievement.is_unlocked(ctx.stats) { "x" } else { " " };
                let _ = writeln!(out, "[{mark}] {}", achievement.title());
            }
        }
        Route::About => {
            let _ = writeln!(
                out,
                "timekeep {}: ten timers that keep counting while you are away.",
                env!("CARGO_PKG_VERSION")
            );
        }
    }
    out
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
