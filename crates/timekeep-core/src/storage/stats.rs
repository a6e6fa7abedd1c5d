//! Aggregate usage statistics derived from the history log.
//!
//! `UserStats` is a materialized view: it is recomputed from history on
//! every append and can be rebuilt at any time.

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::store::HistoryEntry;
use crate::timer::TimerKind;

/// Upper bound on the backward walk when counting the streak.
const STREAK_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_sessions: u64,
    pub total_time_ms: u64,
    pub average_session_ms: u64,
    pub favorite_timer_type: Option<TimerKind>,
    pub streak_days: u32,
    pub last_used: Option<DateTime<Utc>>,
}

impl UserStats {
    /// Compute stats from history (newest first), with `today` as the
    /// starting day of the streak walk.
    pub fn from_history(history: &[HistoryEntry], today: NaiveDate) -> Self {
        let total_sessions = history.len() as u64;
        let total_time_ms: u64 = history.iter().map(|e| e.duration_ms).sum();
        let average_session_ms = if total_sessions == 0 {
            0
        } else {
            total_time_ms / total_sessions
        };

        Self {
            total_sessions,
            total_time_ms,
            average_session_ms,
            favorite_timer_type: favorite_kind(history),
            streak_days: streak_days(
                history
                    .iter()
                    .map(|e| e.timestamp.with_timezone(&Local).date_naive()),
                today,
            ),
            last_used: history.iter().map(|e| e.timestamp).max(),
        }
    }
}

/// Most frequent timer kind. Ties go to the kind seen first.
pub fn favorite_kind(history: &[HistoryEntry]) -> Option<TimerKind> {
    let mut counts: Vec<(TimerKind, usize)> = Vec::new();
    for entry in history {
        match counts.iter_mut().find(|(k, _)| *k == entry.timer_type) {
            Some((_, n)) => *n += 1,
            None => counts.push((entry.timer_type, 1)),
        }
    }

    let mut best: Option<(TimerKind, usize)> = None;
    for (kind, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((kind, count));
        }
    }
    best.map(|(k, _)| k)
}

/// Consecutive calendar days with activity, walking back from `today`.
/// Stops at the first day without an entry.
pub fn streak_days(days: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
    let active: HashSet<NaiveDate> = days.into_iter().collect();
    let mut streak = 0;
    let mut day = today;
    for _ in 0..STREAK_WINDOW_DAYS {
        if !active.contains(&day) {
            break;
        }
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Milestones shown on the achievements page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstSession,
    TenSessions,
    HundredSessions,
    ThreeDayStreak,
    WeekStreak,
    TenHours,
}

impl Achievement {
    pub const ALL: [Achievement; 6] = [
        Achievement::FirstSession,
        Achievement::TenSessions,
        Achievement::HundredSessions,
        Achievement::ThreeDayStreak,
        Achievement::WeekStreak,
        Achievement::TenHours,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::FirstSession => "First timer finished",
            Achievement::TenSessions => "10 sessions",
            Achievement::HundredSessions => "100 sessions",
            Achievement::ThreeDayStreak => "3-day streak",
            Achievement::WeekStreak => "7-day streak",
            Achievement::TenHours => "10 hours timed",
        }
    }

    pub fn is_unlocked(&self, stats: &UserStats) -> bool {
        match self {
            Achievement::FirstSession => stats.total_sessions >= 1,
            Achievement::TenSessions => stats.total_sessions >= 10,
            Achievement::HundredSessions => stats.total_sessions >= 100,
            Achievement::ThreeDayStreak => stats.streak_days >= 3,
            Achievement::WeekStreak => stats.streak_days >= 7,
            Achievement::TenHours => stats.total_time_ms >= 10 * 60 * 60 * 1000,
        }
    }

    pub fn unlocked(stats: &UserStats) -> Vec<Achievement> {
        Self::ALL
            .iter()
            .copied()
            .filter(|a| a.is_unlocked(stats))
            .collect()
    }
}
