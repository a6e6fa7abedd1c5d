use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the ten supported timer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Stopwatch,
    Countdown,
    Interval,
    Pomodoro,
    Egg,
    Bomb,
    Meditation,
    Basketball,
    Hockey,
    Presentation,
}

impl TimerKind {
    pub const ALL: [TimerKind; 10] = [
        TimerKind::Stopwatch,
        TimerKind::Countdown,
        TimerKind::Interval,
        TimerKind::Pomodoro,
        TimerKind::Egg,
        TimerKind::Bomb,
        TimerKind::Meditation,
        TimerKind::Basketball,
        TimerKind::Hockey,
        TimerKind::Presentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::Stopwatch => "stopwatch",
            TimerKind::Countdown => "countdown",
            TimerKind::Interval => "interval",
            TimerKind::Pomodoro => "pomodoro",
            TimerKind::Egg => "egg",
            TimerKind::Bomb => "bomb",
            TimerKind::Meditation => "meditation",
            TimerKind::Basketball => "basketball",
            TimerKind::Hockey => "hockey",
            TimerKind::Presentation => "presentation",
        }
    }

    /// Human-readable name used in notifications and views.
    pub fn label(&self) -> &'static str {
        match self {
            TimerKind::Stopwatch => "Stopwatch",
            TimerKind::Countdown => "Countdown",
            TimerKind::Interval => "Interval Timer",
            TimerKind::Pomodoro => "Pomodoro",
            TimerKind::Egg => "Egg Timer",
            TimerKind::Bomb => "Bomb Timer",
            TimerKind::Meditation => "Meditation",
            TimerKind::Basketball => "Basketball",
            TimerKind::Hockey => "Hockey",
            TimerKind::Presentation => "Presentation",
        }
    }
}

/// Named phase a multi-phase timer can move into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    Rest,
    ShortBreak,
    LongBreak,
    BreatheIn,
    Hold,
    BreatheOut,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Rest => "Rest",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
            Phase::BreatheIn => "Breathe In",
            Phase::Hold => "Hold",
            Phase::BreatheOut => "Breathe Out",
        }
    }
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "egg_timer" => return Ok(TimerKind::Egg),
            "bomb_timer" => return Ok(TimerKind::Bomb),
            _ => {}
        }
        TimerKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| format!("unknown timer kind: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("egg-timer".parse::<TimerKind>().unwrap(), TimerKind::Egg);
        assert_eq!("Bomb".parse::<TimerKind>().unwrap(), TimerKind::Bomb);
        assert!("lap".parse::<TimerKind>().is_err());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&TimerKind::Presentation).unwrap();
        assert_eq!(json, "\"presentation\"");
    }
}
