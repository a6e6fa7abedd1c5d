//! Single-shot countdowns: the plain countdown, the egg timer and the bomb.

use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{drain, TimerKind};
use crate::events::Event;

const DEFAULT_COUNTDOWN_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    pub is_running: bool,
    pub is_paused: bool,
    pub initial_ms: u64,
    pub remaining_ms: u64,
    pub is_expired: bool,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_MS)
    }
}

impl Countdown {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            is_running: false,
            is_paused: false,
            initial_ms: duration_ms,
            remaining_ms: duration_ms,
            is_expired: false,
        }
    }

    pub fn start(&mut self) -> bool {
        if self.is_running || self.initial_ms == 0 {
            return false;
        }
        if self.is_expired || self.remaining_ms == 0 {
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
        *self = Self::new(self.initial_ms);
    }

    pub fn tick(&mut self, delta_ms: u64, events: &mut Vec<Event>) {
        if !self.is_running || !drain(&mut self.remaining_ms, delta_ms) {
            return;
        }
        self.is_expired = true;
        self.is_running = false;
        self.is_paused = false;
        let at = Utc::now();
        events.push(Event::TimerCompleted {
            kind: TimerKind::Countdown,
            at,
        });
        events.push(Event::SessionEnded {
            kind: TimerKind::Countdown,
            duration_ms: self.initial_ms,
            completed: true,
            laps: None,
            name: None,
            at,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EggPreset {
    Soft,
    Medium,
    Hard,
}

impl EggPreset {
    pub fn duration_ms(&self) -> u64 {
        match self {
            EggPreset::Soft => 6 * 60 * 1000,
            EggPreset::Medium => 8 * 60 * 1000,
            EggPreset::Hard => 10 * 60 * 1000,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EggPreset::Soft => "Soft boiled",
            EggPreset::Medium => "Medium boiled",
            EggPreset::Hard => "Hard boiled",
        }
    }
}

impl FromStr for EggPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(EggPreset::Soft),
            "medium" => Ok(EggPreset::Medium),
            "hard" => Ok(EggPreset::Hard),
            _ => Err(format!("unknown egg preset: {s} (soft, medium, hard)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EggTimer {
    pub is_running: bool,
    pub is_paused: bool,
    pub initial_ms: u64,
    pub remaining_ms: u64,
    pub is_completed: bool,
    #[serde(default)]
    pub preset: Option<EggPreset>,
}

impl Default for EggTimer {
    fn default() -> Self {
        Self::new(EggPreset::Medium.duration_ms(), Some(EggPreset::Medium))
    }
}

impl EggTimer {
    pub fn new(duration_ms: u64, preset: Option<EggPreset>) -> Self {
        Self {
            is_running: false,
            is_paused: false,
            initial_ms: duration_ms,
            remaining_ms: duration_ms,
            is_completed: false,
            preset,
        }
    }

    pub fn start(&mut self) -> bool {
        if self.is_running || self.initial_ms == 0 {
            return false;
        }
        if self.is_completed || self.remaining_ms == 0 {
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
        *self = Self::new(self.initial_ms, self.preset);
    }

    pub fn tick(&mut self, delta_ms: u64, events: &mut Vec<Event>) {
        if !self.is_running || !drain(&mut self.remaining_ms, delta_ms) {
            return;
        }
        self.is_completed = true;
        self.is_running = false;
        self.is_paused = false;
        let at = Utc::now();
        events.push(Event::TimerCompleted {
            kind: TimerKind::Egg,
            at,
        });
        events.push(Event::SessionEnded {
            kind: TimerKind::Egg,
            duration_ms: self.initial_ms,
            completed: true,
            laps: None,
            name: self.preset.map(|p| p.label().to_string()),
            at,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn default_duration_ms(&self) -> u64 {
        match self {
            Difficulty::Easy => 60_000,
            Difficulty::Medium => 30_000,
            Difficulty::Hard => 15_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("unknown difficulty: {s} (easy, medium, hard)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bomb {
    pub is_running: bool,
    pub is_paused: bool,
    pub initial_ms: u64,
    pub remaining_ms: u64,
    pub is_exploded: bool,
    pub is_defused: bool,
    pub difficulty: Difficulty,
}

impl Default for Bomb {
    fn default() -> Self {
        let difficulty = Difficulty::default();
        Self::new(difficulty.default_duration_ms(), difficulty)
    }
}

impl Bomb {
    pub fn new(duration_ms: u64, difficulty: Difficulty) -> Self {
        Self {
            is_running: false,
            is_paused: false,
            initial_ms: duration_ms,
            remaining_ms: duration_ms,
            is_exploded: false,
            is_defused: false,
            difficulty,
        }
    }

    pub fn start(&mut self) -> bool {
        if self.is_running || self.initial_ms == 0 {
            return false;
        }
        if self.is_exploded || self.is_defused || self.remaining_ms == 0 {
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
        *self = Self::new(self.initial_ms, self.difficulty);
    }

    /// Defuse an armed bomb. Only valid between start and detonation.
    pub fn defuse(&mut self, events: &mut Vec<Event>) -> bool {
        let armed = self.is_running || self.is_paused;
        if !armed || self.is_exploded || self.is_defused || self.remaining_ms == 0 {
            return false;
        }
        self.is_defused = true;
        self.is_running = false;
        self.is_paused = false;
        let at = Utc::now();
        events.push(Event::BombDefused {
            remaining_ms: self.remaining_ms,
            at,
        });
        events.push(Event::SessionEnded {
            kind: TimerKind::Bomb,
            duration_ms: self.initial_ms - self.remaining_ms,
            completed: false,
            laps: None,
            name: Some("defused".into()),
            at,
        });
        true
    }

    pub fn tick(&mut self, delta_ms: u64, events: &mut Vec<Event>) {
        if !self.is_running || !drain(&mut self.remaining_ms, delta_ms) {
            return;
        }
        self.is_exploded = true;
        self.is_running = false;
        self.is_paused = false;
        let at = Utc::now();
        events.push(Event::BombExploded { at });
        events.push(Event::TimerCompleted {
            kind: TimerKind::Bomb,
            at,
        });
        events.push(Event::SessionEnded {
            kind: TimerKind::Bomb,
            duration_ms: self.initial_ms,
            completed: true,
            laps: None,
            name: Some("exploded".into()),
            at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_expires_once() {
        let mut cd = Countdown::new(5000);
        let mut events = Vec::new();
        assert!(cd.start());
        cd.tick(5000, &mut events);
        assert!(cd.is_expired);
        assert!(!cd.is_running);
        assert_eq!(cd.remaining_ms, 0);
        assert_eq!(events.len(), 2);

        cd.tick(5000, &mut events);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn presets_and_difficulty_parse() {
        assert_eq!("Soft".parse::<EggPreset>().unwrap(), EggPreset::Soft);
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("runny".parse::<EggPreset>().is_err());
    }

    #[test]
    fn zero_duration_does_not_start() {
        let mut cd = Countdown::new(0);
        assert!(!cd.start());
        assert!(!cd.is_running);
    }

    #[test]
    fn start_after_expiry_rearms() {
        let mut cd = Countdown::new(1000);
        let mut events = Vec::new();
        cd.start();
        cd.tick(2000, &mut events);
        assert!(cd.start());
        assert_eq!(cd.remaining_ms, 1000);
        assert!(!cd.is_expired);
    }

    #[test]
    fn egg_session_carries_preset_name() {
        let mut egg = EggTimer::new(EggPreset::Soft.duration_ms(), Some(EggPreset::Soft));
        let mut events = Vec::new();
        egg.start();
        egg.tick(EggPreset::Soft.duration_ms(), &mut events);
        assert!(egg.is_completed);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::SessionEnded { name: Some(n), .. } if n == "Soft boiled"
        )));
    }

    #[test]
    fn bomb_explodes_without_defuse() {
        let mut bomb = Bomb::new(15_000, Difficulty::Hard);
        let mut events = Vec::new();
        bomb.start();
        bomb.tick(15_000, &mut events);
        assert!(bomb.is_exploded);
        assert!(!bomb.is_defused);
        assert!(!bomb.defuse(&mut events), "cannot defuse after detonation");
    }

    #[test]
    fn defused_bomb_never_explodes() {
        let mut bomb = Bomb::new(15_000, Difficulty::Hard);
        let mut events = Vec::new();
        assert!(!bomb.defuse(&mut events), "unarmed bomb cannot be defused");
        bomb.start();
        bomb.tick(5_000, &mut events);
        assert!(bomb.defuse(&mut events));
        bomb.tick(20_000, &mut events);
        assert!(bomb.is_defused);
        assert!(!bomb.is_exploded);
        assert_eq!(bomb.remaining_ms, 10_000);
    }
}
