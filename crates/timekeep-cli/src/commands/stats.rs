use serde::Serialize;
use timekeep_core::storage::Achievement;
use timekeep_core::{Store, UserStats};

use super::print_json;

#[derive(Serialize)]
struct StatsReport {
    #[serde(flatten)]
    stats: UserStats,
    achievements: Vec<Achievement>,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let stats = store.stats();
    let achievements = Achievement::unlocked(&stats);
    print_json(&StatsReport {
        stats,
        achievements,
    })
}
