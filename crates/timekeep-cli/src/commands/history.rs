use clap::Subcommand;
use timekeep_core::timer::TimerKind;
use timekeep_core::Store;

use super::print_json;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Most recent sessions, newest first
    Recent {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Sessions of one timer kind
    ByType { kind: TimerKind },
    /// Forget all sessions
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    match action {
        HistoryAction::Recent { limit } => print_json(&store.recent_history(limit))?,
        HistoryAction::ByType { kind } => print_json(&store.history_by_type(kind))?,
        HistoryAction::Clear => {
            store.clear_history()?;
            println!("history cleared");
        }
    }
    Ok(())
}
