use clap::Subcommand;
use timekeep_core::{Preferences, Store};

use super::print_json;

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Get a preference (e.g. "theme", "volume")
    Get { key: String },
    /// Set a preference
    Set { key: String, value: String },
    /// List all preferences
    List,
    /// Restore default preferences
    Reset,
}

pub fn run(action: PrefsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    match action {
        PrefsAction::Get { key } => match store.preference(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown preference: {key}").into()),
        },
        PrefsAction::Set { key, value } => {
            store.set_preference(&key, &value)?;
            println!("ok");
        }
        PrefsAction::List => print_json(&store.preferences())?,
        PrefsAction::Reset => {
            store.set_preferences(&Preferences::default())?;
            println!("preferences reset to defaults");
        }
    }
    Ok(())
}
