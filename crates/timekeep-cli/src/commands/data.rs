use std::path::PathBuf;

use clap::Subcommand;
use timekeep_core::Store;

#[derive(Subcommand)]
pub enum DataAction {
    /// Write preferences, history, stats and settings as JSON
    Export {
        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace stored data with a previous export
    Import { file: PathBuf },
    /// Delete everything, including saved timers
    Clear {
        /// Required to actually clear
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: DataAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    match action {
        DataAction::Export { output } => {
            let json = store.export_data()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    eprintln!("exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        DataAction::Import { file } => {
            let json = std::fs::read_to_string(&file)?;
            let data = store.import_data(&json)?;
            println!("imported {} history entries", data.history.len());
        }
        DataAction::Clear { yes } => {
            if !yes {
                return Err("refusing to clear without --yes".into());
            }
            store.clear_all_data()?;
            println!("all data cleared");
        }
    }
    Ok(())
}
