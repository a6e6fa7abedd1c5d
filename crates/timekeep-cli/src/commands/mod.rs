pub mod alarm;
pub mod clock;
pub mod config;
pub mod data;
pub mod history;
pub mod prefs;
pub mod serve;
pub mod show;
pub mod stats;
pub mod timer;
pub mod watch;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
