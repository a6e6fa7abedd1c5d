use clap::Subcommand;
use timekeep_core::storage::Alarm;
use timekeep_core::Store;

use super::print_json;

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Add an alarm at HH:MM
    Add {
        time: String,
        #[arg(long, default_value = "Alarm")]
        label: String,
    },
    /// List alarms
    List,
    /// Remove an alarm by id
    Remove { id: String },
    /// Enable or disable an alarm by id
    Toggle { id: String },
}

fn parse_time(raw: &str) -> Result<(u8, u8), String> {
    let (hour, minute) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM, got {raw:?}"))?;
    let hour = hour.parse().map_err(|_| format!("invalid hour in {raw:?}"))?;
    let minute = minute
        .parse()
        .map_err(|_| format!("invalid minute in {raw:?}"))?;
    Ok((hour, minute))
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let mut alarms = store.alarms();
    match action {
        AlarmAction::Add { time, label } => {
            let (hour, minute) = parse_time(&time)?;
            let alarm = Alarm::new(hour, minute, label)?;
            print_json(&alarm)?;
            alarms.push(alarm);
        }
        AlarmAction::List => return print_json(&alarms),
        AlarmAction::Remove { id } => {
            let before = alarms.len();
            alarms.retain(|a| a.id != id);
            if alarms.len() == before {
                return Err(format!("no alarm with id {id}").into());
            }
            println!("removed {id}");
        }
        AlarmAction::Toggle { id } => {
            let alarm = alarms
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| format!("no alarm with id {id}"))?;
            alarm.enabled = !alarm.enabled;
            println!("{id} {}", if alarm.enabled { "enabled" } else { "disabled" });
        }
    }
    store.set_alarms(&alarms)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn times_parse() {
        assert_eq!(parse_time("07:30"), Ok((7, 30)));
        assert!(parse_time("0730").is_err());
        assert!(parse_time("7:xx").is_err());
    }
}
