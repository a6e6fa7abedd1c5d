use chrono::Utc;
use timekeep_core::storage::due_alarms;
use timekeep_core::Store;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let settings = store.clock_settings();
    let now = Utc::now();

    println!("{}", settings.format_clock(now));
    println!("{}", settings.format_date(now));

    let alarms = store.alarms();
    for alarm in due_alarms(&alarms, settings.time_of_day(now)) {
        println!("alarm: {}", alarm.label);
    }
    Ok(())
}
