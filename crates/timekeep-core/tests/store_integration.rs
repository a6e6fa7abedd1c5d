//! Integration tests for the preference/history store.

use chrono::{Duration, Local, TimeZone, Utc};
use timekeep_core::storage::{
    Achievement, Alarm, ExportData, HistoryEntry, PomodoroSettings, Store, Theme, HISTORY_LIMIT,
};
use timekeep_core::timer::TimerKind;

#[test]
fn history_is_capped() {
    let store = Store::open_memory().unwrap();
    for i in 0..=HISTORY_LIMIT as u64 {
        store
            .add_history_entry(HistoryEntry::new(TimerKind::Stopwatch, i, true))
            .unwrap();
    }
    let history = store.history();
    assert_eq!(history.len(), HISTORY_LIMIT);
    // Newest first; the very first entry (duration 0) fell off.
    assert_eq!(history[0].duration_ms, HISTORY_LIMIT as u64);
    assert_eq!(history.last().unwrap().duration_ms, 1);
}

#[test]
fn streak_of_three_with_gap_on_day_four() {
    let store = Store::open_memory().unwrap();
    let noon_today = Local::now()
        .date_naive()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let noon_today = Local
        .from_local_datetime(&noon_today)
        .earliest()
        .unwrap()
        .with_timezone(&Utc);

    for days_ago in [4, 2, 1, 0] {
        let entry = HistoryEntry::new(TimerKind::Countdown, 60_000, true)
            .at(noon_today - Duration::days(days_ago));
        store.add_history_entry(entry).unwrap();
    }
    let stats = store.stats();
    assert_eq!(stats.streak_days, 3);
    assert!(Achievement::unlocked(&stats).contains(&Achievement::ThreeDayStreak));
}

#[test]
fn export_import_round_trip() {
    let source = Store::open_memory().unwrap();
    source.set_preference("theme", "light").unwrap();
    source
        .add_history_entry(
            HistoryEntry::new(TimerKind::Stopwatch, 4_200, true).with_laps(vec![1_000, 4_200]),
        )
        .unwrap();
    source
        .add_history_entry(HistoryEntry::new(TimerKind::Bomb, 900, false).with_name("defused"))
        .unwrap();
    source
        .set_alarms(&[Alarm::new(6, 45, "run").unwrap()])
        .unwrap();
    source
        .set_pomodoro_settings(&PomodoroSettings {
            work_ms: 50 * 60_000,
            ..PomodoroSettings::default()
        })
        .unwrap();

    let json = source.export_data().unwrap();
    let exported: ExportData = serde_json::from_str(&json).unwrap();
    assert_eq!(exported.history, source.history());

    let target = Store::open_memory().unwrap();
    let imported = target.import_data(&json).unwrap();
    assert_eq!(imported.history, source.history());
    assert_eq!(target.history(), source.history());
    assert_eq!(target.preferences().theme, Theme::Light);
    assert_eq!(target.alarms().len(), 1);
    assert_eq!(target.pomodoro_settings().work_ms, 50 * 60_000);
    assert_eq!(target.stats().total_sessions, 2);
    assert_eq!(
        target.history()[1].laps.as_deref(),
        Some(&[1_000, 4_200][..])
    );
}

#[test]
fn clear_removes_everything() {
    let store = Store::open_memory().unwrap();
    store
        .add_history_entry(HistoryEntry::new(TimerKind::Egg, 1, true))
        .unwrap();
    store.clear_all_data().unwrap();
    assert!(store.history().is_empty());
    assert!(store.db().kv_keys().unwrap().is_empty());
    assert_eq!(store.stats().total_sessions, 0);
}
