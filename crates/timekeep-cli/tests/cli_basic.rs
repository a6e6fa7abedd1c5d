//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

const QUIET_CONFIG: &str = r#"
log_level = "warn"

[audio]
device = false
terminal_bell = false

[notifications]
backend = "none"
"#;

struct Home(tempfile::TempDir);

impl Home {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), QUIET_CONFIG).unwrap();
        Self(dir)
    }

    fn path(&self) -> &Path {
        self.0.path()
    }

    /// Run a CLI command and return (stdout, stderr, exit code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_timekeep"))
            .args(args)
            .env("TIMEKEEP_HOME", self.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    fn ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "{args:?} failed: {stderr}");
        stdout
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let stdout = self.ok(args);
        serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?}: {e}\n{stdout}"))
    }
}

#[test]
fn test_help_and_version() {
    let home = Home::new();
    assert!(home.ok(&["--help"]).contains("timer"));
    assert!(home.ok(&["--version"]).contains("timekeep"));
}

#[test]
fn test_timer_setup_and_status() {
    let home = Home::new();
    home.ok(&["timer", "setup", "countdown", "--duration", "90"]);
    let status = home.json(&["timer", "status", "countdown"]);
    assert_eq!(status["timer"]["kind"], "countdown");
    assert_eq!(status["timer"]["initial_ms"], 90_000);
    assert_eq!(status["timer"]["is_running"], false);
    assert_eq!(status["events"].as_array().unwrap().len(), 0);

    let all = home.json(&["timer", "status"]);
    assert!(all["timers"].as_array().unwrap().iter().any(|t| t["kind"] == "countdown"));
}

#[test]
fn test_starting_one_timer_pauses_another() {
    let home = Home::new();
    home.ok(&["timer", "start", "stopwatch"]);
    let events = home.json(&["timer", "start", "interval"]);
    assert!(events.as_array().is_some());

    let stopwatch = home.json(&["timer", "status", "stopwatch"]);
    assert_eq!(stopwatch["timer"]["is_running"], false);
    let interval = home.json(&["timer", "status", "interval"]);
    assert_eq!(interval["timer"]["is_running"], true);
}

#[test]
fn test_bomb_explodes_between_invocations() {
    let home = Home::new();
    home.ok(&["timer", "setup", "bomb", "--duration", "1"]);
    home.ok(&["timer", "start", "bomb"]);
    std::thread::sleep(std::time::Duration::from_millis(1500));

    // Restoring the expired bomb reports its events in the same document.
    let bomb = home.json(&["timer", "status", "bomb"]);
    assert_eq!(bomb["timer"]["is_exploded"], true);
    let events = bomb["events"].as_array().unwrap();
    assert!(events.iter().any(|e| e["type"] == "BombExploded"), "{events:?}");

    let history = home.json(&["history", "recent"]);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["timer_type"], "bomb");
    assert_eq!(history[0]["name"], "exploded");

    let stats = home.json(&["stats"]);
    assert_eq!(stats["total_sessions"], 1);
}

#[test]
fn test_prefs_set_get_and_reject() {
    let home = Home::new();
    home.ok(&["prefs", "set", "volume", "40"]);
    assert_eq!(home.ok(&["prefs", "get", "volume"]).trim(), "40");

    let (_, stderr, code) = home.run(&["prefs", "set", "volume", "loud"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_get() {
    let home = Home::new();
    assert_eq!(home.ok(&["config", "get", "server.port"]).trim(), "3001");
    assert_eq!(home.ok(&["config", "get", "notifications.backend"]).trim(), "none");
}

#[test]
fn test_alarm_add_and_list() {
    let home = Home::new();
    let alarm = home.json(&["alarm", "add", "07:30", "--label", "run"]);
    assert_eq!(alarm["hour"], 7);
    let alarms = home.json(&["alarm", "list"]);
    assert_eq!(alarms.as_array().unwrap().len(), 1);

    let (_, _, code) = home.run(&["alarm", "add", "25:00"]);
    assert_eq!(code, 1);
}

#[test]
fn test_data_export_and_guarded_clear() {
    let home = Home::new();
    let export = home.json(&["data", "export"]);
    assert_eq!(export["version"], 1);

    let (_, stderr, code) = home.run(&["data", "clear"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("--yes"));
    home.ok(&["data", "clear", "--yes"]);
}

#[test]
fn test_show_unknown_page_renders_home() {
    let home = Home::new();
    let page = home.ok(&["show", "/nowhere"]);
    assert!(page.starts_with("Timers\n"));
    assert!(page.contains("/pomodoro"));
}
