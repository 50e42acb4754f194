use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("streak-{nanos}-{file_name}"))
}

fn run(store_path: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_streak"))
        .args(args)
        .env("STREAK_STORE_PATH", store_path)
        .env("STREAK_CONFIG_PATH", temp_path("missing-config.json"))
        .env("STREAK_TODAY", "2025-07-11")
        .output()
        .expect("failed to run streak")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn toggled_days_build_a_streak_and_a_gap_breaks_it() {
    let store_path = temp_path("cli-streak.json");

    stdout(&run(&store_path, &["add", "Meditate"]));
    stdout(&run(&store_path, &["toggle", "Meditate", "--date", "2025-07-09"]));
    stdout(&run(&store_path, &["toggle", "Meditate", "--date", "2025-07-10"]));
    let today = stdout(&run(&store_path, &["toggle", "Meditate"]));
    assert!(today.contains("Marked done on 2025-07-11: Meditate"));

    assert!(stdout(&run(&store_path, &["streak", "Meditate"])).contains("Meditate: 3"));

    let undone = stdout(&run(&store_path, &["toggle", "Meditate", "--date", "2025-07-10"]));
    assert!(undone.contains("Marked not done on 2025-07-10"));

    let streak = stdout(&run(&store_path, &["streak", "Meditate", "--json"]));
    std::fs::remove_file(&store_path).ok();

    let value: serde_json::Value = serde_json::from_str(&streak).unwrap();
    assert_eq!(value["streak"], 1);
}

#[test]
fn streak_is_zero_when_today_is_missing() {
    let store_path = temp_path("cli-streak-yesterday.json");

    stdout(&run(&store_path, &["add", "Run"]));
    stdout(&run(&store_path, &["toggle", "Run", "--date", "2025-07-10"]));
    let output = stdout(&run(&store_path, &["streak", "Run"]));
    std::fs::remove_file(&store_path).ok();

    assert!(output.contains("Run: 0"));
}

#[test]
fn any_streak_counts_days_with_any_task() {
    let store_path = temp_path("cli-streak-any.json");

    stdout(&run(&store_path, &["add", "Run"]));
    stdout(&run(&store_path, &["add", "Read"]));
    stdout(&run(&store_path, &["toggle", "Run", "--date", "2025-07-10"]));
    stdout(&run(&store_path, &["done", "Read"]));

    let any = stdout(&run(&store_path, &["streak", "--any", "--json"]));
    std::fs::remove_file(&store_path).ok();

    let value: serde_json::Value = serde_json::from_str(&any).unwrap();
    assert_eq!(value["streakCount"], 2);
}

#[test]
fn toggle_all_fills_then_clears_a_day() {
    let store_path = temp_path("cli-toggle-all.json");

    stdout(&run(&store_path, &["add", "Run"]));
    stdout(&run(&store_path, &["add", "Read"]));

    let filled = stdout(&run(&store_path, &["toggle-all", "--date", "2025-07-04"]));
    assert!(filled.contains("Completed 2 task(s) on 2025-07-04"));

    let cleared = stdout(&run(&store_path, &["toggle-all", "--date", "2025-07-04"]));
    assert!(cleared.contains("Cleared 2025-07-04"));

    let content = std::fs::read_to_string(&store_path).unwrap();
    std::fs::remove_file(&store_path).ok();
    let stored: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert!(stored["taskCompletions"].get("2025-07-04").is_none());
}

#[test]
fn status_badge_follows_streak_mode() {
    let store_path = temp_path("cli-status.json");

    stdout(&run(&store_path, &["add", "Run"]));
    stdout(&run(&store_path, &["add", "Read"]));
    stdout(&run(&store_path, &["toggle", "Run", "--date", "2025-07-10"]));
    stdout(&run(&store_path, &["done", "Run"]));

    let per_task = stdout(&run(&store_path, &["status"]));
    assert!(per_task.contains("🔥 1"));

    let any = stdout(&run(
        &store_path,
        &["status", "--config-override", "mode=any", "--json"],
    ));
    std::fs::remove_file(&store_path).ok();

    let value: serde_json::Value = serde_json::from_str(&any).unwrap();
    assert_eq!(value["mode"], "any");
    assert_eq!(value["badge"], 2);
    assert_eq!(value["event"]["streakCount"], 2);
}

#[test]
fn calendar_marks_completed_days() {
    let store_path = temp_path("cli-calendar.json");

    stdout(&run(&store_path, &["add", "Run"]));
    stdout(&run(&store_path, &["toggle", "Run", "--date", "2025-07-03"]));

    let grid = stdout(&run(&store_path, &["calendar"]));
    assert!(grid.contains("July 2025"));
    assert!(grid.contains("Su Mo Tu We Th Fr Sa"));
    assert!(grid.contains(" 3*"));

    let previous = stdout(&run(&store_path, &["calendar", "--offset", "-1", "--json"]));
    std::fs::remove_file(&store_path).ok();

    let value: serde_json::Value = serde_json::from_str(&previous).unwrap();
    assert_eq!(value["title"], "June 2025");
    assert_eq!(value["days"].as_array().unwrap().len(), 30);
}

#[test]
fn malformed_date_is_rejected() {
    let store_path = temp_path("cli-bad-date.json");

    stdout(&run(&store_path, &["add", "Run"]));
    let output = run(&store_path, &["toggle", "Run", "--date", "2025-13-01"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("ERROR:"));
}
