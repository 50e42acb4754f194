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

#[test]
fn add_then_list_shows_task() {
    let store_path = temp_path("cli-add-list.json");

    let added = run(&store_path, &["add", "Meditate", "--priority", "high"]);
    assert!(added.status.success());
    assert!(String::from_utf8_lossy(&added.stdout).contains("Added task: Meditate"));

    let listed = run(&store_path, &["list"]);
    std::fs::remove_file(&store_path).ok();

    assert!(listed.status.success());
    let stdout = String::from_utf8_lossy(&listed.stdout);
    assert!(stdout.contains("Meditate"));
    assert!(stdout.contains("High"));
}

#[test]
fn add_json_and_list_json() {
    let store_path = temp_path("cli-add-json.json");

    let added = run(&store_path, &["add", "Read", "--color", "green", "--json"]);
    assert!(added.status.success());
    let task: serde_json::Value = serde_json::from_slice(&added.stdout).unwrap();
    assert_eq!(task["name"], "Read");
    assert_eq!(task["color"], "Green");
    assert_eq!(task["priority"], "Medium");

    let listed = run(&store_path, &["list", "--json"]);
    std::fs::remove_file(&store_path).ok();

    let tasks: serde_json::Value = serde_json::from_slice(&listed.stdout).unwrap();
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], task["id"]);
    assert_eq!(tasks[0]["streak"], 0);
    assert_eq!(tasks[0]["done_today"], false);
}

#[test]
fn list_without_tasks_prints_placeholder() {
    let store_path = temp_path("cli-list-empty.json");
    let output = run(&store_path, &["list"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No tasks yet."));
}

#[test]
fn blank_name_is_rejected_without_writing() {
    let store_path = temp_path("cli-add-blank.json");

    let blank = run(&store_path, &["add", "   "]);
    assert!(!blank.status.success());
    assert!(String::from_utf8_lossy(&blank.stderr).contains("task name is required"));

    let missing = run(&store_path, &["add"]);
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("validation_error"));

    assert!(!store_path.exists());
}

#[test]
fn rename_and_edit_update_the_task() {
    let store_path = temp_path("cli-rename-edit.json");

    assert!(run(&store_path, &["add", "Walk", "--color", "blue"]).status.success());
    let renamed = run(&store_path, &["rename", "walk", "Evening walk"]);
    assert!(renamed.status.success());
    assert!(String::from_utf8_lossy(&renamed.stdout).contains("Renamed task: Evening walk"));

    let edited = run(
        &store_path,
        &["edit", "Evening walk", "--priority", "low", "--clear-color", "--json"],
    );
    std::fs::remove_file(&store_path).ok();

    assert!(edited.status.success());
    let task: serde_json::Value = serde_json::from_slice(&edited.stdout).unwrap();
    assert_eq!(task["name"], "Evening walk");
    assert_eq!(task["priority"], "Low");
    assert!(task["color"].is_null());
}

#[test]
fn edit_without_changes_is_rejected() {
    let store_path = temp_path("cli-edit-empty.json");

    assert!(run(&store_path, &["add", "Walk"]).status.success());
    let output = run(&store_path, &["edit", "Walk"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("validation_error"));
}

#[test]
fn delete_removes_task_and_its_history() {
    let store_path = temp_path("cli-delete.json");

    assert!(run(&store_path, &["add", "Stretch"]).status.success());
    assert!(run(&store_path, &["add", "Read"]).status.success());
    assert!(run(&store_path, &["done", "Stretch"]).status.success());

    let deleted = run(&store_path, &["delete", "Stretch"]);
    assert!(deleted.status.success());
    assert!(String::from_utf8_lossy(&deleted.stdout).contains("Deleted task: Stretch"));

    let content = std::fs::read_to_string(&store_path).unwrap();
    std::fs::remove_file(&store_path).ok();

    let stored: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(stored["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(stored["tasks"][0]["name"], "Read");
    assert!(stored["taskCompletions"].as_object().unwrap().is_empty());
}

#[test]
fn unknown_task_reports_not_found() {
    let store_path = temp_path("cli-unknown.json");

    let output = run(&store_path, &["toggle", "Swim"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: not_found"));
}
