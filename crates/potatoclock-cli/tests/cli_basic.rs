//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify the JSON it prints.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command in `data_dir` and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_potatoclock"))
        .args(args)
        .env("POTATOCLOCK_DATA_DIR", data_dir)
        .env_remove("POTATOCLOCK_USER")
        .env_remove("POTATOCLOCK_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Run a command that must succeed and parse its JSON output.
fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn add_task(data_dir: &Path, extra: &[&str]) -> String {
    let mut args = vec!["task", "add"];
    args.extend_from_slice(extra);
    let created = run_json(data_dir, &args);
    created[0]["id"].as_str().unwrap().to_string()
}

#[test]
fn test_task_add_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let created = run_json(dir.path(), &["task", "add", "Write report"]);
    assert_eq!(created.as_array().unwrap().len(), 1);
    assert_eq!(created[0]["title"], "Write report");
    assert_eq!(created[0]["duration"], 60);
    assert_eq!(created[0]["dayIndex"], Value::Null);

    let inbox = run_json(dir.path(), &["task", "list", "--inbox"]);
    assert_eq!(inbox.as_array().unwrap().len(), 1);
}

#[test]
fn test_task_add_weekdays() {
    let dir = tempfile::tempdir().unwrap();
    let created = run_json(
        dir.path(),
        &["task", "add", "Gym", "--category", "exercise", "--days", "1,3,5"],
    );
    assert_eq!(created.as_array().unwrap().len(), 3);
    let wednesday = run_json(dir.path(), &["task", "list", "--day", "3"]);
    assert_eq!(wednesday[0]["startMinutes"], 540);
}

#[test]
fn test_task_add_rejects_blank_title() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["task", "add", "   "]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_durations_longer_than_a_day_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        dir.path(),
        &["task", "add", "Marathon", "--duration", "4294967295", "--days", "1"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("duration"));

    let (_, _, code) = run_cli(
        dir.path(),
        &[
            "session",
            "log",
            "--title",
            "Backfill",
            "--start",
            "2025-03-03T09:00:00Z",
            "--end",
            "2025-03-03T09:00:00Z",
            "--duration",
            "4294967295",
        ],
    );
    assert_ne!(code, 0);

    let (stdout, _, code) = run_cli(dir.path(), &["timeline", "week"]);
    assert_eq!(code, 0, "{stdout}");
}

#[test]
fn test_grid_move_and_unschedule() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_task(dir.path(), &["Write report"]);

    let moved = run_json(dir.path(), &["grid", "move", &id, "--day", "1", "--at", "10:07"]);
    assert_eq!(moved["activity"]["dayIndex"], 1);
    let start = moved["activity"]["startMinutes"].as_u64().unwrap();
    assert!(start == 600 || start == 615, "start was {start}");

    let back = run_json(dir.path(), &["grid", "inbox", &id]);
    assert_eq!(back["activity"]["dayIndex"], Value::Null);
    assert_eq!(back["activity"]["startMinutes"], Value::Null);
}

#[test]
fn test_grid_resize_snaps_to_minimum() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_task(dir.path(), &["Review", "--days", "2"]);
    let resized = run_json(dir.path(), &["grid", "resize", &id, "--dy", "-40"]);
    assert_eq!(resized["activity"]["duration"], 30);
}

#[test]
fn test_grid_resize_requires_scheduled_activity() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_task(dir.path(), &["Inbox item"]);
    let (_, _, code) = run_cli(dir.path(), &["grid", "resize", &id, "--dy", "30"]);
    assert_ne!(code, 0);
}

#[test]
fn test_timer_needs_selection() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "start"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Select a planned activity"));
}

#[test]
fn test_timer_complete_records_session() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "start", "--title", "Deep work"]);
    let events = run_json(dir.path(), &["timer", "complete"]);
    let events = events.as_array().unwrap();
    assert!(events.iter().any(|e| e["type"] == "TimerCompleted"));
    let snapshot = events.last().unwrap();
    assert_eq!(snapshot["mode"], "BREAK");
    assert_eq!(snapshot["running"], false);

    let sessions = run_json(dir.path(), &["session", "list"]);
    assert_eq!(sessions[0]["taskTitle"], "Deep work");
    assert_eq!(sessions[0]["status"], "COMPLETED");
}

#[test]
fn test_timer_interrupt_with_reason() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "start", "--title", "Deep work"]);
    run_json(dir.path(), &["timer", "interrupt"]);
    let (_, _, code) = run_cli(dir.path(), &["timer", "start"]);
    assert_ne!(code, 0, "start must wait for the reason");

    run_json(dir.path(), &["timer", "reason", "phone call"]);
    let sessions = run_json(dir.path(), &["session", "list"]);
    assert_eq!(sessions[0]["status"], "INTERRUPTED");
    assert_eq!(sessions[0]["interruptionReason"], "phone call");
}

#[test]
fn test_session_log_rejects_inverted_range() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(
        dir.path(),
        &[
            "session",
            "log",
            "--title",
            "Backfill",
            "--start",
            "2025-03-03T10:00:00Z",
            "--end",
            "2025-03-03T09:00:00Z",
        ],
    );
    assert_ne!(code, 0);
}

#[test]
fn test_review_and_weekly_stats() {
    let dir = tempfile::tempdir().unwrap();
    run_json(
        dir.path(),
        &[
            "session",
            "log",
            "--title",
            "Backfill",
            "--start",
            "2025-03-05T12:00:00Z",
            "--end",
            "2025-03-05T12:50:00Z",
        ],
    );
    run_json(dir.path(), &["review", "set", "8", "--date", "2025-03-05"]);

    let stats = run_json(dir.path(), &["stats", "week", "--date", "2025-03-05"]);
    assert_eq!(stats["week_start"], "2025-03-02");
    assert_eq!(stats["days"].as_array().unwrap().len(), 7);
    assert_eq!(stats["days"][3]["score"], 8);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "grid.snap_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "15");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.work_minutes", "50"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "timer.work_minutes"]);
    assert_eq!(stdout.trim(), "50");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_signed_in_user_shares_remote_store() {
    let dir = tempfile::tempdir().unwrap();
    add_task(dir.path(), &["Shared", "--user", "ada"]);

    let ada = run_json(dir.path(), &["task", "list", "--user", "ada"]);
    assert_eq!(ada.as_array().unwrap().len(), 1);
    let anonymous = run_json(dir.path(), &["task", "list"]);
    assert!(anonymous.as_array().unwrap().is_empty());
}
