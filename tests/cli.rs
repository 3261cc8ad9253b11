use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;

fn quests_cmd() -> Command {
    let mut cmd = Command::cargo_bin("quests").expect("binary quests is built");
    cmd.env_remove("QUESTS_NOW")
        .env_remove("QUESTS_REWARDS")
        .env("NO_COLOR", "1");
    cmd
}

fn read_json(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("valid json")
}

const SCRIPT: &str = r#"{
  "steps": [
    {"at": "2026-01-01T09:00:00Z", "op": "start", "id": "welcome_5"},
    {"at": "2026-01-01T09:10:00Z", "op": "deposit", "vault_id": "v1", "amount_usd": 5},
    {"at": "2026-01-01T09:11:00Z", "op": "claim", "id": "welcome_5"},
    {"at": "2026-01-01T09:12:00Z", "op": "claim", "id": "welcome_5"},
    {"at": "2026-01-01T09:15:00Z", "op": "position", "vault_id": "v1", "balance_usd": 30},
    {"at": "2026-01-01T09:16:00Z", "op": "start", "id": "hold_existing_25"},
    {"at": "2026-01-01T09:20:00Z", "op": "withdraw", "vault_id": "v1", "amount_usd": 10, "balance_before_usd": 30},
    {"at": "2026-01-01T09:21:00Z", "op": "deposit", "vault_id": "v1"},
    {"at": "2026-01-01T23:00:00Z", "op": "snapshot", "vault_id": "v1", "wallet": "w1", "qualified": true},
    {"at": "2026-01-02T23:00:00Z", "op": "snapshot", "vault_id": "v1", "wallet": "w1", "qualified": true},
    {"at": "2026-01-04T23:00:00Z", "op": "snapshot", "vault_id": "v1", "wallet": "w1", "qualified": true}
  ]
}"#;

fn find_quest<'a>(v: &'a Value, id: &str) -> &'a Value {
    v["quests"]
        .as_array()
        .unwrap()
        .iter()
        .find(|q| q["id"] == id)
        .unwrap_or_else(|| panic!("quest {} in output", id))
}

#[test]
fn replay_json_reports_final_state() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("script.json");
    fs::write(&script, SCRIPT).unwrap();

    let out = quests_cmd()
        .args(["--format", "json", "replay", script.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(find_quest(&v, "welcome_5")["state"], "completed");
    assert_eq!(find_quest(&v, "deposit_50")["state"], "available");
    assert_eq!(find_quest(&v, "highroller_500")["state"], "locked");
    assert_eq!(find_quest(&v, "hold_existing_25")["state"], "failed");
    assert_eq!(find_quest(&v, "welcome_5")["kind"], "deposit_once");
    assert_eq!(v["xp_total"], 50);
    assert_eq!(v["grants"].as_array().unwrap().len(), 1);

    let streak = &v["streaks"][0];
    assert_eq!(streak["current"], 1);
    assert_eq!(streak["longest"], 2);
    assert_eq!(streak["events"][0]["day"], "2026-01-01");
}

#[test]
fn replay_table_shows_quests_and_streaks() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("script.json");
    fs::write(&script, SCRIPT).unwrap();

    quests_cmd()
        .args(["replay", script.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("welcome_5"))
        .stdout(predicate::str::contains("completed"))
        .stdout(predicate::str::contains("xp: 50"))
        .stdout(predicate::str::contains("\u{1b}[").not());
}

#[test]
fn replay_missing_script_exit_code_5() {
    quests_cmd()
        .args(["replay", "/definitely/not/a/script.json"])
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("Cannot read script"));
}

#[test]
fn replay_malformed_script_exit_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("bad.json");
    fs::write(&script, r#"{"steps": [{"at": "not a time", "op": "tick"}]}"#).unwrap();

    quests_cmd()
        .args(["replay", script.to_str().unwrap()])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid instant"));
}

#[test]
fn milestones_default_table_json() {
    let out = quests_cmd()
        .args(["--format", "json", "milestones"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    let pairs: Vec<(u64, u64)> = v["milestones"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| (m["days"].as_u64().unwrap(), m["xp"].as_u64().unwrap()))
        .collect();
    assert_eq!(pairs, vec![(1, 100), (3, 300), (7, 1000), (14, 2400), (30, 6000)]);
}

#[test]
fn milestones_from_reward_config_env() {
    let dir = tempfile::tempdir().unwrap();
    let rewards = dir.path().join("rewards.json");
    fs::write(&rewards, r#"[{"threshold": 3}, {"threshold": 10}]"#).unwrap();

    let out = quests_cmd()
        .env("QUESTS_REWARDS", &rewards)
        .args(["--format", "json", "milestones"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["milestones"][0]["days"], 3);
    assert_eq!(v["milestones"][0]["xp"], 300);
    assert_eq!(v["milestones"][1]["days"], 10);
    assert_eq!(v["milestones"][1]["xp"], 0);
}

#[test]
fn day_key_command() {
    quests_cmd()
        .args(["day-key", "1769903999999"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2026-01-31\n"));

    quests_cmd()
        .args(["day-key", "NaN"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid timestamp"));
}

#[test]
fn catalog_lists_every_quest() {
    let out = quests_cmd()
        .args(["--format", "json", "catalog"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    let ids: Vec<&str> = v["quests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            "welcome_5",
            "deposit_50",
            "highroller_500",
            "hold_7d",
            "deposit_and_hold_100",
            "hold_existing_25"
        ]
    );
}

#[test]
fn invalid_now_is_usage_error() {
    quests_cmd()
        .args(["--now", "tomorrow", "catalog"])
        .assert()
        .failure()
        .code(2);
}
