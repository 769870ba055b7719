//! Integration tests for the CLI interface

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PROPOSALS: &str = r#"{"id":"s1","suggestion_type":"translate_content","target_id":"exp1","language_code":"es","author_id":"u1","status":"accepted","edited_by_reviewer":false,"content_html":"<p>hi there</p>","last_updated":"2024-01-05T10:00:00Z"}
{"id":"s2","suggestion_type":"translate_content","target_id":"exp2","language_code":"es","author_id":"u1","status":"rejected","edited_by_reviewer":false,"content_html":"<p>a b c</p>","last_updated":"2024-01-06T10:00:00Z"}
{"id":"s3","suggestion_type":"add_question","target_id":"skill1","language_code":"en","author_id":"u2","status":"accepted","last_updated":"2024-01-06T10:00:00Z"}
"#;

const OPPORTUNITIES: &str = r#"{"id":"exp1","topic_id":"t1"}
{"id":"exp9","topic_id":"t9"}
"#;

fn write_inputs(dir: &Path, opportunities: &str) {
    fs::write(dir.join("proposals.jsonl"), PROPOSALS).unwrap();
    fs::write(dir.join("opportunities.jsonl"), opportunities).unwrap();
}

fn contrib_stats(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("contrib-stats").unwrap();
    cmd.current_dir(dir)
        .env_remove("CONTRIB_STATS_THREADS")
        .env_remove("CONTRIB_STATS_LOG_LEVEL")
        .env_remove("CONTRIB_STATS_INCLUDE_DELETED");
    cmd
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    contrib_stats(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_run_writes_output_and_prints_count() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), OPPORTUNITIES);

    contrib_stats(dir.path())
        .args(["run", "--output", "out/stats.jsonl", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::diff("SUCCESS 2\n"));

    let output = fs::read_to_string(dir.path().join("out/stats.jsonl")).unwrap();
    let ids: Vec<String> = output
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["id"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(ids, vec!["es.u1.", "es.u1.t1"]);
    assert!(dir.path().join("out/stats.summary.json").exists());
}

#[test]
fn test_run_with_config_file() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), OPPORTUNITIES);
    fs::write(
        dir.path().join("contrib-stats.toml"),
        "threads = 1\n\n[output]\npath = \"from-config.jsonl\"\n",
    )
    .unwrap();

    contrib_stats(dir.path())
        .args(["-c", "contrib-stats.toml", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS 2"));

    assert!(dir.path().join("from-config.jsonl").exists());
}

#[test]
fn test_run_with_no_matching_proposals_succeeds() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("proposals.jsonl"), "").unwrap();
    fs::write(dir.path().join("opportunities.jsonl"), OPPORTUNITIES).unwrap();

    contrib_stats(dir.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::diff("SUCCESS 0\n"));
}

#[test]
fn test_duplicate_opportunities_fail_run() {
    let dir = TempDir::new().unwrap();
    write_inputs(
        dir.path(),
        "{\"id\":\"exp1\",\"topic_id\":\"t1\"}\n{\"id\":\"exp1\",\"topic_id\":\"t2\"}\n",
    );

    contrib_stats(dir.path())
        .args(["run", "--output", "stats.jsonl"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Duplicate opportunity id 'exp1'"));

    assert!(!dir.path().join("stats.jsonl").exists());
}

#[test]
fn test_missing_input_fails_with_stage() {
    let dir = TempDir::new().unwrap();

    contrib_stats(dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read proposals"));
}

#[test]
fn test_config_prints_effective_values() {
    let dir = TempDir::new().unwrap();

    contrib_stats(dir.path())
        .args(["config", "--threads", "3", "--include-deleted"])
        .env("CONTRIB_STATS_LOG_LEVEL", "warn")
        .assert()
        .success()
        .stdout(predicate::str::contains("threads = 3"))
        .stdout(predicate::str::contains("include_deleted = true"))
        .stdout(predicate::str::contains("log_level = \"warn\""))
        .stdout(predicate::str::contains("[input]"));
}

#[test]
fn test_invalid_command() {
    let dir = TempDir::new().unwrap();
    contrib_stats(dir.path())
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}
