//! Integration test for the `mutate_events.rs` example.
//!
//! Expectation: one output line per input line, a status point for events
//! with a check and the rejection message for events without one.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const INPUT: &str = r#"{"timestamp":1000,"entity":{"metadata":{"name":"host01"}},"check":{"metadata":{"name":"disk"},"status":1,"state":"warning","occurrences":3,"occurrences_watermark":3}}
{"timestamp":1001,"entity":{"metadata":{"name":"host02"}}}"#;

fn write_temp_jsonl() -> std::path::PathBuf {
    let tmp = std::env::temp_dir().join(format!(
        "status_metric_example_test_{}.jsonl",
        std::process::id()
    ));
    fs::write(&tmp, INPUT)
        .unwrap_or_else(|e| panic!("failed to write temporary JSONL file: {e}"));
    tmp
}

#[test]
fn example_mutate_events_reads_file() {
    let path = write_temp_jsonl();
    let mut cmd = Command::new("cargo");
    cmd.args([
        "run",
        "--quiet",
        "--package",
        "status-metric-core",
        "--example",
        "mutate_events",
        "--",
        path.to_str()
            .unwrap_or_else(|| panic!("temporary path is not valid UTF-8: {path:?}")),
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "disk.status\t1\tentity=host01,check=disk,state=warning,occurrences=3,occurrences_watermark=3",
        ))
        .stdout(predicate::str::contains("<event has no check data>"));
}

#[test]
fn example_mutate_events_accepts_stdin() {
    let mut cmd = Command::new("cargo");
    cmd.args([
        "run",
        "--quiet",
        "--package",
        "status-metric-core",
        "--example",
        "mutate_events",
    ]);
    cmd.write_stdin(INPUT);

    let output = cmd.assert().success().get_output().stdout.clone();
    let out_str = String::from_utf8_lossy(&output);
    assert_eq!(out_str.lines().count(), 2, "unexpected output: {out_str}");
}
