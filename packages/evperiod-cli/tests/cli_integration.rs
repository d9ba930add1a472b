use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn evperiod() -> Command {
    Command::cargo_bin("evperiod").unwrap()
}

/// Two pixels of alternating ON/OFF events, one event per millisecond
fn write_events(dir: &Path, name: &str) -> PathBuf {
    let mut text = String::from("# timestamp_ns polarity pixel\n");
    for i in 0..41i64 {
        let t = i * 1_000_000;
        let pol = if i % 2 == 0 { 1 } else { 0 };
        text.push_str(&format!("{} {} 0\n", t, pol));
        text.push_str(&format!("{},{},3\n", t + 500, if pol == 1 { 1 } else { -1 }));
    }
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn stdout_json(output: &assert_cmd::assert::Assert) -> serde_json::Value {
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    evperiod()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    evperiod()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("evperiod"));
}

#[test]
fn test_help_flag() {
    evperiod()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("oscillation periods"));
}

// =============================================================================
// ESTIMATORS SUBCOMMAND
// =============================================================================

#[test]
fn test_estimators_subcommand() {
    evperiod()
        .arg("estimators")
        .assert()
        .success()
        .stdout(predicate::str::contains("ON"))
        .stdout(predicate::str::contains("OFF"))
        .stdout(predicate::str::contains("FLT"))
        .stdout(predicate::str::contains("INT"));
}

#[test]
fn test_estimators_json() {
    let output = evperiod().args(["estimators", "--json"]).assert().success();
    let parsed = stdout_json(&output);
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 4);
    assert_eq!(arr[3]["kind"], "interpolated");
    assert_eq!(arr[3]["sub_sample"], true);
}

// =============================================================================
// POLES SUBCOMMAND
// =============================================================================

#[test]
fn test_poles_text() {
    evperiod()
        .args(["poles", "--cutoff-period", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("Warm-up:            10 samples"));
}

#[test]
fn test_poles_json() {
    let output = evperiod()
        .args(["poles", "--cutoff-period", "12", "--json"])
        .assert()
        .success();
    let parsed = stdout_json(&output);
    let alpha = parsed["poles"]["alpha"].as_f64().unwrap();
    let beta = parsed["poles"]["beta"].as_f64().unwrap();
    assert!(alpha > 0.0 && alpha < 1.0);
    assert!((alpha - beta).abs() < 1e-12);
    assert!((parsed["peak_period"].as_f64().unwrap() - 12.0).abs() < 1e-3);
}

#[test]
fn test_poles_invalid_cutoff() {
    evperiod()
        .args(["poles", "--cutoff-period", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid cutoff period"));
}

// =============================================================================
// VALIDATE SUBCOMMAND
// =============================================================================

#[test]
fn test_validate_nonexistent_file() {
    evperiod()
        .args(["validate", "--events", "/nonexistent/events.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_validate_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_events(dir.path(), "events.txt");
    let output = evperiod()
        .args(["validate", "--json", "--events"])
        .arg(&path)
        .assert()
        .success();
    let parsed = stdout_json(&output);
    assert_eq!(parsed["pixels"], 2);
    assert_eq!(parsed["events"], 82);
    assert_eq!(parsed["monotonic"], true);
    assert!(parsed["error"].is_null());
}

#[test]
fn test_validate_unordered_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.txt");
    std::fs::write(&path, "100 1\n50 0\n").unwrap();
    evperiod()
        .args(["validate", "--events"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not monotonic"));
}

#[test]
fn test_validate_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.txt");
    std::fs::write(&path, "100 1\nhello world\n").unwrap();
    evperiod()
        .args(["validate", "--events"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("line 2"));
}

// =============================================================================
// RUN SUBCOMMAND
// =============================================================================

#[test]
fn test_run_missing_cutoff() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_events(dir.path(), "events.txt");
    evperiod()
        .args(["run", "--events"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--cutoff-period"));
}

#[test]
fn test_run_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_events(dir.path(), "events.txt");
    let output = evperiod()
        .args(["run", "--quiet", "--cutoff-period", "5", "--ground-truth", "500", "--events"])
        .arg(&path)
        .assert()
        .success();
    let parsed = stdout_json(&output);
    assert!(parsed["id"].is_string());
    assert!(parsed["created_at"].is_string());
    let pixels = parsed["pixels"].as_array().unwrap();
    assert_eq!(pixels.len(), 2);
    assert_eq!(pixels[0]["pixel"], 0);

    let baseline = pixels[0]["baseline_on"].as_array().unwrap();
    assert!(!baseline.is_empty());
    for r in baseline {
        let period = r["t_end"].as_i64().unwrap() - r["t_start"].as_i64().unwrap();
        assert_eq!(period, 2_000_000);
        assert_eq!(r["end_offset"].as_f64().unwrap(), 0.0);
    }
    let summary = &pixels[0]["summaries"][0];
    assert_eq!(summary["estimator"], "baseline_on");
    assert_eq!(summary["error"]["mean_error"].as_f64().unwrap(), 0.0);
}

#[test]
fn test_run_pixel_selection_and_compact() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_events(dir.path(), "events.txt");
    let output = evperiod()
        .args(["run", "--quiet", "--compact", "--cutoff-period", "5", "--pixel", "3", "--events"])
        .arg(&path)
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.trim_end().lines().count(), 1);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let pixels = parsed["pixels"].as_array().unwrap();
    assert_eq!(pixels.len(), 1);
    assert_eq!(pixels[0]["pixel"], 3);
}

#[test]
fn test_run_unknown_pixel() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_events(dir.path(), "events.txt");
    evperiod()
        .args(["run", "--cutoff-period", "5", "--pixel", "42", "--events"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("42"));
}

#[test]
fn test_run_output_file_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_events(dir.path(), "events.txt");
    let out = dir.path().join("result.json");
    evperiod()
        .args(["run", "--cutoff-period", "5", "--events"])
        .arg(&path)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("FLT"))
        .stderr(predicate::str::contains("Results written to"));
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed["config"]["cutoff_period"], 5.0);
}

#[test]
fn test_run_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_events(dir.path(), "events.txt");
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{"cutoff_period": 5.0, "noise": {"pass_dt": 100}, "histogram_bins": 8}"#,
    )
    .unwrap();
    let output = evperiod()
        .args(["run", "--quiet", "--events"])
        .arg(&path)
        .arg("--config")
        .arg(&config)
        .args(["--dead-dt", "50"])
        .assert()
        .success();
    let parsed = stdout_json(&output);
    assert_eq!(parsed["config"]["noise"]["pass_dt"], 100);
    assert_eq!(parsed["config"]["noise"]["dead_dt"], 50);
    assert!(parsed["pixels"][0]["summaries"][0]["histogram"].is_object());
}

#[test]
fn test_run_unordered_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.txt");
    std::fs::write(&path, "100 1\n50 0\n").unwrap();
    evperiod()
        .args(["run", "--cutoff-period", "5", "--events"])
        .arg(&path)
        .assert()
        .code(1);
}

// =============================================================================
// BATCH SUBCOMMAND
// =============================================================================

#[test]
fn test_batch_dry_run() {
    let dir = tempfile::tempdir().unwrap();
    write_events(dir.path(), "a.txt");
    write_events(dir.path(), "b.txt");
    let pattern = format!("{}/*.txt", dir.path().display());
    evperiod()
        .args(["batch", "--dry-run", "--glob", &pattern])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt"))
        .stdout(predicate::str::contains("b.txt"));
}

#[test]
fn test_batch_no_matches() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = format!("{}/*.txt", dir.path().display());
    evperiod()
        .args(["batch", "--cutoff-period", "5", "--glob", &pattern])
        .assert()
        .code(1);
}

#[test]
fn test_batch_jsonl_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_events(dir.path(), "a.txt");
    let b = write_events(dir.path(), "b.txt");
    let output = evperiod()
        .args(["batch", "--quiet", "--cutoff-period", "5", "--files"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["pixels"].as_array().unwrap().len(), 2);
    }
}

#[test]
fn test_batch_output_dir_partial_failure() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_events(dir.path(), "good.txt");
    let bad = dir.path().join("bad.txt");
    std::fs::write(&bad, "not an event\n").unwrap();
    let out_dir = dir.path().join("out");

    evperiod()
        .args(["batch", "--quiet", "--continue-on-error", "--cutoff-period", "5", "--files"])
        .arg(&bad)
        .arg(&good)
        .arg("--output-dir")
        .arg(&out_dir)
        .assert()
        .code(3);
    assert!(out_dir.join("good_periods.json").is_file());
    assert!(!out_dir.join("bad_periods.json").exists());
}

#[test]
fn test_batch_stops_on_first_error() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_events(dir.path(), "good.txt");
    let out_dir = dir.path().join("out");

    evperiod()
        .args(["batch", "--quiet", "--cutoff-period", "5", "--files", "/nonexistent/a.txt"])
        .arg(&good)
        .arg("--output-dir")
        .arg(&out_dir)
        .assert()
        .code(2);
    assert!(!out_dir.join("good_periods.json").exists());
}
