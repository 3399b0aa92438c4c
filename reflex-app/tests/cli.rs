use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn reflex() -> Command {
    Command::cargo_bin("reflex").unwrap()
}

/// Headless single-pass run with short delays.
fn scripted(trials: &str, script: &str, json: &Path) -> Command {
    let mut cmd = reflex();
    cmd.args(["--run-once", "--min-delay", "0.01", "--max-delay", "0.03"])
        .args(["--trials", trials, "--simulate", script, "--json-out"])
        .arg(json);
    cmd
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_version_flag() {
    reflex()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reflex"));
}

#[test]
fn test_help_lists_run_flags() {
    reflex()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--run-once"))
        .stdout(predicate::str::contains("--json-out"))
        .stdout(predicate::str::contains("--min-delay"));
}

#[test]
fn test_unknown_flag_is_a_config_error() {
    reflex().arg("--trails").assert().code(1);
}

#[test]
fn test_interactive_needs_a_terminal() {
    reflex()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("needs a terminal"));
}

#[test]
fn test_live_run_once_needs_a_terminal() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("run.json");
    reflex()
        .args(["--run-once", "--trials", "1", "--json-out"])
        .arg(&json)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("needs a terminal"));
    assert!(!json.exists());
}

// =============================================================================
// COMPLETED RUNS
// =============================================================================

#[test]
fn test_mixed_run_writes_record() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("run.json");
    let csv = dir.path().join("run.csv");

    scripted("3", "200,fs,150", &json)
        .arg("--csv-out")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Results ==="))
        .stdout(predicate::str::contains("Trial 2: delay="))
        .stdout(predicate::str::contains("FALSE START"));

    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(record["trial_count"], 3);
    assert_eq!(record["valid_count"], 2);
    assert_eq!(record["false_start_count"], 1);
    let avg = record["average_reaction_ms"].as_f64().unwrap();
    assert!((avg - 175.0).abs() < 20.0, "{avg}");

    let trials = record["trials"].as_array().unwrap();
    assert_eq!(trials.len(), 3);
    for (i, trial) in trials.iter().enumerate() {
        assert_eq!(trial["trial"], i + 1);
        let delay = trial["random_delay_seconds"].as_f64().unwrap();
        assert!((0.01..0.03).contains(&delay), "{delay}");
    }
    assert_eq!(trials[1]["false_start"], true);
    assert!(trials[1]["reaction_ms"].is_null());
    assert_eq!(trials[0]["false_start"], false);
    assert!(trials[0]["reaction_ms"].as_f64().unwrap() >= 200.0);

    let csv_text = std::fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = csv_text.lines().collect();
    assert_eq!(lines[0], "trial,random_delay_seconds,reaction_ms,false_start");
    assert!(lines[2].starts_with("2,") && lines[2].ends_with(",,1"));
    assert!(lines[4].starts_with("average,,"));
}

#[test]
fn test_all_false_starts_have_null_average() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("run.json");

    scripted("2", "fs,fs", &json).assert().success();

    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(record["valid_count"], 0);
    assert_eq!(record["false_start_count"], 2);
    assert!(record["average_reaction_ms"].is_null());
}

#[test]
fn test_seeded_runs_repeat_their_delays() {
    let dir = tempdir().unwrap();
    let delays = |name: &str| {
        let json = dir.path().join(name);
        scripted("3", "fs,fs,fs", &json)
            .args(["--seed", "42"])
            .assert()
            .success();
        let record: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        record["trials"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["random_delay_seconds"].as_f64().unwrap())
            .collect::<Vec<f64>>()
    };
    assert_eq!(delays("a.json"), delays("b.json"));
}

#[test]
fn test_config_file_supplies_defaults() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("run.json");
    let config = dir.path().join("reflex.toml");
    std::fs::write(
        &config,
        "min_delay_seconds = 0.01\nmax_delay_seconds = 0.02\ntrial_count = 2\n",
    )
    .unwrap();

    reflex()
        .args(["--run-once", "--simulate", "120,130", "--config"])
        .arg(&config)
        .arg("--json-out")
        .arg(&json)
        .assert()
        .success();

    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(record["trial_count"], 2);
    assert_eq!(record["valid_count"], 2);
}

// =============================================================================
// FAILURES LEAVE NO OUTPUT
// =============================================================================

#[test]
fn test_invalid_parameters_exit_one_without_output() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("run.json");
    let cases: [&[&str]; 6] = [
        &["--min-delay", "0", "--max-delay", "1"],
        &["--min-delay", "-1", "--max-delay", "1"],
        &["--min-delay", "0.5", "--max-delay", "0"],
        &["--min-delay", "1.5", "--max-delay", "1.5"],
        &["--trials", "0"],
        &["--min-delay", "1", "--max-delay", "1e20"],
    ];
    for args in cases {
        reflex()
            .args(["--run-once", "--simulate", "200"])
            .args(args)
            .arg("--json-out")
            .arg(&json)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error:"));
        assert!(!json.exists(), "output written for {args:?}");
    }
}

#[test]
fn test_bad_script_is_a_config_error() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("run.json");
    scripted("1", "soon", &json).assert().code(1);
    assert!(!json.exists());
}

#[test]
fn test_abort_exits_three_without_output() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("run.json");
    let csv = dir.path().join("run.csv");

    scripted("5", "150,abort,150,150,150", &json)
        .arg("--csv-out")
        .arg(&csv)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Run aborted"));

    assert!(!json.exists());
    assert!(!csv.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_exhausted_input_is_a_quit() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("run.json");
    scripted("3", "150", &json).assert().code(4);
    assert!(!json.exists());
}

#[test]
fn test_unwritable_destination_exits_two() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("missing").join("run.json");
    scripted("1", "150", &json).assert().code(2);
    assert!(!json.exists());
}
