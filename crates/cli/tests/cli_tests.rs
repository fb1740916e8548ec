//! CLI integration tests

use std::process::Command;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-p", "wattcast-cli", "--quiet", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("power-consumption predictor"),
        "Should show app description"
    );
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("schema"), "Should show schema command");
    assert!(stdout.contains("model"), "Should show model command");
    assert!(stdout.contains("history"), "Should show history command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = run_cli(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("wattcast"), "Should show binary name");
}

/// Test predict subcommand help lists every input flag
#[test]
fn test_predict_help() {
    let output = run_cli(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    for flag in [
        "--global-reactive-power",
        "--voltage",
        "--global-intensity",
        "--sub-metering-1",
        "--sub-metering-2",
        "--sub-metering-3",
        "--hour",
        "--day-of-week",
        "--month",
        "--gap-rolling-mean-60",
        "--gap-diff-1",
    ] {
        assert!(stdout.contains(flag), "Should show {} option", flag);
    }
}

/// Test model subcommands are listed
#[test]
fn test_model_help() {
    let output = run_cli(&["model", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Model help should succeed");
    assert!(stdout.contains("info"), "Should show info subcommand");
    assert!(stdout.contains("reload"), "Should show reload subcommand");
}

/// Test history comparison subcommand help
#[test]
fn test_history_comparison_help() {
    let output = run_cli(&["history", "comparison", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        output.status.success(),
        "History comparison help should succeed"
    );
    assert!(stdout.contains("--limit"), "Should show limit option");
}

/// Test history histogram subcommand help
#[test]
fn test_history_histogram_help() {
    let output = run_cli(&["history", "histogram", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        output.status.success(),
        "History histogram help should succeed"
    );
    assert!(stdout.contains("--bins"), "Should show bins option");
}

/// Test format and api-url global options
#[test]
fn test_global_options() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("WATTCAST_API_URL"), "Should show env var");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = run_cli(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required prediction flags error handling
#[test]
fn test_predict_missing_arguments() {
    let output = run_cli(&["predict", "--voltage", "235"]);

    assert!(!output.status.success(), "Missing arguments should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing arguments"
    );
}
