use std::process::{Command, Output};

fn run_simulator(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_traffic_flow"))
        .args(args)
        .env("RUST_LOG", "warn,traffic_flow=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Pull the number after `label` out of a log line
fn logged_value(stderr: &str, label: &str) -> f64 {
    let line = stderr
        .lines()
        .find(|line| line.contains(label))
        .unwrap_or_else(|| panic!("Could not find '{}' line", label));

    // Format: "[2026-01-01T00:00:00Z INFO  traffic_flow] Vehicles exited: 3"
    let parts: Vec<&str> = line.split(label).collect();
    let value = parts
        .get(1)
        .map(|s| s.trim().trim_end_matches('%'))
        .and_then(|s| s.split_whitespace().next())
        .unwrap_or_else(|| panic!("Could not parse value from line: {}", line));

    value
        .parse()
        .unwrap_or_else(|_| panic!("Could not parse '{}' as number", value))
}

/// Test that the demo network runs to completion
#[test]
fn test_demo_simulation_runs() {
    let output = run_simulator(&["--steps", "120"]);

    assert!(
        output.status.success(),
        "Simulation failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that run statistics are logged
#[test]
fn test_simulation_statistics_logged() {
    let output = run_simulator(&["--steps", "30"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for label in [
        "Snapshots:",
        "Initial vehicles:",
        "Vehicles injected:",
        "Vehicles exited:",
        "Active vehicles:",
        "Mean speed:",
        "Efficiency:",
        "Grade:",
    ] {
        assert!(stderr.contains(label), "Missing '{}' statistic", label);
    }
}

/// Test that the logged counters reconcile
#[test]
fn test_logged_vehicle_counts_reconcile() {
    let output = run_simulator(&["--steps", "200", "--seed", "9"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    let initial = logged_value(&stderr, "Initial vehicles:");
    let injected = logged_value(&stderr, "Vehicles injected:");
    let exited = logged_value(&stderr, "Vehicles exited:");
    let active = logged_value(&stderr, "Active vehicles:");

    assert_eq!(logged_value(&stderr, "Snapshots:"), 200.0);
    assert_eq!(active, initial + injected - exited);
}

/// Test that a missing network file is reported and fails the run
#[test]
fn test_missing_config_fails() {
    let output = run_simulator(&["--config", "/nonexistent/traffic_flow/network.json"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to read network file"),
        "Unexpected error output: {}",
        stderr
    );
}

/// Test that a zero time step is rejected before anything runs
#[test]
fn test_zero_time_step_rejected() {
    let output = run_simulator(&["--dt", "0"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("SIMULATION COMPLETE"));
}

/// Test that export writes both files
#[test]
fn test_export_dir_written() {
    let dir = std::env::temp_dir().join(format!("traffic_flow_cli_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let dir_arg = dir.to_string_lossy().to_string();
    let output = run_simulator(&["--steps", "10", "--export-dir", &dir_arg]);
    assert!(output.status.success(), "Simulation failed to run");

    assert!(dir.join("history.csv").is_file());
    assert!(dir.join("report.json").is_file());

    std::fs::remove_dir_all(&dir).unwrap();
}
