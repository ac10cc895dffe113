use std::process::{Command, Output};

fn run_headless(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tile_traffic"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute simulation")
}

/// Value after a `label:` in the log output
fn logged_value(stderr: &str, label: &str) -> usize {
    let line = stderr
        .lines()
        .find(|line| line.contains(label))
        .unwrap_or_else(|| panic!("Missing '{}' statistic", label));
    line.split(label)
        .nth(1)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or_else(|| panic!("Could not parse line: {}", line))
}

/// Test that the simulation runs in headless mode without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = run_headless(&["--ticks", "50", "--seed", "1"]);

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that simulation statistics are logged
#[test]
fn test_simulation_statistics_logged() {
    let output = run_headless(&["--width", "7", "--depth", "7", "--ticks", "100", "--seed", "4"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(logged_value(&stderr, "Vehicles spawned:") > 0);
    assert!(logged_value(&stderr, "Road tiles:") > 0);
    assert!(logged_value(&stderr, "Junction tiles:") > 0);
    assert!(logged_value(&stderr, "Tracks:") > 0);
    assert!(logged_value(&stderr, "Active vehicles:") <= 12);
}

#[test]
fn test_bad_arguments_are_rejected() {
    let output = run_headless(&["--ticks", "lots"]);
    assert!(!output.status.success());
}
