//! CLI integration tests for the demo mode.

use std::process::Command;

#[test]
fn demo_cli_serves_everyone_within_capacity() {
    let bin = env!("CARGO_BIN_EXE_burger_bar");
    // Run the demo binary with default settings.
    let output = Command::new(bin)
        .output()
        .expect("failed to run demo binary");

    // Demo should exit cleanly.
    assert!(
        output.status.success(),
        "demo exited with non-zero status: {:?}",
        output.status
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("DEMO SUMMARY"),
        "demo summary missing from output"
    );

    // The seat pool must never be over-committed.
    let violation_line = stdout
        .lines()
        .find(|line| line.starts_with("seat_violation="))
        .expect("seat_violation line missing");
    assert_eq!(violation_line.trim(), "seat_violation=false");

    // Every customer gets a burger.
    let burgers_line = stdout
        .lines()
        .find(|line| line.starts_with("burgers_served="))
        .expect("burgers_served line missing");
    assert_eq!(burgers_line.trim(), "burgers_served=10");

    // All seat tokens are back in the pool at the end.
    let seats_line = stdout
        .lines()
        .find(|line| line.starts_with("seats_free_at_end="))
        .expect("seats_free_at_end line missing");
    assert_eq!(seats_line.trim(), "seats_free_at_end=4");
}
