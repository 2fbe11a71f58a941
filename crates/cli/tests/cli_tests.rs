//! CLI integration tests

use std::process::Command;

fn atlanta(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "atlanta-cli", "--"])
        .args(args)
        .env_remove("ATLANTA_RESERVED_CELL")
        .env_remove("ATLANTA_NAMESPACE")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = atlanta(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("best performance out of KubeVirt VMs"),
        "Should show app description"
    );
    assert!(stdout.contains("node"), "Should show node command");
    assert!(stdout.contains("--kubeconfig"), "Should show kubeconfig option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = atlanta(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("atlanta"), "Should show binary name");
}

/// Test node subcommand help
#[test]
fn test_node_help() {
    let output = atlanta(&["node", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Node help should succeed");
    assert!(stdout.contains("--sriov"), "Should show sriov option");
    assert!(stdout.contains("--reserve-cell"), "Should show reserve-cell option");
    assert!(stdout.contains("--summary"), "Should show summary option");
}

/// A node name is required
#[test]
fn test_node_without_name_fails() {
    let output = atlanta(&["node"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr.contains("please provide a node name"),
        "Should explain the missing node name, got: {}",
        stderr
    );
    assert!(output.stdout.is_empty(), "Nothing should reach stdout");
}

/// Only one node name is accepted
#[test]
fn test_node_with_two_names_fails() {
    let output = atlanta(&["node", "worker-0", "worker-1"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr.contains("please provide only one node name"),
        "Should reject extra node names, got: {}",
        stderr
    );
}

/// Invalid reservation cell is rejected by argument parsing
#[test]
fn test_invalid_reserve_cell() {
    let output = atlanta(&["node", "worker-0", "--reserve-cell", "first"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("invalid reservation cell"));
}

/// Invalid output format
#[test]
fn test_invalid_format() {
    let output = atlanta(&["--format", "table", "node", "worker-0"]);

    assert!(!output.status.success(), "Invalid format should fail");
}
