//! End-to-end tests that run the `bitflip` binary.

use std::process::Command;

fn bitflip(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_bitflip"))
        .args(args)
        .env_remove("BITFLIP_SHOTS")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run bitflip")
}

#[test]
fn test_help_lists_commands() {
    let out = bitflip(&["--help"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    for cmd in ["encode", "error", "correct", "pipeline", "statevector", "majority", "batch"] {
        assert!(text.contains(cmd), "missing {cmd} in help");
    }
}

#[test]
fn test_majority_json() {
    let out = bitflip(&["majority", "010", "000", "--format", "json"]);
    assert!(out.status.success());

    let votes: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let votes = votes.as_array().unwrap();
    assert_eq!(votes.len(), 2);
    assert_eq!(votes[0]["majority"], "0");
    assert_eq!(votes[0]["error_position"], 1);
    assert_eq!(votes[1]["error_detected"], false);
}

#[test]
fn test_majority_rejects_bad_readout() {
    let out = bitflip(&["majority", "01"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Error:"));
}

#[test]
fn test_pipeline_json_reports_full_success() {
    let out = bitflip(&[
        "pipeline", "--state", "1", "--qubit", "2", "--shots", "200", "--format", "json",
    ]);
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["initial_state"], "1");
    assert_eq!(report["mode"], "mirror");
    assert_eq!(report["expected"], "111");
    assert_eq!(report["success_rate"], 100.0);
    assert_eq!(report["counts"]["111"], 200);
}

#[test]
fn test_invalid_qubit_is_usage_error() {
    let out = bitflip(&["error", "--qubit", "5"]);
    assert_eq!(out.status.code(), Some(2));
}
