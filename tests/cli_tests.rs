//! Integration tests for the Multimeter CLI
//!
//! These run the binary for everything that happens before the terminal is
//! taken over: flags, config loading and credential checks.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get the binary to test, isolated from the caller's environment
fn multimeter_cmd() -> Command {
    let mut cmd = Command::cargo_bin("multimeter").unwrap();
    for var in [
        "MULTIMETER_EMAIL",
        "MULTIMETER_PASSWORD",
        "MULTIMETER_SERVER",
        "MULTIMETER_SHARD",
        "MULTIMETER_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_flag() {
    multimeter_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "terminal dashboard for the Screeps console",
        ))
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--shard"));
}

#[test]
fn test_version_flag() {
    multimeter_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("multimeter"));
}

#[test]
fn test_missing_email_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.yaml");
    fs::write(&config, "password: hunter2\n").unwrap();

    multimeter_cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Config error"))
        .stderr(predicate::str::contains("MULTIMETER_EMAIL"));
}

#[test]
fn test_missing_password_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.yaml");
    fs::write(&config, "email: me@example.com\n").unwrap();

    multimeter_cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("MULTIMETER_PASSWORD"));
}

#[test]
fn test_malformed_config_shows_fix() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.yaml");
    fs::write(&config, "email: [unterminated\n").unwrap();

    multimeter_cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_invalid_server_url_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.yaml");
    fs::write(&config, "email: me@example.com\npassword: hunter2\n").unwrap();

    multimeter_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--server", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_env_supplies_credentials_checked_before_tui() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("missing.yaml");

    // Email from the environment, password still missing
    multimeter_cmd()
        .arg("--config")
        .arg(&config)
        .env("MULTIMETER_EMAIL", "me@example.com")
        .assert()
        .failure()
        .stderr(predicate::str::contains("MULTIMETER_PASSWORD"));
}

#[test]
fn test_zero_handshake_timeout_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.yaml");
    fs::write(
        &config,
        "email: me@example.com\npassword: hunter2\nhandshake_timeout_secs: 0\n",
    )
    .unwrap();

    multimeter_cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Config error"))
        .stderr(predicate::str::contains("handshake_timeout_secs"));
}
