//! Integration tests for the `mountlink` binary.
//!
//! Each test runs the real binary against the in-process mount simulator with
//! an isolated environment, so nothing touches the user's configuration.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `mountlink` binary with env isolation.
///
/// Clears `MOUNTLINK_*` and `RUST_LOG`, points config directories at a
/// nonexistent path and makes the simulated mount connect immediately.
fn mountlink_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("mountlink");
    cmd.env("HOME", "/tmp/mountlink-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/mountlink-cli-test-nonexistent")
        .env_remove("RUST_LOG")
        .env_remove("MOUNTLINK_CONFIG")
        .env_remove("MOUNTLINK_DEVICE")
        .env_remove("MOUNTLINK_CLIENT_NAME")
        .env_remove("MOUNTLINK_SERVER__NAME")
        .env_remove("MOUNTLINK_SERVER__HOST")
        .env_remove("MOUNTLINK_SERVER__PORT")
        .env_remove("MOUNTLINK_SIMULATOR__CONNECT_DELAY_MS")
        .arg("--connect-delay-ms")
        .arg("0");
    cmd
}

// ── Command loop ────────────────────────────────────────────────────

#[test]
fn slew_then_exit() {
    mountlink_cmd()
        .write_stdin("mount_slew RA=10.5 DEC=-20.25\nexit\n")
        .assert()
        .success()
        .stdout("slewing mount to RA=10.50 DEC=-20.25\nshutting down\n");
}

#[test]
fn explicit_run_subcommand() {
    mountlink_cmd()
        .arg("run")
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout("shutting down\n");
}

#[test]
fn unknown_command_is_echoed() {
    mountlink_cmd()
        .write_stdin("foobar\nexit\n")
        .assert()
        .success()
        .stdout("unknown command: foobar\nshutting down\n");
}

#[test]
fn exit_matches_by_prefix() {
    mountlink_cmd()
        .write_stdin("exitfoo\nmount_slew RA=1 DEC=2\n")
        .assert()
        .success()
        .stdout("shutting down\n");
}

#[test]
fn malformed_slew_keeps_fields_read_before_the_mismatch() {
    mountlink_cmd()
        .write_stdin("mount_slew RA=4 DEC=xyz\nmount_slew RA=abc DEC=8\nexit\n")
        .assert()
        .success()
        .stdout(
            "slewing mount to RA=4.00 DEC=0.00\n\
             slewing mount to RA=0.00 DEC=0.00\n\
             shutting down\n",
        );
}

#[test]
fn end_of_input_exits_cleanly() {
    mountlink_cmd()
        .write_stdin("mount_slew RA=5 DEC=45\n")
        .assert()
        .success()
        .stdout("slewing mount to RA=5.00 DEC=45.00\n");
}

#[test]
fn logs_stay_off_stdout() {
    mountlink_cmd()
        .arg("-vv")
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout("shutting down\n")
        .stderr(predicate::str::contains("executing command"));
}

#[test]
fn lifecycle_is_logged_by_default() {
    mountlink_cmd()
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout("shutting down\n")
        .stderr(
            predicate::str::contains("client attached to bus")
                .and(predicate::str::contains("shutting down session")),
        );
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    mountlink_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("telescope mount")
            .and(predicate::str::contains("run"))
            .and(predicate::str::contains("config"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn version_flag() {
    mountlink_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mountlink"));
}

#[test]
fn invalid_port_is_a_usage_error() {
    mountlink_cmd()
        .args(["--port", "not-a-port"])
        .assert()
        .code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn completions_zsh() {
    mountlink_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_path_honours_flag() {
    mountlink_cmd()
        .args(["config", "path", "--config", "/tmp/elsewhere/mountlink.toml"])
        .assert()
        .success()
        .stdout("/tmp/elsewhere/mountlink.toml\n");
}

#[test]
fn config_show_prints_effective_toml() {
    mountlink_cmd()
        .args(["config", "show", "--device", "Mount Agent", "--port", "7625"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("device = \"Mount Agent\"")
                .and(predicate::str::contains("port = 7625"))
                .and(predicate::str::contains("connect_delay_ms = 0")),
        );
}

#[test]
fn config_init_writes_then_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mountlink.toml");
    let path_arg = path.to_str().unwrap();

    mountlink_cmd()
        .args(["config", "init", "--config", path_arg, "--host", "localhost"])
        .assert()
        .success();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("host = \"localhost\""), "{written}");

    mountlink_cmd()
        .args(["config", "init", "--config", path_arg])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));

    mountlink_cmd()
        .args(["config", "init", "--force", "--config", path_arg])
        .assert()
        .success();
}

#[test]
fn config_file_drives_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mountlink.toml");
    std::fs::write(&path, "device = \"Mount Agent\"\n").unwrap();

    mountlink_cmd()
        .args(["--config", path.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("device = \"Mount Agent\""));
}

#[test]
fn missing_config_file_exits_with_config_code() {
    mountlink_cmd()
        .args(["--config", "/tmp/mountlink-cli-test-nonexistent/absent.toml"])
        .write_stdin("exit\n")
        .assert()
        .code(78)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn invalid_config_value_exits_with_config_code() {
    mountlink_cmd()
        .args(["--port", "0"])
        .write_stdin("exit\n")
        .assert()
        .code(78)
        .stdout(predicate::str::is_empty());
}
