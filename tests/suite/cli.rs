//! The `settle` binary: exit codes, stdout value, config handling.

use std::fs;
use std::net::TcpListener;
use std::time::{Duration, Instant};

use crate::common::{SettleBin, stderr, stdout};

#[test]
fn exists_prints_path_and_exits_zero() {
    let bin = SettleBin::new();
    let target = bin.dir().join("marker");
    fs::write(&target, "").unwrap();
    let target = target.display().to_string();

    let output = bin.run(&["exists", &target]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), target);
}

#[test]
fn quiet_suppresses_value() {
    let bin = SettleBin::new();
    let target = bin.dir().display().to_string();

    let output = bin.run(&["--quiet", "exists", &target]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
}

#[test]
fn missing_path_times_out_with_exit_one() {
    let bin = SettleBin::new();
    let target = bin.dir().join("never").display().to_string();

    let output = bin.run(&["--interval-ms", "5", "--timeout-ms", "40", "exists", &target]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("timeout on condition `exists "));
}

#[test]
fn tcp_probe_reports_peer_address() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let bin = SettleBin::new();

    let output = bin.run(&["--timeout-ms", "2000", "tcp", &addr]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), addr);
}

#[test]
fn unspawnable_command_exits_two() {
    let bin = SettleBin::new();

    let output = bin.run(&["cmd", "--", "settle-no-such-program-xyz"]);

    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.contains("error on condition `cmd settle-no-such-program-xyz`"));
    assert!(err.contains("failed to spawn"));
}

#[cfg(unix)]
#[test]
fn command_stdout_becomes_value() {
    let bin = SettleBin::new();

    let output = bin.run(&["cmd", "--", "sh", "-c", "echo healthy"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "healthy");
}

#[cfg(unix)]
#[test]
fn slow_command_cannot_stretch_the_timeout() {
    let bin = SettleBin::new();
    let started = Instant::now();

    let output = bin.run(&["--timeout-ms", "100", "cmd", "--", "sh", "-c", "sleep 3; exit 1"]);

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
}

#[test]
fn profile_from_config_file_applies() {
    let bin = SettleBin::new();
    bin.write_config("[profiles.quick]\ninitial_interval_ms = 5\ntimeout_ms = 30\n");
    let target = bin.dir().join("never").display().to_string();

    let output = bin.run(&["--profile", "quick", "exists", &target]);

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
}

#[test]
fn configuration_errors_exit_three() {
    let bin = SettleBin::new();
    let target = bin.dir().display().to_string();

    let no_config = bin.run(&["--profile", "quick", "exists", &target]);
    assert_eq!(no_config.status.code(), Some(3));
    assert!(stderr(&no_config).contains("no config file was found"));

    bin.write_config("[wait]\ninitial_interval_ms = 0\n");
    let invalid = bin.run(&["exists", &target]);
    assert_eq!(invalid.status.code(), Some(3));
    assert!(stderr(&invalid).contains("must be greater than zero"));

    let bad_flag = bin.run(&["--interval-ms", "0", "exists", &target]);
    assert_eq!(bad_flag.status.code(), Some(3));
    assert!(stderr(&invalid).contains(&bin.config_path().display().to_string()));
}

#[test]
fn missing_config_named_by_env_exits_three() {
    let bin = SettleBin::new();
    let missing = bin.dir().join("missing.toml");
    let target = bin.dir().display().to_string();

    let output = bin.run_with_config_env(&missing, &["exists", &target]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("failed to read config"));
}
