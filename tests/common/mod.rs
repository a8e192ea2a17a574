//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;

use settle_core::WaitConfig;
use tempfile::TempDir;
use tokio::time::sleep;

/// Short intervals and a generous timeout for tests that run on the real clock.
pub fn fast_config() -> WaitConfig {
    WaitConfig::new(Duration::from_millis(5), 5, Duration::from_secs(5))
}

/// Atomically create `path` with `contents` after `delay`, from a background task.
pub fn write_later(path: PathBuf, delay: Duration, contents: &'static str) {
    tokio::spawn(async move {
        sleep(delay).await;
        let staging = path.with_extension("partial");
        fs::write(&staging, contents).expect("write fixture file");
        fs::rename(&staging, &path).expect("publish fixture file");
    });
}

/// The `settle` binary, isolated from any user config file.
pub struct SettleBin {
    home: TempDir,
}

impl SettleBin {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temp home"),
        }
    }

    /// Config path handed to the binary through `SETTLE_CONFIG` once written.
    pub fn config_path(&self) -> PathBuf {
        self.home.path().join("config.toml")
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.config_path(), contents).expect("write config");
    }

    pub fn dir(&self) -> &Path {
        self.home.path()
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let config = self.config_path();
        let mut command = self.command(args);
        if config.exists() {
            command.env("SETTLE_CONFIG", config);
        }
        command.output().expect("run settle binary")
    }

    pub fn run_with_config_env(&self, config: &Path, args: &[&str]) -> Output {
        self.command(args)
            .env("SETTLE_CONFIG", config)
            .output()
            .expect("run settle binary")
    }

    // HOME points at the temp dir so `~/.settle/config.toml` is never the user's.
    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_settle"));
        command
            .args(args)
            .env("HOME", self.home.path())
            .env_remove("SETTLE_CONFIG")
            .env_remove("RUST_LOG");
        command
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
