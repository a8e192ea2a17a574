//! settle CLI - wait for one built-in probe to report done.
//!
//! ```text
//! settle [OPTIONS] exists <PATH>
//! settle [OPTIONS] absent <PATH>
//! settle [OPTIONS] tcp <HOST:PORT>
//! settle [OPTIONS] cmd -- <PROGRAM> [ARGS]...
//! ```
//!
//! Wait settings resolve as: flags, then `--profile`, then `[wait]` from the
//! config file, then built-in defaults. The probe value is printed to stdout on
//! success; logs go to stderr.
//!
//! Exit codes: 0 done, 1 timeout, 2 probe error, 3 configuration or usage error.

mod probe;

use std::io::stderr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, value_parser};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use settle_config::SettleConfig;
use settle_core::{WaitConfig, WaitErrorKind, wait_for_named};

use crate::probe::Probe;

const EXIT_TIMEOUT: u8 = 1;
const EXIT_PROBE_ERROR: u8 = 2;
const EXIT_CONFIG: u8 = 3;

// Bounds for how long one probe check may run.
const MIN_CHECK_LIMIT: Duration = Duration::from_millis(50);
const MAX_CHECK_LIMIT: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "settle", version, about = "Wait for a condition, backing off between checks")]
struct Cli {
    /// Interval between the first checks, in milliseconds.
    #[arg(long, value_name = "MS", value_parser = value_parser!(u64).range(1..))]
    interval_ms: Option<u64>,
    /// Pending checks at one interval before the interval doubles.
    #[arg(long, value_name = "N")]
    attempts_before_slowing: Option<u32>,
    /// Give up after this many milliseconds.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
    /// Named `[profiles.NAME]` table from the config file.
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,
    /// Config file to use instead of `$SETTLE_CONFIG` or `~/.settle/config.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Do not print the probe value on success.
    #[arg(short, long)]
    quiet: bool,
    #[command(subcommand)]
    probe: ProbeCommand,
}

#[derive(Debug, Subcommand)]
enum ProbeCommand {
    /// Wait until a path exists.
    Exists { path: PathBuf },
    /// Wait until a path no longer exists.
    Absent { path: PathBuf },
    /// Wait until a TCP connection succeeds.
    Tcp {
        #[arg(value_name = "HOST:PORT")]
        address: String,
    },
    /// Wait until a command exits successfully.
    Cmd {
        #[arg(
            value_name = "PROGRAM",
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        argv: Vec<String>,
    },
}

impl From<ProbeCommand> for Probe {
    fn from(command: ProbeCommand) -> Self {
        match command {
            ProbeCommand::Exists { path } => Probe::Exists(path),
            ProbeCommand::Absent { path } => Probe::Absent(path),
            ProbeCommand::Tcp { address } => Probe::Tcp(address),
            ProbeCommand::Cmd { argv } => Probe::Command(argv),
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    // Stdout carries only the probe value.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(stderr).with_target(false))
        .with(env_filter)
        .init();
}

fn resolve_wait_config(cli: &Cli) -> Result<WaitConfig> {
    let file = match &cli.config {
        Some(path) => Some(SettleConfig::load_from(path)?),
        None => SettleConfig::load()?,
    };

    let mut config = match (&file, cli.profile.as_deref()) {
        (Some(file), profile) => file.resolve(profile)?,
        (None, Some(name)) => {
            bail!("profile `{name}` requested but no config file was found")
        }
        (None, None) => WaitConfig::default(),
    };

    if let Some(ms) = cli.interval_ms {
        config = config.with_initial_interval(Duration::from_millis(ms));
    }
    if let Some(attempts) = cli.attempts_before_slowing {
        config = config.with_attempts_before_slowing(attempts);
    }
    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_wait_config(&cli).context("failed to resolve wait settings")?;
    let probe = Probe::from(cli.probe);
    let label = probe.to_string();
    let check_limit = config
        .initial_interval()
        .clamp(MIN_CHECK_LIMIT, MAX_CHECK_LIMIT);

    tracing::debug!(
        probe = %label,
        interval_ms = config.initial_interval().as_millis(),
        attempts_before_slowing = config.attempts_before_slowing(),
        timeout_ms = config.timeout().as_millis(),
        "Waiting"
    );

    match wait_for_named(&label, || probe.check(check_limit), &config).await {
        Ok(value) => {
            if !cli.quiet {
                println!("{value}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("settle: {err}");
            let code = match err.kind() {
                WaitErrorKind::Timeout => EXIT_TIMEOUT,
                WaitErrorKind::Evaluation => EXIT_PROBE_ERROR,
            };
            Ok(ExitCode::from(code))
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EXIT_CONFIG)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("settle: {err:#}");
            ExitCode::from(EXIT_CONFIG)
        }
    }
}
