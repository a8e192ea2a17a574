//! Built-in conditions for the command line.
//!
//! Every probe is a synchronous check returning [`ConditionResult`]. "Not yet"
//! outcomes (missing file, refused connection, non-zero exit) are `Pending`;
//! only failures that no amount of waiting can fix are errors.
//!
//! Network and command probes take a per-check limit. A connect or a command
//! that outlives it counts as `Pending`, so one check cannot hold the polling
//! loop far past its timeout. Host name resolution is the exception: it goes
//! through the system resolver and is not bounded.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use settle_core::ConditionResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to inspect {}: {source}", .path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid address `{address}`: {source}")]
    Address {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

const COMMAND_POLL_STEP: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Done once the path exists.
    Exists(PathBuf),
    /// Done once the path no longer exists.
    Absent(PathBuf),
    /// Done once a TCP connection to `host:port` succeeds.
    Tcp(String),
    /// Done once the command exits successfully. Never empty.
    Command(Vec<String>),
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists(path) => write!(f, "exists {}", path.display()),
            Self::Absent(path) => write!(f, "absent {}", path.display()),
            Self::Tcp(address) => write!(f, "tcp {address}"),
            Self::Command(argv) => write!(f, "cmd {}", argv.join(" ")),
        }
    }
}

impl Probe {
    /// Run the probe once.
    ///
    /// `limit` bounds the TCP connects of one check (across every resolved
    /// address) and how long a command may run before it is killed.
    pub fn check(&self, limit: Duration) -> Result<ConditionResult<String>, ProbeError> {
        match self {
            Self::Exists(path) => Ok(path_exists(path)?.then(|| path.display().to_string()).into()),
            Self::Absent(path) => {
                Ok((!path_exists(path)?).then(|| path.display().to_string()).into())
            }
            Self::Tcp(address) => check_tcp(address, limit),
            Self::Command(argv) => check_command(argv, limit),
        }
    }
}

fn path_exists(path: &Path) -> Result<bool, ProbeError> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ProbeError::Inspect {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn check_tcp(address: &str, limit: Duration) -> Result<ConditionResult<String>, ProbeError> {
    let addrs: Vec<SocketAddr> = match address.to_socket_addrs() {
        Ok(addrs) => addrs.collect(),
        // Malformed input (missing port, bad port) never becomes valid.
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => {
            return Err(ProbeError::Address {
                address: address.to_string(),
                source: e,
            });
        }
        // Name lookup failures are often transient (service not registered yet).
        Err(e) => {
            tracing::debug!(address, error = %e, "Address did not resolve");
            return Ok(ConditionResult::Pending);
        }
    };

    let deadline = Instant::now() + limit;
    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            tracing::trace!(address, "Connect budget spent");
            break;
        }
        match TcpStream::connect_timeout(&addr, remaining) {
            Ok(_) => return Ok(ConditionResult::Done(addr.to_string())),
            Err(e) => tracing::trace!(%addr, error = %e, "Connect attempt failed"),
        }
    }
    Ok(ConditionResult::Pending)
}

fn check_command(argv: &[String], limit: Duration) -> Result<ConditionResult<String>, ProbeError> {
    let Some((program, args)) = argv.split_first() else {
        return Ok(ConditionResult::Pending);
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ProbeError::Spawn {
            program: program.clone(),
            source: e,
        })?;

    // Drain stdout on its own thread so a chatty command cannot stall on a full pipe.
    let (tx, rx) = mpsc::channel();
    if let Some(mut stdout) = child.stdout.take() {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
    }

    let deadline = Instant::now() + limit;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() < deadline => thread::sleep(COMMAND_POLL_STEP),
            Ok(None) => {
                tracing::debug!(
                    program = %program,
                    limit_ms = limit.as_millis(),
                    "Command still running at check limit, killing it"
                );
                reap(&mut child);
                return Ok(ConditionResult::Pending);
            }
            Err(e) => {
                reap(&mut child);
                return Err(ProbeError::Wait {
                    program: program.clone(),
                    source: e,
                });
            }
        }
    };

    if status.success() {
        // A background grandchild may keep the pipe open; take what arrived by the deadline.
        let wait = deadline
            .saturating_duration_since(Instant::now())
            .max(COMMAND_POLL_STEP);
        let stdout = rx.recv_timeout(wait).unwrap_or_default();
        let stdout = String::from_utf8_lossy(&stdout).trim().to_string();
        return Ok(ConditionResult::Done(stdout));
    }
    tracing::trace!(program = %program, status = %status, "Command not successful yet");
    Ok(ConditionResult::Pending)
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
