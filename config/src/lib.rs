//! Configuration loading for settle.
//!
//! The config file lives at `~/.settle/config.toml` unless `SETTLE_CONFIG`
//! points elsewhere:
//!
//! ```toml
//! [wait]
//! initial_interval_ms = 100
//! attempts_before_slowing = 20
//! timeout_ms = 60000
//!
//! [profiles.slow-service]
//! initial_interval_ms = 500
//! timeout_ms = 300000
//! ```
//!
//! Raw tables keep every field optional. [`SettleConfig::resolve`] layers
//! built-in defaults, then `[wait]`, then the selected profile, and hands back a
//! [`WaitConfig`].

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use settle_types::WaitConfig;
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "SETTLE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Syntax(#[from] toml::de::Error),
    #[error("unknown profile `{name}`")]
    UnknownProfile { name: String },
    #[error("invalid value for `{table}.{field}`{}: {reason}", in_file_suffix(.path.as_deref()))]
    InvalidValue {
        table: String,
        field: &'static str,
        reason: &'static str,
        path: Option<PathBuf>,
    },
}

fn in_file_suffix(path: Option<&Path>) -> String {
    path.map(|path| format!(" in {}", path.display()))
        .unwrap_or_default()
}

impl ConfigError {
    /// Config file this error refers to, when it came from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => Some(path),
            Self::InvalidValue { path, .. } => path.as_deref(),
            Self::Syntax(_) | Self::UnknownProfile { .. } => None,
        }
    }

    fn in_file(self, file: &Path) -> Self {
        match self {
            Self::InvalidValue {
                table,
                field,
                reason,
                path: None,
            } => Self::InvalidValue {
                table,
                field,
                reason,
                path: Some(file.to_path_buf()),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WaitTable {
    initial_interval_ms: Option<u64>,
    attempts_before_slowing: Option<u32>,
    timeout_ms: Option<u64>,
}

impl WaitTable {
    fn validate(&self, table: &str) -> Result<(), ConfigError> {
        if self.initial_interval_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                table: table.to_string(),
                field: "initial_interval_ms",
                reason: "must be greater than zero",
                path: None,
            });
        }
        Ok(())
    }

    fn apply(&self, mut config: WaitConfig) -> WaitConfig {
        if let Some(ms) = self.initial_interval_ms {
            config = config.with_initial_interval(Duration::from_millis(ms));
        }
        if let Some(attempts) = self.attempts_before_slowing {
            config = config.with_attempts_before_slowing(attempts);
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        config
    }
}

/// Parsed contents of a settle config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettleConfig {
    #[serde(default)]
    wait: WaitTable,
    #[serde(default)]
    profiles: BTreeMap<String, WaitTable>,
}

impl SettleConfig {
    /// Load the config from [`config_path`].
    ///
    /// A missing `~/.settle/config.toml` is not an error. A file named by
    /// `SETTLE_CONFIG` must exist.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        if let Some(path) = env_config_path() {
            return Self::load_from(&path).map(Some);
        }
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file found");
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        let config: Self = match toml::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        if let Err(err) = config.validate() {
            let err = err.in_file(path);
            tracing::warn!("Rejected config: {}", err);
            return Err(err);
        }
        tracing::debug!(
            path = %path.display(),
            profiles = config.profiles.len(),
            "Loaded config"
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.wait.validate("wait")?;
        for (name, table) in &self.profiles {
            table.validate(&format!("profiles.{name}"))?;
        }
        Ok(())
    }

    /// Resolve defaults, `[wait]`, and the named profile (if any) into a [`WaitConfig`].
    pub fn resolve(&self, profile: Option<&str>) -> Result<WaitConfig, ConfigError> {
        let config = self.wait.apply(WaitConfig::default());
        let Some(name) = profile else {
            return Ok(config);
        };
        let table = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
            })?;
        tracing::debug!(profile = name, "Applying wait profile");
        Ok(table.apply(config))
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

/// `$SETTLE_CONFIG` if set, otherwise `~/.settle/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    env_config_path().or_else(|| dirs::home_dir().map(|home| home.join(".settle").join("config.toml")))
}

fn env_config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_ENV_VAR)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}
