//! Agent configuration: YAML file, then environment overrides.
//!
//! ```yaml
//! iface: eth0
//! poll_interval_sec: 1.0
//! output:
//!   path: /var/log/netdiag/events.ndjson
//! ```
//!
//! `NETDIAG_IFACE`, `NETDIAG_POLL_INTERVAL` and `NETDIAG_OUTPUT_PATH`
//! override the file.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const ENV_IFACE: &str = "NETDIAG_IFACE";
pub const ENV_POLL_INTERVAL: &str = "NETDIAG_POLL_INTERVAL";
pub const ENV_OUTPUT_PATH: &str = "NETDIAG_OUTPUT_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./events.ndjson"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Interface whose sysfs statistics are sampled.
    pub iface: String,
    /// Seconds between samples.
    pub poll_interval_sec: f64,
    pub output: OutputConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            iface: "eth0".to_string(),
            poll_interval_sec: 1.0,
            output: OutputConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Parses YAML. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Loads `path`; a missing file falls back to the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from `lookup` (normally the process environment).
    ///
    /// An unparsable interval is reported and ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(iface) = lookup(ENV_IFACE) {
            debug!("{} overrides iface: {}", ENV_IFACE, iface);
            self.iface = iface;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL) {
            match raw.trim().parse::<f64>() {
                Ok(v) => self.poll_interval_sec = v,
                Err(_) => warn!("Invalid {} value: {}", ENV_POLL_INTERVAL, raw),
            }
        }
        if let Some(path) = lookup(ENV_OUTPUT_PATH) {
            self.output.path = PathBuf::from(path);
        }
    }

    /// Applies overrides from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Sampling interval as a `Duration`. Must be positive and representable.
    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        let secs = self.poll_interval_sec;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_sec must be positive, got {secs}"
            )));
        }
        Duration::try_from_secs_f64(secs).map_err(|e| {
            ConfigError::Invalid(format!("poll_interval_sec {secs} out of range: {e}"))
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iface.trim().is_empty() {
            return Err(ConfigError::Invalid("iface must not be empty".into()));
        }
        self.poll_interval().map(|_| ())
    }
}
