use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::poller::{ErrorPolicy, PollPolicy};

pub const ENV_PREFIX: &str = "AUDIT_WATCH_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub directory: DirectoryEndpoint,
    pub token: Option<String>,
    pub token_file: Option<PathBuf>,
    pub cookie: Option<String>,
    pub accept_invalid_certs: bool,
    pub request_timeout_secs: u64,
    pub poll: PollConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "https://localhost:8000".to_string(),
            directory: DirectoryEndpoint::Current,
            token: None,
            token_file: None,
            cookie: None,
            accept_invalid_certs: false,
            request_timeout_secs: 10,
            poll: PollConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Which node directory route the server exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryEndpoint {
    #[default]
    Current,
    Legacy,
}

impl DirectoryEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Current => "/getNodeList",
            Self::Legacy => "/getNodes",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    /// 0 polls forever.
    pub max_attempts: u32,
    pub max_backoff_ms: u64,
    pub on_error: ErrorPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: 150,
            max_backoff_ms: 30_000,
            on_error: ErrorPolicy::Retry,
        }
    }
}

impl PollConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            max_attempts: (self.max_attempts > 0).then_some(self.max_attempts),
            max_backoff: Duration::from_millis(self.max_backoff_ms.max(self.interval_ms)),
            on_error: self.on_error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("audit-watch").join("config.yaml"))
    }

    /// Defaults, then the YAML file (if present), then `AUDIT_WATCH_*` env vars.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

/// Load from an explicit path, or from the default location.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file {} does not exist", p.display());
            }
            p.to_path_buf()
        }
        None => Config::path()?,
    };
    Config::figment(&path)
        .extract()
        .with_context(|| format!("loading configuration from {}", path.display()))
}
