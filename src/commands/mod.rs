pub mod dashboard;
pub mod nodes;
pub mod results;

use std::path::PathBuf;

use anyhow::{bail, Result};
use audit_watch::config::{self, Config, DirectoryEndpoint};
use audit_watch::token::{self, Token};
use clap::Args;

/// Connection flags shared by every subcommand. Each one overrides the
/// corresponding config value.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectArgs {
    /// Audit server base URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Path to config file (default: ~/.config/audit-watch/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token for result requests
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// File containing the bearer token
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    /// Cookie string to take the `token` cookie from
    #[arg(long, global = true)]
    pub cookie: Option<String>,

    /// Use the legacy /getNodes directory route
    #[arg(long, global = true)]
    pub legacy: bool,

    /// Accept self-signed server certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Log level (overrides config)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl ConnectArgs {
    pub fn load_config(&self) -> Result<Config> {
        let mut cfg = config::load(self.config.as_deref())?;

        if let Some(server) = &self.server {
            cfg.server_url = server.clone();
        }
        if let Some(token) = &self.token {
            cfg.token = Some(token.clone());
        }
        if let Some(path) = &self.token_file {
            cfg.token_file = Some(path.clone());
        }
        if let Some(cookie) = &self.cookie {
            cfg.cookie = Some(cookie.clone());
        }
        if self.legacy {
            cfg.directory = DirectoryEndpoint::Legacy;
        }
        if self.insecure {
            cfg.accept_invalid_certs = true;
        }
        if let Some(level) = &self.log_level {
            cfg.log.level = level.clone();
        }
        if self.log_json {
            cfg.log.json = true;
        }
        Ok(cfg)
    }
}

pub fn resolve_token(cfg: &Config) -> Result<Option<Token>> {
    token::resolve(
        cfg.token.as_deref(),
        cfg.token_file.as_deref(),
        cfg.cookie.as_deref(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            other => bail!("unknown format '{}': expected table, json or yaml", other),
        }
    }
}

/// Print structured output. Callers handle `Table` themselves.
pub fn print_structured<T: serde::Serialize>(format: OutputFormat, data: &T) -> Result<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
        _ => println!("{}", serde_json::to_string_pretty(data)?),
    }
    Ok(())
}
