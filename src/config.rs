// src/config.rs

//! Runtime configuration
//!
//! Loaded from an optional TOML file. Every field has a default so an empty
//! or missing file yields a working configuration; CLI flags override
//! individual values afterwards.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// AUR RPC settings
    #[serde(default)]
    pub aur: AurSection,

    /// Local pacman database settings
    #[serde(default)]
    pub pacman: PacmanSection,
}

/// AUR RPC section
#[derive(Debug, Clone, Deserialize)]
pub struct AurSection {
    /// Metadata service host
    #[serde(default = "default_host")]
    pub host: String,

    /// TLS port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Value of the `User-Agent` header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request deadline in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum names per info request
    #[serde(default = "default_info_batch_size")]
    pub info_batch_size: usize,

    /// Maximum search requests in flight during catalog enumeration
    #[serde(default = "default_catalog_concurrency")]
    pub catalog_concurrency: usize,
}

impl Default for AurSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            info_batch_size: default_info_batch_size(),
            catalog_concurrency: default_catalog_concurrency(),
        }
    }
}

impl AurSection {
    /// Per-request deadline as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Pacman section
#[derive(Debug, Clone, Deserialize)]
pub struct PacmanSection {
    /// Root of the pacman database (contains `local/` and `sync/`)
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// pacman.conf, used for repository order
    #[serde(default = "default_pacman_conf")]
    pub config_file: PathBuf,
}

impl Default for PacmanSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            config_file: default_pacman_conf(),
        }
    }
}

fn default_host() -> String {
    "aur.archlinux.org".to_string()
}

fn default_port() -> u16 {
    443
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_info_batch_size() -> usize {
    100
}

fn default_catalog_concurrency() -> usize {
    64
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/pacman")
}

fn default_pacman_conf() -> PathBuf {
    PathBuf::from("/etc/pacman.conf")
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// A missing file is not an error and yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.aur.host.is_empty() {
            return Err(Error::Config("aur.host must not be empty".to_string()));
        }
        if self.aur.info_batch_size == 0 {
            return Err(Error::Config("aur.info_batch_size must be at least 1".to_string()));
        }
        if self.aur.info_batch_size > crate::aur::INFO_BATCH_SIZE {
            return Err(Error::Config(format!(
                "aur.info_batch_size must be at most {}",
                crate::aur::INFO_BATCH_SIZE
            )));
        }
        if self.aur.catalog_concurrency == 0 {
            return Err(Error::Config(
                "aur.catalog_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
