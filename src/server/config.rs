// src/server/config.rs
//! Configuration file parsing for the API server
//!
//! Supports TOML configuration files with the following sections:
//! - [server] - Bind address, CORS origins
//! - [storage] - Database path, media root, upload size limit
//! - [auth] - Password policy
//!
//! Every field has a default, so an empty file is a valid configuration.

use crate::server::ServerConfig;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub auth: AuthSection,
}

/// Server configuration section
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// API bind address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origins allowed to make cross-origin requests
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

/// Storage configuration section
#[derive(Debug, Deserialize)]
pub struct StorageSection {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Root directory for uploaded media
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    /// Maximum upload size (e.g., "10MB", "512KB")
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            media_root: default_media_root(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/recipe-api/recipe-api.db")
}

fn default_media_root() -> PathBuf {
    PathBuf::from("/var/lib/recipe-api/media")
}

fn default_max_upload_size() -> String {
    "10MB".to_string()
}

/// Authentication configuration section
#[derive(Debug, Deserialize)]
pub struct AuthSection {
    /// Minimum password length for new and changed passwords
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
        }
    }
}

fn default_min_password_length() -> usize {
    6
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.auth.min_password_length == 0 {
            bail!("auth.min_password_length must be at least 1");
        }

        if parse_size(&self.storage.max_upload_size)? == 0 {
            bail!("storage.max_upload_size must be greater than zero");
        }

        if self.storage.db_path.as_os_str().is_empty() {
            bail!("storage.db_path must not be empty");
        }

        Ok(())
    }

    /// Convert to the runtime server configuration
    pub fn to_server_config(&self) -> Result<ServerConfig> {
        Ok(ServerConfig {
            bind_addr: self.bind_addr()?,
            db_path: self.storage.db_path.clone(),
            media_root: self.storage.media_root.clone(),
            max_upload_bytes: usize::try_from(parse_size(&self.storage.max_upload_size)?)
                .context("storage.max_upload_size does not fit in memory")?,
            min_password_length: self.auth.min_password_length,
            cors_allowed_origins: self.server.cors_allowed_origins.clone(),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind))
    }
}

/// Parse a human-readable size string (e.g., "10MB", "512KB", "1GB")
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("GB") {
        (n, 1024u64 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024u64 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024u64)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1u64)
    } else {
        // Assume bytes
        (s.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid size number: {}", num_str))?;

    if num < 0.0 {
        bail!("Size cannot be negative: {}", s);
    }

    Ok((num * multiplier as f64) as u64)
}
