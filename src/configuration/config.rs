use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::{debug, info};
use serde::Deserialize;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Application configuration structure that defines all runtime parameters.
///
/// Values come from an optional TOML file and are then overridden by
/// command-line flags (see [`CliArgs`]). Missing keys keep their defaults.
///
/// # Examples
///
/// ```
/// use clinic_desk::configuration::Config;
///
/// let config = Config::from_toml_str("web_ui_port = 9000").unwrap();
/// assert_eq!(config.web_ui_port, 9000);
/// assert_eq!(config.public_base_url(), "http://127.0.0.1:9000");
/// ```
///
/// # Fields Overview
///
/// - `storage_backend`: `file` or `memory`
/// - `storage_path`: directory of the file backend; when unset the backend falls back to
/// `CLINIC_STORAGE_DIR`, then `./clinic-data`
/// - `bind_address`: IP address the web interface listens on
/// - `web_ui_port`: port of the web interface, must not be 0
/// - `public_base_url`: address patients reach the registration page at; defaults to
/// the bind address and port
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub storage_path: Option<PathBuf>,
    pub bind_address: String,
    pub web_ui_port: u16,
    pub public_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::File,
            storage_path: None,
            bind_address: String::from("127.0.0.1"),
            web_ui_port: 8080,
            public_base_url: None,
        }
    }
}

impl Config {
    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_ip()?;
        if self.web_ui_port == 0 {
            return Err(ConfigError::BadPort(String::from(
                "web_ui_port must be between 1 and 65535",
            )));
        }
        Ok(())
    }

    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|_| ConfigError::BadIPFormatting(self.bind_address.clone()))
    }

    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.bind_address, self.web_ui_port),
        }
    }
}

/// Command-line interface of the `clinic-desk` binary.
///
/// Every flag overrides the matching key of the configuration file.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "clinic-desk")]
#[command(version)]
#[command(about = "Clinic front desk: patient registration, doctor queue and medical records")]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(short, long, env = "CLINIC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum)]
    pub storage_backend: Option<StorageBackend>,

    /// Directory of the file storage backend
    #[arg(long)]
    pub storage_path: Option<PathBuf>,

    /// IP address the web interface binds to
    #[arg(long)]
    pub bind_address: Option<String>,

    /// Port of the web interface
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Public address of the web interface, used in the registration link
    #[arg(long)]
    pub public_base_url: Option<String>,
}

impl CliArgs {
    /// Loads the file named by `--config` (defaults otherwise) and applies the flags.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let base = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => {
                debug!("No configuration file given, using defaults");
                Config::default()
            }
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, mut config: Config) -> Config {
        if let Some(backend) = self.storage_backend {
            config.storage_backend = backend;
        }
        if let Some(path) = &self.storage_path {
            config.storage_path = Some(path.clone());
        }
        if let Some(address) = &self.bind_address {
            config.bind_address = address.clone();
        }
        if let Some(port) = self.port {
            config.web_ui_port = port;
        }
        if let Some(url) = &self.public_base_url {
            config.public_base_url = Some(url.clone());
        }
        config
    }
}
