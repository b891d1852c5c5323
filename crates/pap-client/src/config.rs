//! Client configuration.
//!
//! Read once at start-up from a JSON file compatible with the legacy
//! `clientConfig.json` (`{"dbIP": "...", "dbPort": 5000}`), then
//! overridden from the environment. Every setting has a default so the
//! client starts with no file at all.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use pap_net::{ConnectionOptions, Framing};
use pap_shared::constants::{APP_NAME, DEFAULT_HOST, DEFAULT_PORT};

/// Name of the configuration file in every searched directory.
pub const CONFIG_FILE_NAME: &str = "clientConfig.json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid port: {0}")]
    InvalidPort(String),
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server host name or address.
    /// File: `dbIP`, env: `PAP_SERVER_HOST`
    pub host: String,

    /// File: `dbPort` (number or numeric string), env: `PAP_SERVER_PORT`
    pub port: u16,

    /// File: `framing`, env: `PAP_FRAMING`
    pub framing: Framing,

    /// Per-request bound; `None` waits forever.
    /// File: `request_timeout_secs` (0 = none), env: `PAP_REQUEST_TIMEOUT_SECS`
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            framing: Framing::default(),
            request_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

/// On-disk layout. Unknown keys are ignored.
#[derive(Deserialize)]
struct ConfigFile {
    #[serde(rename = "dbIP")]
    db_ip: Option<String>,
    #[serde(rename = "dbPort")]
    db_port: Option<PortValue>,
    framing: Option<Framing>,
    request_timeout_secs: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

impl ClientConfig {
    /// `host:port` for [`tokio::net::TcpStream::connect`].
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            framing: self.framing,
            timeout: self.request_timeout,
        }
    }

    /// Parse a configuration file body; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(text)?;
        let mut config = Self::default();

        if let Some(host) = file.db_ip {
            config.host = host;
        }
        match file.db_port {
            Some(PortValue::Number(port)) => config.port = port,
            Some(PortValue::Text(text)) => {
                config.port = text
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidPort(text.clone()))?;
            }
            None => {}
        }
        if let Some(framing) = file.framing {
            config.framing = framing;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = timeout_from_secs(secs);
        }
        Ok(config)
    }

    /// Read the first configuration file found, then apply environment
    /// overrides.
    ///
    /// Search order: `explicit`, then `./clientConfig.json`, then the
    /// platform config directory. An explicit path that cannot be read is
    /// an error; the other locations are simply skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match candidate_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    warn!("No {CONFIG_FILE_NAME} found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        info!(path = %path.display(), addr = %config.addr(), "Configuration loaded");
        Ok(config)
    }

    /// Apply `PAP_*` overrides from `lookup`. Invalid values are logged
    /// and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("PAP_SERVER_HOST") {
            self.host = host;
        }

        if let Some(val) = lookup("PAP_SERVER_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => warn!(value = %val, "Invalid PAP_SERVER_PORT, ignoring"),
            }
        }

        if let Some(val) = lookup("PAP_FRAMING") {
            match val.parse::<Framing>() {
                Ok(framing) => self.framing = framing,
                Err(_) => warn!(value = %val, "Invalid PAP_FRAMING, ignoring"),
            }
        }

        if let Some(val) = lookup("PAP_REQUEST_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => self.request_timeout = timeout_from_secs(secs),
                Err(_) => warn!(value = %val, "Invalid PAP_REQUEST_TIMEOUT_SECS, ignoring"),
            }
        }
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dirs) = ProjectDirs::from("org", "peopleandplaces", APP_NAME) {
        paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }
    paths
}
