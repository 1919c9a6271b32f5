//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/amcp/config.toml` by default:
//!
//! ```toml
//! debug = false
//!
//! [server]
//! host = "playout-1.local"
//! port = 5250
//! timeout = 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use amcp_protocol::{DEFAULT_MAX_FRAME_BYTES, DEFAULT_PORT};

use crate::connection::ConnectionOptions;

/// Configuration for the amcp client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Server/connection settings.
    #[serde(default)]
    pub server: ServerSettings,
}

/// Server/connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host name or address of the AMCP server.
    pub host: String,

    /// AMCP port.
    pub port: u16,

    /// Connection and per-read timeout in seconds. 0 disables it.
    pub timeout: u64,

    /// Largest single response frame accepted, in bytes.
    pub max_frame_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            timeout: 5,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl ServerSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            timeout: self.timeout(),
            max_frame_bytes: self.max_frame_bytes,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("amcp")
    }
}
