//! Configuration file handling

use log::info;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::device::{Elm327Options, Protocol};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error on `{0:?}`: `{1}`")]
    Io(PathBuf, std::io::Error),
    #[error("Invalid configuration: `{0}`")]
    Parse(#[from] toml::de::Error),
    #[error("Could not serialize configuration: `{0}`")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub logging: LoggingConfig,
    pub gui: GuiConfig,
}

/// How to reach the OBD-II adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Serial port of the adapter, such as `/dev/rfcomm0`; scan all ports when unset
    pub port: Option<String>,

    /// Baud rate of the adapter; probe the usual rates when unset
    pub baud_rate: Option<u32>,

    pub protocol: Protocol,

    /// Longest wait for one reply from the adapter
    pub timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: None,
            protocol: Protocol::Auto,
            timeout_ms: 5000,
        }
    }
}

impl ConnectionConfig {
    pub fn elm327_options(&self) -> Elm327Options {
        Elm327Options {
            baud_rate: self.baud_rate,
            protocol: self.protocol,
            timeout: Duration::from_millis(self.timeout_ms),
            ..Elm327Options::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file, written next to the console output
    pub file: PathBuf,

    /// Default level filter, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("./logs.log"),
            level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            width: 360,
            height: 480,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_owned(), e))?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(path.to_owned(), e))?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load the configuration, writing the defaults first if the file does not exist
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::Io(parent.to_owned(), e))?;
            }
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("engine-hours"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
