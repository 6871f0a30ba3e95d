//! Application configuration.
//!
//! Read from `HOMEBONES_*` environment variables; every value has a default.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};
use crate::store::DEFAULT_HOME_NAME;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app_name: String,
    /// Directory for local storage
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Default level when `RUST_LOG` is unset
    pub log_level: String,
    /// Name given to the home created by `ensure_home`
    pub default_home_name: String,
    /// Listen address of the health probe
    pub health_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "HomeBones".to_string(),
            data_dir: PathBuf::from(".homebones"),
            log_dir: PathBuf::from(".homebones/logs"),
            log_level: "info".to_string(),
            default_home_name: DEFAULT_HOME_NAME.to_string(),
            health_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl Config {
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable source; unset variables keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DomainResult<Self> {
        let mut config = Config::default();
        if let Some(v) = lookup("HOMEBONES_APP_NAME") {
            config.app_name = v;
        }
        if let Some(v) = lookup("HOMEBONES_DATA_DIR") {
            config.log_dir = PathBuf::from(&v).join("logs");
            config.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("HOMEBONES_LOG_DIR") {
            config.log_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("HOMEBONES_LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("HOMEBONES_DEFAULT_HOME_NAME") {
            if v.trim().is_empty() {
                return Err(DomainError::InvalidInput(
                    "HOMEBONES_DEFAULT_HOME_NAME must not be empty".to_string(),
                ));
            }
            config.default_home_name = v;
        }
        if let Some(v) = lookup("HOMEBONES_HEALTH_ADDR") {
            config.health_addr = v
                .parse()
                .map_err(|e| DomainError::InvalidInput(format!("HOMEBONES_HEALTH_ADDR '{v}': {e}")))?;
        }
        Ok(config)
    }

    /// File backing local key/value storage
    pub fn local_storage_path(&self) -> PathBuf {
        self.data_dir.join("local_storage.json")
    }
}
