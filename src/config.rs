//! Persisted application configuration.
//!
//! Settings live in a TOML file under the `.mammoguard` root. Every field has
//! a serde default so configs written by older builds keep loading.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;

/// Default filename used to store the app configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Prediction endpoint used when none is configured.
pub const DEFAULT_PREDICT_URL: &str =
    "https://wahab07-breast-cancer-app-backend.hf.space/mammography/predict_mammography";

/// Default client-side upload cap in bytes (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Aggregate application settings loaded from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceSettings,
}

/// Settings for the remote prediction service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSettings {
    /// Endpoint receiving the multipart image upload.
    #[serde(default = "default_predict_url")]
    pub predict_url: String,
    /// Uploads larger than this are rejected before any network activity.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            predict_url: default_predict_url(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_predict_url() -> String {
    DEFAULT_PREDICT_URL.to_string()
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

/// Errors raised while loading or persisting the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config directory could not be resolved or created.
    #[error(transparent)]
    AppDir(#[from] app_dirs::AppDirError),
    /// Failed to read the config file.
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse the config file.
    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to serialize the configuration.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Failed to write the config file.
    #[error("Failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Path of the config file inside the app root.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the configuration, falling back to defaults when no file exists.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    let path = config_path()?;
    if !path.is_file() {
        return Ok(AppConfig::default());
    }
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
}

/// Persist the configuration to the app root.
pub fn save(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_path()?;
    let raw = toml::to_string_pretty(config)?;
    std::fs::write(&path, raw).map_err(|source| ConfigError::Write { path, source })
}
