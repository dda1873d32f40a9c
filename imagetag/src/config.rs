// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::backend::UploadPolicy;
use crate::backend::upload::DEFAULT_ALLOWED_MIME_TYPES;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const BACKEND_URL_ENV: &str = "IMAGETAG_BACKEND_URL";

/// Where the runtime configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No config file; backend URL from `IMAGETAG_BACKEND_URL`.
    Environment,
    Defaults,
}

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub timeout_seconds: u64, // 0 keeps the transport default
    #[serde(default = "default_list_page_size")]
    pub list_page_size: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            collection: default_collection(),
            timeout_seconds: 0,
            list_page_size: default_list_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8090".to_string()
}

fn default_collection() -> String {
    "images".to_string()
}

fn default_list_page_size() -> u32 {
    500
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    #[serde(default = "default_record_id")]
    pub default_record_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_record_id: default_record_id(),
        }
    }
}

fn default_record_id() -> String {
    "840958894677311".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64, // 0 means unlimited
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

fn default_max_file_size_mb() -> u64 {
    10
}

fn default_allowed_mime_types() -> Vec<String> {
    DEFAULT_ALLOWED_MIME_TYPES
        .iter()
        .map(|mime| mime.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&config_content).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Loads and validates configuration at startup. Nothing should talk to
    /// the backend when this fails.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load(root)?.validate()
    }

    /// Uses `config.yaml` when the root has one, otherwise defaults with the
    /// backend URL taken from the environment if set. Runs before logging is
    /// installed, so the caller reports the returned source.
    pub fn load_for_runtime(root: &Path) -> Result<(ValidatedConfig, ConfigSource), ConfigError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            let config = Self::load_and_validate(root)?;
            return Ok((config, ConfigSource::File(config_path)));
        }
        let (config, source) = Self::fallback(std::env::var(BACKEND_URL_ENV).ok());
        Ok((config.validate()?, source))
    }

    fn fallback(backend_url: Option<String>) -> (Config, ConfigSource) {
        let mut config = Config::default();
        match backend_url {
            Some(url) => {
                config.backend.base_url = url;
                (config, ConfigSource::Environment)
            }
            None => (config, ConfigSource::Defaults),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<ValidatedConfig, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::LoadError(format!("Failed to parse config: {}", e)))?;
        config.validate()
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let mut backend = self.backend;
        Self::validate_backend(&mut backend)?;
        Self::validate_session(&self.session)?;
        Self::validate_upload(&self.upload)?;
        Self::validate_logging(&self.logging)?;

        Ok(ValidatedConfig {
            backend,
            session: self.session,
            upload: self.upload,
            logging: self.logging,
        })
    }

    fn validate_backend(backend: &mut BackendConfig) -> Result<(), ConfigError> {
        let url = backend.base_url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.base_url cannot be empty".to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "backend.base_url must start with http:// or https://, got: {}",
                url
            )));
        }
        backend.base_url = url;

        if backend.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.collection cannot be empty".to_string(),
            ));
        }

        if !(1..=1000).contains(&backend.list_page_size) {
            return Err(ConfigError::ValidationError(format!(
                "backend.list_page_size must be between 1 and 1000, got: {}",
                backend.list_page_size
            )));
        }

        Ok(())
    }

    fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
        if session.default_record_id != session.default_record_id.trim() {
            return Err(ConfigError::ValidationError(
                "session.default_record_id must not have surrounding whitespace".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_upload(upload: &UploadConfig) -> Result<(), ConfigError> {
        if upload.allowed_mime_types.is_empty() {
            return Err(ConfigError::ValidationError(
                "upload.allowed_mime_types cannot be empty".to_string(),
            ));
        }
        if let Some(mime) = upload
            .allowed_mime_types
            .iter()
            .find(|mime| !mime.to_ascii_lowercase().starts_with("image/"))
        {
            return Err(ConfigError::ValidationError(format!(
                "upload.allowed_mime_types only accepts image types, got: {}",
                mime
            )));
        }
        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        if parse_level(&logging.level).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of trace, debug, info, warn, error, got: {}",
                logging.level
            )));
        }
        Ok(())
    }
}

impl ValidatedConfig {
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_file_size_mb: self.upload.max_file_size_mb,
            allowed_mime_types: self.upload.allowed_mime_types.clone(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        parse_level(&self.logging.level).unwrap_or(LevelFilter::Info)
    }
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.to_lowercase().as_str() {
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        _ => None,
    }
}
