//! # Configuration Management Module
//!
//! Loads and validates the TOML configuration for the learning service.
//!
//! ## Configuration Structure
//!
//! - [`AppConfig`] - Program name and description shown by the CLI
//! - [`StorageConfig`] - Where progress records are persisted
//! - [`ProgressionConfig`] - Optional catalog seed file
//! - [`LoggingConfig`] - Logging level and log file sinks
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hivlearn::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Progress database: {}", config.storage.progress_db_path().display());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [app]
//! name = "HIV/AIDS Awareness"
//! description = "Interactive learning modules"
//!
//! [storage]
//! data_dir = "./data"
//!
//! [progression]
//! catalog_file = "data/catalog.json"
//!
//! [logging]
//! level = "info"
//! file = "hivlearn.log"
//! ```
//!
//! The pass threshold is not configurable; it is the shared
//! [`PASS_THRESHOLD`](crate::progress::PASS_THRESHOLD) constant.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::progress::{load_catalog_from_json, ModuleCatalog};

const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Optional override for the Sled database path; defaults to `<data_dir>/progress`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

impl StorageConfig {
    pub fn progress_db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("progress"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProgressionConfig {
    /// JSON catalog seed. When unset the built-in five-module program is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_file: Option<String>,
}

impl ProgressionConfig {
    /// Build the module catalog this configuration points at.
    pub fn load_catalog(&self) -> Result<ModuleCatalog> {
        match &self.catalog_file {
            Some(path) => load_catalog_from_json(path)
                .map_err(|e| anyhow!("Failed to load catalog {}: {}", path, e)),
            None => Ok(ModuleCatalog::standard()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    /// Separate sink for records logged with target `security`.
    #[serde(default)]
    pub security_file: Option<String>,
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.level.to_ascii_lowercase().as_str() {
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config = Self::from_toml(&content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(anyhow!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }
        Ok(())
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                name: "HIV/AIDS Awareness".to_string(),
                description: "Interactive modules on HIV/AIDS prevention, treatment and stigma"
                    .to_string(),
            },
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                db_path: None,
            },
            progression: ProgressionConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("hivlearn.log".to_string()),
                security_file: None,
            },
        }
    }
}
