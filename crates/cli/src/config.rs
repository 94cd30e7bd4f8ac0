//! Workbench configuration.
//!
//! Resolution order (highest priority first):
//! 1. Environment variables (`CMC_KB_PATH`, `CMC_USERS_PATH`)
//! 2. Config file (`--config`, `CMC_CONFIG`, or `cmc.toml` in the working directory)
//! 3. Compiled defaults

use cmc_auth::DEFAULT_USERS_PATH;
use cmc_extractor::ExtractorConfig;
use cmc_knowledge_base::DEFAULT_KNOWLEDGE_BASE_PATH;
use cmc_report::{LayoutStrategy, DEFAULT_REPORT_TITLE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "cmc.toml";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
pub const DEFAULT_SESSION_IDLE_MINUTES: u64 = 8 * 60;

pub const CONFIG_ENV: &str = "CMC_CONFIG";
pub const KB_PATH_ENV: &str = "CMC_KB_PATH";
pub const USERS_PATH_ENV: &str = "CMC_USERS_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid config value for {field}: {message}")]
    Validation { field: &'static str, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub layout: LayoutStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub knowledge_base_path: PathBuf,
    pub users_path: PathBuf,
    pub bind: String,
    pub report_title: String,
    /// Minutes a login session may sit unused before it expires.
    pub session_idle_minutes: u64,
    pub extractor: ExtractorConfig,
    pub report: ReportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            knowledge_base_path: PathBuf::from(DEFAULT_KNOWLEDGE_BASE_PATH),
            users_path: PathBuf::from(DEFAULT_USERS_PATH),
            bind: DEFAULT_BIND.to_string(),
            report_title: DEFAULT_REPORT_TITLE.to_string(),
            session_idle_minutes: DEFAULT_SESSION_IDLE_MINUTES,
            extractor: ExtractorConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `explicit` (or `CMC_CONFIG`), falling back to `cmc.toml`.
    ///
    /// A named file must exist; a missing default file means compiled defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match named {
            Some(path) => Self::from_file(&path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(KB_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.knowledge_base_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(USERS_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.users_path = PathBuf::from(path);
        }
    }

    /// Session idle timeout, or `None` when it is zero or overflows.
    pub fn session_idle(&self) -> Option<Duration> {
        self.session_idle_minutes
            .checked_mul(60)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.knowledge_base_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "knowledge_base_path",
                message: "must not be empty".to_string(),
            });
        }
        if self.users_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "users_path",
                message: "must not be empty".to_string(),
            });
        }
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "bind",
                message: "must not be empty".to_string(),
            });
        }
        if self.session_idle_minutes == 0 {
            return Err(ConfigError::Validation {
                field: "session_idle_minutes",
                message: "must be at least 1".to_string(),
            });
        }
        self.extractor
            .validate()
            .map_err(|message| ConfigError::Validation {
                field: "extractor",
                message,
            })
    }
}
