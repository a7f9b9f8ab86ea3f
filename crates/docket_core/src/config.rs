//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve database, snapshot and logging locations.
//! - Keep resolution testable through an injected variable lookup.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - `log_dir` is always absolute; relative values are joined to `base_dir`.

use crate::backup::archiver::DEFAULT_SNAPSHOT_FILE;
use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "DOCKET_DB_PATH";
pub const SNAPSHOT_PATH_ENV: &str = "DOCKET_SNAPSHOT_PATH";
pub const LOG_DIR_ENV: &str = "DOCKET_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "DOCKET_LOG_LEVEL";

pub const DEFAULT_DB_FILE: &str = "notes.db";
const DEFAULT_LOG_DIR: &str = "logs";

/// Configuration failure.
#[derive(Debug)]
pub enum ConfigError {
    /// Working directory could not be determined.
    CurrentDir(std::io::Error),
    /// Log level variable holds an unsupported value.
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CurrentDir(err) => write!(f, "cannot resolve working directory: {err}"),
            Self::InvalidLogLevel(message) => write!(f, "{LOG_LEVEL_ENV}: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CurrentDir(err) => Some(err),
            Self::InvalidLogLevel(_) => None,
        }
    }
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: &'static str,
}

impl AppConfig {
    /// Resolves configuration from process environment and working directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_dir = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Self::from_lookup(&base_dir, |key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, anchoring relative log
    /// directories at `base_dir`.
    pub fn from_lookup(
        base_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path =
            read(DB_PATH_ENV).map_or_else(|| PathBuf::from(DEFAULT_DB_FILE), PathBuf::from);
        let snapshot_path = read(SNAPSHOT_PATH_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE), PathBuf::from);

        let log_dir =
            read(LOG_DIR_ENV).map_or_else(|| PathBuf::from(DEFAULT_LOG_DIR), PathBuf::from);
        let log_dir = if log_dir.is_absolute() {
            log_dir
        } else {
            base_dir.join(log_dir)
        };

        let log_level = match read(LOG_LEVEL_ENV) {
            Some(raw) => normalize_level(&raw).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        Ok(Self {
            db_path,
            snapshot_path,
            log_dir,
            log_level,
        })
    }
}
