//! Client configuration.
//!
//! Sources, first match wins: an explicit file, `SIDDON_CONFIG`, `./siddon.toml`,
//! then built-in defaults. Environment variables override whatever was loaded:
//! `SIDDON_URI`, `SIDDON_DATABASE`, `SIDDON_CONNECT_TIMEOUT_MS`, `SIDDON_EXEC_TIMEOUT_MS`.

use crate::errors::DbError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_URI: &str = "memory://default";
pub const DEFAULT_DATABASE: &str = "siddon";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub uri: String,
    pub database: String,
    pub connect_timeout_ms: u64,
    /// Default deadline for `Client::context()`; none when unset.
    pub exec_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            exec_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self { uri: uri.into(), database: database.into(), ..Self::default() }
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn exec_timeout(&self) -> Option<Duration> {
        self.exec_timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    /// Parses a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    /// `DbError::Config` on malformed TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        toml::from_str(s).map_err(|e| DbError::Config(e.to_string()))
    }

    /// # Errors
    /// `DbError::Io` if the file cannot be read, `DbError::Config` if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, DbError> {
        let s = std::fs::read_to_string(path)?;
        toml::from_str(&s).map_err(|e| DbError::Config(format!("{}: {e}", path.display())))
    }

    /// Resolves configuration from files and the process environment.
    ///
    /// # Errors
    /// Fails when the explicit file is missing, or any chosen file or
    /// environment value is malformed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, DbError> {
        let mut cfg = match explicit {
            Some(p) => Self::from_file(p)?,
            None => {
                let mut candidates: Vec<PathBuf> = vec![];
                if let Ok(p) = std::env::var("SIDDON_CONFIG") {
                    candidates.push(PathBuf::from(p));
                }
                if let Ok(cur) = std::env::current_dir() {
                    candidates.push(cur.join("siddon.toml"));
                }
                match candidates.into_iter().find(|p| p.exists()) {
                    Some(p) => Self::from_file(&p)?,
                    None => Self::default(),
                }
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// # Errors
    /// `DbError::Config` when a timeout variable is not an integer.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), DbError> {
        let millis = |key: &str, raw: String| {
            raw.trim().parse::<u64>().map_err(|_| DbError::Config(format!("{key} must be milliseconds, got `{raw}`")))
        };
        if let Some(uri) = lookup("SIDDON_URI") {
            self.uri = uri;
        }
        if let Some(db) = lookup("SIDDON_DATABASE") {
            self.database = db;
        }
        if let Some(raw) = lookup("SIDDON_CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = millis("SIDDON_CONNECT_TIMEOUT_MS", raw)?;
        }
        if let Some(raw) = lookup("SIDDON_EXEC_TIMEOUT_MS") {
            self.exec_timeout_ms = Some(millis("SIDDON_EXEC_TIMEOUT_MS", raw)?);
        }
        Ok(())
    }
}
