//! # Configuration
//!
//! Resolves runtime settings from three layers, highest priority first:
//!
//! 1. CLI flags (`--database`, `--backend`, `--docs-root`, ...)
//! 2. A TOML file (`--config <path>`, or `labtrack.toml` in the working dir)
//! 3. Built-in defaults
//!
//! ```toml
//! database = "labtrack.db"
//! backend = "redb"
//! docs_root = "docs"
//! backend_url = "http://localhost:8000"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```
//!
//! Server security settings (CORS, rate limit, API key) stay in
//! `LABTRACK_*` environment variables; see [`crate::api`].

use clap::ValueEnum;
use labtrack_core::{LabTrackError, MemoryStore, ProgressStore, RedbStore};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "labtrack.toml";

const DEFAULT_DATABASE: &str = "labtrack.db";
const DEFAULT_DOCS_ROOT: &str = "docs";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Where progress is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// ACID redb database file.
    #[default]
    Redb,
    /// Volatile, lost on exit.
    Memory,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Redb => "redb",
            Backend::Memory => "memory",
        })
    }
}

// =============================================================================
// FILE LAYER
// =============================================================================

/// Contents of `labtrack.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub docs_root: Option<PathBuf>,
    pub backend_url: Option<String>,
    pub server: ServerSection,
}

/// `[server]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl FileConfig {
    /// Parse TOML text.
    pub fn parse(text: &str) -> Result<Self, LabTrackError> {
        toml::from_str(text).map_err(|e| LabTrackError::ConfigError(e.to_string()))
    }

    /// Load the config file.
    ///
    /// An explicit path must exist. Without one, `labtrack.toml` is used if
    /// present and an empty config otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, LabTrackError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|e| {
            LabTrackError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "config file loaded");
        Self::parse(&text)
    }
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Values given on the command line, `None` when the flag was omitted.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub docs_root: Option<PathBuf>,
    pub backend_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub backend: Backend,
    pub docs_root: PathBuf,
    pub backend_url: String,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Merge CLI overrides over the file layer over defaults.
    #[must_use]
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Self {
        Self {
            database: overrides
                .database
                .or(file.database)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            backend: overrides.backend.or(file.backend).unwrap_or_default(),
            docs_root: overrides
                .docs_root
                .or(file.docs_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_ROOT)),
            backend_url: overrides
                .backend_url
                .or(file.backend_url)
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            host: overrides
                .host
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
        }
    }

    /// Open the configured progress store.
    pub fn open_store(&self) -> Result<ProgressStore, LabTrackError> {
        match self.backend {
            Backend::Redb => Ok(ProgressStore::new(Arc::new(RedbStore::open(
                &self.database,
            )?))),
            Backend::Memory => Ok(ProgressStore::new(Arc::new(MemoryStore::new()))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_given() {
        let settings = Settings::resolve(Overrides::default(), FileConfig::default());
        assert_eq!(settings.database, PathBuf::from("labtrack.db"));
        assert_eq!(settings.backend, Backend::Redb);
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.backend_url, "http://localhost:8000");
    }

    #[test]
    fn cli_beats_file_beats_default() {
        let file = FileConfig::parse(
            r#"
            backend = "memory"
            backend_url = "http://backend:9000"

            [server]
            port = 9090
            host = "0.0.0.0"
            "#,
        )
        .expect("parse");
        let overrides = Overrides {
            port: Some(7070),
            ..Overrides::default()
        };

        let settings = Settings::resolve(overrides, file);
        assert_eq!(settings.port, 7070);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.backend, Backend::Memory);
        assert_eq!(settings.backend_url, "http://backend:9000");
        assert_eq!(settings.docs_root, PathBuf::from("docs"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            FileConfig::parse("colour = \"blue\""),
            Err(LabTrackError::ConfigError(_))
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        assert!(FileConfig::load(Some(&missing)).is_err());
    }
}
