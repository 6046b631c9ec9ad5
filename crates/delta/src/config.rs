//! Configuration discovery and validation.
//!
//! A run is described by a configuration artifact: a file named
//! `delta.json` or ending in `.delta.json`. Discovery walks an explicit
//! search root (never the ambient working directory) and stops at the
//! first match.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no delta.json or *.delta.json file found under {0}")]
    NotFound(PathBuf),
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in config file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: missing '{0}' field")]
    MissingField(&'static str),
    #[error("invalid configuration: '{0}' field has the wrong type")]
    InvalidField(&'static str),
}

// ── Config ────────────────────────────────────────────────────────────────

/// Validated run configuration.
///
/// All three fields are required; [`Config::from_json`] rejects a config
/// missing any of them before the run starts.
#[derive(Debug, Clone)]
pub struct Config {
    /// Free-form descriptive value, opaque to the engine.
    pub metadata: Value,
    /// Where the final database is written.
    pub db_file: PathBuf,
    /// Changeset sources, applied in the listed order.
    pub changeset_files: Vec<PathBuf>,
}

impl Config {
    pub fn from_json(v: &Value) -> Result<Config, ConfigError> {
        let obj = v.as_object().ok_or(ConfigError::InvalidField("config"))?;

        let metadata = obj
            .get("metadata")
            .filter(|m| !m.is_null())
            .cloned()
            .ok_or(ConfigError::MissingField("metadata"))?;

        let db_file = obj
            .get("dbFile")
            .ok_or(ConfigError::MissingField("dbFile"))?
            .as_str()
            .ok_or(ConfigError::InvalidField("dbFile"))?;

        let changeset_files = obj
            .get("changesetFiles")
            .ok_or(ConfigError::MissingField("changesetFiles"))?
            .as_array()
            .ok_or(ConfigError::InvalidField("changesetFiles"))?
            .iter()
            .map(|f| {
                f.as_str()
                    .map(PathBuf::from)
                    .ok_or(ConfigError::InvalidField("changesetFiles"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Config {
            metadata,
            db_file: PathBuf::from(db_file),
            changeset_files,
        })
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────

fn is_config_name(name: &str) -> bool {
    name == "delta.json" || name.ends_with(".delta.json")
}

/// Read and validate a config file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_json(&value)
}

/// Walk `root` and load the first configuration artifact found.
pub fn discover(root: &Path) -> Result<(PathBuf, Config), ConfigError> {
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if is_config_name(&entry.file_name().to_string_lossy()) {
            let path = entry.into_path();
            debug!(path = %path.display(), "found configuration artifact");
            let config = load(&path)?;
            return Ok((path, config));
        }
    }
    Err(ConfigError::NotFound(root.to_path_buf()))
}

// ── Tests ─────────────────────────────────────────────────────────────────
