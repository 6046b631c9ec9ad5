//! Changeset loading and database serialization.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use delta_core::{changeset_from_json, Changeset, CodecError};
use serde_json::Value;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read changeset file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in changeset file: {path}")]
    ChangesetParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid changeset in {path}: {source}")]
    ChangesetShape {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("failed to write database file: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Load / write ──────────────────────────────────────────────────────────

/// Load and decode one changeset source.
pub fn load_changeset(path: &Path) -> Result<Changeset, PersistError> {
    let text = fs::read_to_string(path).map_err(|source| PersistError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_str(&text).map_err(|source| PersistError::ChangesetParse {
            path: path.to_path_buf(),
            source,
        })?;
    changeset_from_json(&value).map_err(|source| PersistError::ChangesetShape {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize the final tree as indented JSON, replacing any prior content
/// at `path`.
pub fn write_database(path: &Path, db: &Value) -> Result<(), PersistError> {
    let mut file = File::create(path).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(&mut file, db).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source: source.into(),
    })?;
    file.write_all(b"\n").map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────
