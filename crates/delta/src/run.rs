//! The run driver.
//!
//! Folds the configured changeset sources, in order, through the engine,
//! starting from an empty tree, then writes the final tree exactly once.
//! Any failure aborts the run before the database file is touched; the
//! in-memory tree accumulated so far is simply dropped.

use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use delta_core::{apply_changeset, ApplyError};

use crate::config::{Config, ConfigError};
use crate::persistence::{load_changeset, write_database, PersistError};

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("failed to apply changeset {path}: {source}")]
    Apply {
        path: PathBuf,
        #[source]
        source: ApplyError,
    },
}

// ── Driver ────────────────────────────────────────────────────────────────

/// Apply every configured changeset in order and write the final tree.
///
/// Returns the written tree.
pub fn run(config: &Config) -> Result<Value, RunError> {
    let mut db = Value::Object(Map::new());

    for file in &config.changeset_files {
        debug!(file = %file.display(), "applying changeset");
        let changeset = load_changeset(file)?;
        db = apply_changeset(db, &changeset).map_err(|source| RunError::Apply {
            path: file.clone(),
            source,
        })?;
    }

    write_database(&config.db_file, &db)?;
    info!(
        db_file = %config.db_file.display(),
        changesets = config.changeset_files.len(),
        "database written"
    );
    Ok(db)
}

// ── Tests ─────────────────────────────────────────────────────────────────
