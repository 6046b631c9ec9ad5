//! delta — build a JSON database file from changeset files.
//!
//! The tool discovers a configuration artifact (`delta.json` or
//! `*.delta.json`) under a search root, loads the configured changeset
//! sources in order, folds them through the [`delta_core`] engine starting
//! from an empty tree, and writes the result as indented JSON.

pub mod config;
pub mod persistence;
pub mod run;

pub use config::{discover, Config, ConfigError};
pub use persistence::{load_changeset, write_database, PersistError};
pub use run::{run, RunError};
