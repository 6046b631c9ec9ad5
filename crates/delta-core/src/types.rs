//! Core types for the mutation engine.

use serde_json::{Map, Value};
use thiserror::Error;

/// Ordered sequence of string keys locating a node within the tree.
pub type Path = Vec<String>;

/// Returns true if `path` addresses the tree root.
///
/// The root is denoted by an empty path or a path whose first segment is
/// the `"/"` sentinel.
pub fn is_root(path: &[String]) -> bool {
    path.is_empty() || path[0] == "/"
}

/// Format a path as a pointer-like string for error messages.
pub fn format_pointer(path: &[String]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(path.len() * 8);
    for key in path {
        out.push('/');
        out.push_str(key);
    }
    out
}

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum ApplyError {
    /// An `update` path whose non-final segment is absent in the tree.
    #[error("PATH_NOT_FOUND: {pointer}")]
    PathNotFound { pointer: String },
    /// An `add` targeting an existing array with non-array data.
    #[error("DATA_NOT_SEQUENCE: {pointer}")]
    DataNotSequence { pointer: String },
    /// A root-level `add` whose data carries no fields to merge.
    #[error("DATA_NOT_MAPPING: root add requires mapping data")]
    DataNotMapping,
}

// ── Change / Changeset ────────────────────────────────────────────────────

/// One declarative mutation instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert data at a path, fabricating intermediate mappings on demand.
    /// An existing array at the final key accumulates; anything else is
    /// overwritten.
    Add { path: Path, data: Value },
    /// Field-level merge into every element of the array at `path` that
    /// satisfies the `match_` predicate (empty predicate matches all).
    Update {
        path: Path,
        data: Map<String, Value>,
        match_: Map<String, Value>,
    },
    /// An unrecognized `operation` value. Applying it is a no-op.
    Unknown { op: String },
}

impl Change {
    /// Returns the operation name string.
    pub fn op_name(&self) -> &str {
        match self {
            Change::Add { .. } => "add",
            Change::Update { .. } => "update",
            Change::Unknown { op } => op,
        }
    }
}

/// An ordered batch of changes sourced from one external input.
///
/// Order is semantic: each change sees the cumulative effect of the ones
/// before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub changes: Vec<Change>,
}
