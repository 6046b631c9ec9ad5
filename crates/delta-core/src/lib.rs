//! delta-core — the changeset mutation engine.
//!
//! Applies ordered batches of declarative change records ("changesets") to
//! an in-memory JSON tree. The engine is pure: no I/O, no ambient state,
//! one tree per call.
//!
//! Two operations exist. `add` writes a payload at a path, fabricating
//! intermediate mappings on demand; an existing array at the final key
//! accumulates the payload instead of being replaced. `update` performs a
//! field-level merge into every element of a target array that satisfies a
//! conjunctive equality predicate.
//!
//! # Example
//!
//! ```
//! use delta_core::{apply_changeset, changeset_from_json};
//! use serde_json::json;
//!
//! let changeset = changeset_from_json(&json!({
//!     "changes": [
//!         {"operation": "add", "path": [], "data": {"users": []}},
//!         {"operation": "add", "path": ["users"],
//!          "data": [{"id": 1, "active": true}, {"id": 2, "active": false}]},
//!         {"operation": "update", "path": ["users"],
//!          "match": {"active": true}, "data": {"active": false}}
//!     ]
//! })).unwrap();
//!
//! let db = apply_changeset(json!({}), &changeset).unwrap();
//! assert_eq!(db, json!({
//!     "users": [{"id": 1, "active": false}, {"id": 2, "active": false}]
//! }));
//! ```

pub mod apply;
pub mod codec;
pub mod types;

pub use apply::{apply_change, apply_changeset};
pub use codec::{
    change_from_json, change_to_json, changeset_from_json, changeset_to_json, CodecError,
};
pub use types::{format_pointer, is_root, ApplyError, Change, Changeset, Path};
