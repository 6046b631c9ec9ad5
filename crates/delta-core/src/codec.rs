//! JSON codec for changesets.
//!
//! Converts change records to/from `serde_json::Value` in the on-disk
//! changeset format:
//!
//! ```json
//! {
//!   "changes": [
//!     {"operation": "add", "path": ["users"], "data": [{"id": 1}]},
//!     {"operation": "update", "path": ["users"], "match": {"id": 1}, "data": {"active": true}}
//!   ]
//! }
//! ```

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::types::{Change, Changeset, Path};

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("changeset must be an object with a 'changes' array")]
    InvalidChangeset,
    #[error("change must be an object")]
    InvalidChange,
    #[error("missing '{0}' field")]
    MissingField(&'static str),
    #[error("'{0}' field has the wrong type")]
    InvalidField(&'static str),
}

// ── Deserialization ───────────────────────────────────────────────────────

fn decode_path(v: &Value) -> Result<Path, CodecError> {
    let arr = v.as_array().ok_or(CodecError::InvalidField("path"))?;
    arr.iter()
        .map(|step| {
            step.as_str()
                .map(str::to_string)
                .ok_or(CodecError::InvalidField("path"))
        })
        .collect()
}

fn decode_fields(v: &Value, field: &'static str) -> Result<Map<String, Value>, CodecError> {
    v.as_object().cloned().ok_or(CodecError::InvalidField(field))
}

/// Deserialize a single change record.
///
/// An unrecognized `operation` string decodes to [`Change::Unknown`] rather
/// than a decode error; the skip policy lives in the apply step.
pub fn change_from_json(v: &Value) -> Result<Change, CodecError> {
    let obj = v.as_object().ok_or(CodecError::InvalidChange)?;
    let op = obj
        .get("operation")
        .ok_or(CodecError::MissingField("operation"))?
        .as_str()
        .ok_or(CodecError::InvalidField("operation"))?;

    // Absent path = root.
    let path = obj.get("path").map(decode_path).transpose()?.unwrap_or_default();

    match op {
        "add" => {
            let data = obj
                .get("data")
                .cloned()
                .ok_or(CodecError::MissingField("data"))?;
            Ok(Change::Add { path, data })
        }
        "update" => {
            let data = decode_fields(
                obj.get("data").ok_or(CodecError::MissingField("data"))?,
                "data",
            )?;
            let match_ = match obj.get("match") {
                Some(v) => decode_fields(v, "match")?,
                None => Map::new(),
            };
            Ok(Change::Update { path, data, match_ })
        }
        other => Ok(Change::Unknown {
            op: other.to_string(),
        }),
    }
}

/// Deserialize a whole changeset document.
pub fn changeset_from_json(v: &Value) -> Result<Changeset, CodecError> {
    let changes = v
        .as_object()
        .and_then(|obj| obj.get("changes"))
        .and_then(|c| c.as_array())
        .ok_or(CodecError::InvalidChangeset)?;
    let changes = changes
        .iter()
        .map(change_from_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Changeset { changes })
}

// ── Serialization ─────────────────────────────────────────────────────────

fn encode_path(path: &[String]) -> Value {
    Value::Array(path.iter().map(|s| Value::String(s.clone())).collect())
}

/// Serialize a change record back to its on-disk shape.
pub fn change_to_json(change: &Change) -> Value {
    match change {
        Change::Add { path, data } => json!({
            "operation": "add",
            "path": encode_path(path),
            "data": data,
        }),
        Change::Update { path, data, match_ } => {
            let mut m = Map::new();
            m.insert("operation".into(), json!("update"));
            m.insert("path".into(), encode_path(path));
            if !match_.is_empty() {
                m.insert("match".into(), Value::Object(match_.clone()));
            }
            m.insert("data".into(), Value::Object(data.clone()));
            Value::Object(m)
        }
        // Only the operation name survives a decode of an unrecognized
        // change; that is all there is to re-emit.
        Change::Unknown { op } => json!({ "operation": op }),
    }
}

/// Serialize a changeset back to its on-disk shape.
pub fn changeset_to_json(changeset: &Changeset) -> Value {
    json!({
        "changes": changeset.changes.iter().map(change_to_json).collect::<Vec<_>>()
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────
