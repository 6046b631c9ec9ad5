//! Changeset apply logic.
//!
//! The engine is a pure function from (tree, changeset) to tree: it takes
//! exclusive mutable access to the tree for the duration of one call and
//! rewrites it in place. Shape dispatch is always an explicit `match` on
//! the `Value` tag: `Object` is a mapping node, `Array` a sequence node,
//! everything else a scalar.

use serde_json::{Map, Value};
use tracing::warn;

use crate::types::{format_pointer, is_root, ApplyError, Change, Changeset};

// ── add ───────────────────────────────────────────────────────────────────

/// Shallow one-level merge of `data`'s fields into the root mapping.
///
/// Same-named root keys are overwritten wholesale (nested objects are
/// replaced, not recursively merged); keys unique to the root survive.
fn merge_root(db: &mut Value, data: &Value) -> Result<(), ApplyError> {
    let fields = match data {
        Value::Object(map) => map,
        _ => return Err(ApplyError::DataNotMapping),
    };
    match db {
        Value::Object(root) => {
            for (k, v) in fields {
                root.insert(k.clone(), v.clone());
            }
        }
        other => *other = Value::Object(fields.clone()),
    }
    Ok(())
}

/// Coerce a node to a mapping, replacing any non-mapping value in place.
fn as_mapping(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was coerced to a mapping above"),
    }
}

/// Descend one step, fabricating an empty mapping at an absent key.
///
/// A non-mapping node in an intermediate position is replaced by an empty
/// mapping before descending.
fn descend<'a>(node: &'a mut Value, key: &str) -> &'a mut Value {
    as_mapping(node)
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
}

fn apply_add(db: &mut Value, path: &[String], data: &Value) -> Result<(), ApplyError> {
    if is_root(path) {
        return merge_root(db, data);
    }

    let (walk, last) = path.split_at(path.len() - 1);
    let last_key = &last[0];

    let mut target = db;
    for key in walk {
        target = descend(target, key);
    }
    let container = as_mapping(target);

    match container.get_mut(last_key) {
        // Sequence target: append, never replace.
        Some(Value::Array(existing)) => match data {
            Value::Array(items) => existing.extend(items.iter().cloned()),
            _ => {
                return Err(ApplyError::DataNotSequence {
                    pointer: format_pointer(path),
                })
            }
        },
        // Anything else (including absence): overwrite with the payload.
        _ => {
            container.insert(last_key.clone(), data.clone());
        }
    }
    Ok(())
}

// ── update ────────────────────────────────────────────────────────────────

fn apply_update(
    db: &mut Value,
    path: &[String],
    data: &Map<String, Value>,
    match_: &Map<String, Value>,
) -> Result<(), ApplyError> {
    // An empty path addresses no keyed location; only array values stored
    // under a key are updatable, so there is nothing to do.
    if path.is_empty() {
        return Ok(());
    }

    let (walk, last) = path.split_at(path.len() - 1);
    let last_key = &last[0];

    // Resolve intermediates with no creation; an absent segment is an
    // error, update targets must already exist.
    let mut container = &mut *db;
    for (depth, key) in walk.iter().enumerate() {
        let missing = || ApplyError::PathNotFound {
            pointer: format_pointer(&path[..=depth]),
        };
        container = match container {
            Value::Object(map) => map.get_mut(key).ok_or_else(missing)?,
            _ => return Err(missing()),
        };
    }

    let items = match container {
        Value::Object(map) => match map.get_mut(last_key) {
            Some(Value::Array(items)) => items,
            // Only sequence targets are supported; everything else is a
            // silent no-op.
            _ => return Ok(()),
        },
        _ => return Ok(()),
    };

    for item in items.iter_mut() {
        let fields = match item {
            Value::Object(fields) => fields,
            // Scalar elements have no fields to merge and can never
            // satisfy a predicate.
            _ => continue,
        };
        if !match_.is_empty() {
            let matched = match_.iter().all(|(k, v)| fields.get(k) == Some(v));
            if !matched {
                continue;
            }
        }
        for (k, v) in data {
            fields.insert(k.clone(), v.clone());
        }
    }
    Ok(())
}

// ── Main apply functions ──────────────────────────────────────────────────

/// Apply a single change to the tree (in-place mutation).
pub fn apply_change(db: &mut Value, change: &Change) -> Result<(), ApplyError> {
    match change {
        Change::Add { path, data } => apply_add(db, path, data),
        Change::Update { path, data, match_ } => apply_update(db, path, data, match_),
        Change::Unknown { op } => {
            warn!(operation = %op, "skipping change with unrecognized operation");
            Ok(())
        }
    }
}

/// Apply a changeset, returning the new authoritative tree.
///
/// Changes apply left to right; each sees the cumulative effect of the
/// ones before it. No change is optional or reordered.
pub fn apply_changeset(mut db: Value, changeset: &Changeset) -> Result<Value, ApplyError> {
    for change in &changeset.changes {
        apply_change(&mut db, change)?;
    }
    Ok(db)
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> Vec<String> {
        if s.is_empty() {
            return vec![];
        }
        s.split('/').filter(|p| !p.is_empty()).map(|s| s.to_string()).collect()
    }

    fn fields(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn root_add_merges_shallow() {
        let mut db = json!({"a": 1, "nested": {"x": 1, "y": 2}});
        apply_change(
            &mut db,
            &Change::Add {
                path: path(""),
                data: json!({"b": 2, "nested": {"z": 3}}),
            },
        )
        .unwrap();
        // One-level merge: the nested object is replaced wholesale.
        assert_eq!(db, json!({"a": 1, "nested": {"z": 3}, "b": 2}));
    }

    #[test]
    fn root_sentinel_path_merges_at_root() {
        let mut db = json!({"a": 1});
        apply_change(
            &mut db,
            &Change::Add {
                path: vec!["/".to_string()],
                data: json!({"b": 2}),
            },
        )
        .unwrap();
        assert_eq!(db, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn root_add_requires_mapping_data() {
        let mut db = json!({});
        let err = apply_change(
            &mut db,
            &Change::Add {
                path: path(""),
                data: json!([1, 2]),
            },
        )
        .unwrap_err();
        assert_eq!(err, ApplyError::DataNotMapping);
    }

    #[test]
    fn add_fabricates_intermediate_mappings() {
        let mut db = json!({"sibling": true});
        apply_change(
            &mut db,
            &Change::Add {
                path: path("a/b/c"),
                data: json!({"leaf": 1}),
            },
        )
        .unwrap();
        assert_eq!(
            db,
            json!({"sibling": true, "a": {"b": {"c": {"leaf": 1}}}})
        );
    }

    #[test]
    fn add_appends_to_existing_array() {
        let mut db = json!({"items": [1, 2]});
        apply_change(
            &mut db,
            &Change::Add {
                path: path("items"),
                data: json!([3, 4]),
            },
        )
        .unwrap();
        assert_eq!(db, json!({"items": [1, 2, 3, 4]}));
    }

    #[test]
    fn add_to_array_with_non_array_data_fails() {
        let mut db = json!({"items": [1]});
        let err = apply_change(
            &mut db,
            &Change::Add {
                path: path("items"),
                data: json!({"not": "a sequence"}),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            ApplyError::DataNotSequence {
                pointer: "/items".to_string()
            }
        );
    }

    #[test]
    fn add_overwrites_non_array_values() {
        let mut db = json!({"a": {"b": "old"}});
        apply_change(
            &mut db,
            &Change::Add {
                path: path("a/b"),
                data: json!({"now": "new"}),
            },
        )
        .unwrap();
        assert_eq!(db, json!({"a": {"b": {"now": "new"}}}));
    }

    #[test]
    fn array_append_is_not_idempotent() {
        let change = Change::Add {
            path: path("items"),
            data: json!([1, 2]),
        };
        let mut db = json!({"items": []});
        apply_change(&mut db, &change).unwrap();
        apply_change(&mut db, &change).unwrap();
        // Append semantics: applying twice doubles the length, by design.
        assert_eq!(db, json!({"items": [1, 2, 1, 2]}));
    }

    #[test]
    fn update_without_match_hits_every_element() {
        let mut db = json!({"users": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]});
        apply_change(
            &mut db,
            &Change::Update {
                path: path("users"),
                data: fields(json!({"seen": true})),
                match_: Map::new(),
            },
        )
        .unwrap();
        assert_eq!(
            db,
            json!({"users": [
                {"id": 1, "name": "a", "seen": true},
                {"id": 2, "name": "b", "seen": true}
            ]})
        );
    }

    #[test]
    fn update_with_match_is_conjunctive_and_exact() {
        let mut db = json!({"users": [
            {"id": 1, "role": "admin", "active": true},
            {"id": 2, "role": "admin", "active": false},
            {"id": 3, "role": "user", "active": true}
        ]});
        apply_change(
            &mut db,
            &Change::Update {
                path: path("users"),
                data: fields(json!({"flag": 1})),
                match_: fields(json!({"role": "admin", "active": true})),
            },
        )
        .unwrap();
        let flagged: Vec<_> = db["users"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|u| u["flag"] == json!(1))
            .collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0]["id"], json!(1));
    }

    #[test]
    fn update_no_type_coercion_in_match() {
        let mut db = json!({"items": [{"n": 1}, {"n": "1"}]});
        apply_change(
            &mut db,
            &Change::Update {
                path: path("items"),
                data: fields(json!({"hit": true})),
                match_: fields(json!({"n": 1})),
            },
        )
        .unwrap();
        assert_eq!(db["items"][0]["hit"], json!(true));
        assert_eq!(db["items"][1].get("hit"), None);
    }

    #[test]
    fn update_updates_all_matches_not_first() {
        let mut db = json!({"items": [{"k": 1}, {"k": 1}, {"k": 2}]});
        apply_change(
            &mut db,
            &Change::Update {
                path: path("items"),
                data: fields(json!({"v": 9})),
                match_: fields(json!({"k": 1})),
            },
        )
        .unwrap();
        assert_eq!(db, json!({"items": [{"k": 1, "v": 9}, {"k": 1, "v": 9}, {"k": 2}]}));
    }

    #[test]
    fn update_on_non_array_target_is_noop() {
        let mut db = json!({"config": {"a": 1}});
        apply_change(
            &mut db,
            &Change::Update {
                path: path("config"),
                data: fields(json!({"a": 2})),
                match_: Map::new(),
            },
        )
        .unwrap();
        assert_eq!(db, json!({"config": {"a": 1}}));
    }

    #[test]
    fn update_on_absent_target_key_is_noop() {
        let mut db = json!({"a": {}});
        apply_change(
            &mut db,
            &Change::Update {
                path: path("a/missing"),
                data: fields(json!({"x": 1})),
                match_: Map::new(),
            },
        )
        .unwrap();
        assert_eq!(db, json!({"a": {}}));
    }

    #[test]
    fn update_through_missing_intermediate_fails() {
        let mut db = json!({"a": {}});
        let err = apply_change(
            &mut db,
            &Change::Update {
                path: path("a/b/items"),
                data: fields(json!({"x": 1})),
                match_: Map::new(),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            ApplyError::PathNotFound {
                pointer: "/a/b".to_string()
            }
        );
    }

    #[test]
    fn update_skips_scalar_elements() {
        let mut db = json!({"items": [1, {"k": 1}, "two"]});
        apply_change(
            &mut db,
            &Change::Update {
                path: path("items"),
                data: fields(json!({"v": true})),
                match_: Map::new(),
            },
        )
        .unwrap();
        assert_eq!(db, json!({"items": [1, {"k": 1, "v": true}, "two"]}));
    }

    #[test]
    fn unknown_operation_is_a_noop() {
        let mut db = json!({"a": 1});
        apply_change(
            &mut db,
            &Change::Unknown {
                op: "remove".to_string(),
            },
        )
        .unwrap();
        assert_eq!(db, json!({"a": 1}));
    }

    #[test]
    fn changes_see_prior_changes_in_same_changeset() {
        let changeset = Changeset {
            changes: vec![
                Change::Add {
                    path: path(""),
                    data: json!({"users": []}),
                },
                Change::Add {
                    path: path("users"),
                    data: json!([{"id": 1, "active": true}, {"id": 2, "active": false}]),
                },
                Change::Update {
                    path: path("users"),
                    data: fields(json!({"active": false})),
                    match_: fields(json!({"active": true})),
                },
            ],
        };
        let db = apply_changeset(json!({}), &changeset).unwrap();
        assert_eq!(
            db,
            json!({"users": [{"id": 1, "active": false}, {"id": 2, "active": false}]})
        );
    }
}
