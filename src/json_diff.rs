//! # Structural JSON Diff
//!
//! Turns two JSON payloads into a single delta document that can itself be
//! approved. The delta is computed by `json-structural-diff`: changed scalars
//! appear as `{"__old": .., "__new": ..}`, added and removed keys carry the
//! `__added` / `__deleted` suffixes, and arrays list their elements tagged with
//! `" "`, `"+"`, `"-"` or `"~"`. Identical documents have no delta at all.
//!
//! How the delta is rendered is up to a [`JsonDiffFormatter`].

use json_structural_diff::JsonDiff;
use serde_json::{Map, Value};

use crate::errors::{ApprovalError, Result};

/// Renders a delta document (or its absence) as text.
pub trait JsonDiffFormatter: Send + Sync {
    fn format(&self, diff: Option<&Value>) -> String;
}

/// Renders the delta in the key order produced by the diff.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultJsonDiffFormatter;

impl JsonDiffFormatter for DefaultJsonDiffFormatter {
    fn format(&self, diff: Option<&Value>) -> String {
        diff.map(|d| format!("{:#}", d)).unwrap_or_default()
    }
}

/// Renders the delta with every object's keys sorted alphabetically.
///
/// The key order of a computed delta may depend on the environment, so sorting
/// keeps approved diff snapshots reproducible across machines.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphabeticalJsonDiffFormatter;

impl JsonDiffFormatter for AlphabeticalJsonDiffFormatter {
    fn format(&self, diff: Option<&Value>) -> String {
        diff.map(|d| format!("{:#}", sort_keys(d))).unwrap_or_default()
    }
}

/// Returns a copy of `value` with object keys sorted, recursing only through
/// object values. Arrays and everything inside them keep their shape.
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::Object(_) => sort_keys(value),
                        other => other.clone(),
                    };
                    (key.clone(), value)
                })
                .collect();
            Value::Object(sorted)
        }
        other => other.clone(),
    }
}

/// Parses both payloads and computes their structural delta.
pub fn compute_delta(before: &str, after: &str) -> Result<Option<Value>> {
    let before: Value =
        serde_json::from_str(before).map_err(|source| ApprovalError::Parse { source })?;
    let after: Value =
        serde_json::from_str(after).map_err(|source| ApprovalError::Parse { source })?;
    Ok(JsonDiff::diff(&before, &after, false).diff)
}

/// Computes the delta between two payloads and renders it with `formatter`.
pub fn compute_json_diff(
    before: &str,
    after: &str,
    formatter: &dyn JsonDiffFormatter,
) -> Result<String> {
    let delta = compute_delta(before, after)?;
    Ok(formatter.format(delta.as_ref()))
}
