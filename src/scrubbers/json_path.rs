//! Masks values selected by JSON paths.
//!
//! The payload is parsed into a tree, every node matched by one of the ignored
//! paths is replaced by [`IGNORED_VALUE`], and the tree is written back with
//! indentation so approved files diff cleanly line by line.

use serde_json::Value;

use super::Scrubber;
use crate::errors::{ApprovalError, Result};

/// Sentinel written in place of ignored values.
pub const IGNORED_VALUE: &str = "_IGNORED_VALUE_";

#[derive(Debug, Clone, Default)]
pub struct JsonPathScrubber {
    ignored_paths: Vec<String>,
}

impl JsonPathScrubber {
    pub fn new<I, S>(ignored_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_paths: ignored_paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ignored_paths(&self) -> &[String] {
        &self.ignored_paths
    }
}

impl Scrubber for JsonPathScrubber {
    fn scrub(&self, input: &str) -> Result<String> {
        if input.trim().is_empty() {
            return Ok(String::new());
        }

        let mut json: Value =
            serde_json::from_str(input).map_err(|source| ApprovalError::Parse { source })?;
        for path in &self.ignored_paths {
            json = mask_path(json, path)?;
        }
        Ok(format!("{:#}", json))
    }
}

/// Replaces every node selected by `path`.
///
/// Arrays become a single-element array holding the sentinel; scalars and
/// objects become the sentinel itself.
fn mask_path(json: Value, path: &str) -> Result<Value> {
    let expression = normalize_path(path);
    // `replace_with` never visits the root node itself.
    if expression == "$" {
        return Ok(mask(json));
    }
    jsonpath_lib::replace_with(json, &expression, &mut |node: Value| Some(mask(node)))
        .map_err(|e| ApprovalError::InvalidJsonPath {
            path: path.to_string(),
            message: format!("{:?}", e),
        })
}

fn mask(node: Value) -> Value {
    match node {
        Value::Array(_) => Value::Array(vec![Value::String(IGNORED_VALUE.to_string())]),
        _ => Value::String(IGNORED_VALUE.to_string()),
    }
}

/// Accepts relative paths such as `ts` or `items[0].id` by rooting them at `$`.
fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('$') {
        path.to_string()
    } else if path.starts_with('.') || path.starts_with('[') {
        format!("${}", path)
    } else {
        format!("$.{}", path)
    }
}
