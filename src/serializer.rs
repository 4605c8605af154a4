//! Serialization of arbitrary values before verification.

use serde_json::Value;

use crate::errors::{ApprovalError, Result};

/// Writes an already-converted JSON value as snapshot text.
pub trait JsonSerializer: Send + Sync {
    fn serialize(&self, value: &Value) -> Result<String>;
}

/// Indented output, the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyJsonSerializer;

impl JsonSerializer for PrettyJsonSerializer {
    fn serialize(&self, value: &Value) -> Result<String> {
        serde_json::to_string_pretty(value).map_err(ApprovalError::Serialize)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompactJsonSerializer;

impl JsonSerializer for CompactJsonSerializer {
    fn serialize(&self, value: &Value) -> Result<String> {
        serde_json::to_string(value).map_err(ApprovalError::Serialize)
    }
}

/// Converts `data` to JSON text with `serializer`. A null value is always `null`.
pub fn serialize_object<T>(serializer: &dyn JsonSerializer, data: &T) -> Result<String>
where
    T: serde::Serialize + ?Sized,
{
    let value = serde_json::to_value(data).map_err(ApprovalError::Serialize)?;
    if value.is_null() {
        return Ok("null".to_string());
    }
    serializer.serialize(&value)
}
