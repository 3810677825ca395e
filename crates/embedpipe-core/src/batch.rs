use serde_json::Value;

use crate::error::{Error, Result};

/// Parse the raw stdin blob into the ordered input batch.
///
/// The top-level JSON value must be an array. Element types are not checked
/// up front: a non-string element fails at string extraction and the decode
/// error propagates to the caller as-is.
pub fn parse_batch(input: &str) -> Result<Vec<String>> {
    let value: Value =
        serde_json::from_str(input).map_err(|e| Error::InvalidInput(e.to_string()))?;
    if !value.is_array() {
        return Err(Error::NotAnArray);
    }
    serde_json::from_value(value).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Render the output batch as one JSON line (caller appends the newline).
pub fn render_batch(embeddings: &[Vec<f32>]) -> Result<String> {
    serde_json::to_string(embeddings).map_err(|e| Error::Serialize(e.to_string()))
}
