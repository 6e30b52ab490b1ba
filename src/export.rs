//! Writing stored documents and boards out to user-chosen files.

use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::db::DocumentFormat;
use crate::error::Result;

/// Text to write for a stored document.
///
/// Text is returned verbatim. JSON objects and arrays are pretty-printed,
/// a JSON string becomes its plain value, other scalars keep their JSON
/// spelling, and content that does not parse is returned as stored.
pub fn render_document(format: DocumentFormat, content: &str) -> String {
    match format {
        DocumentFormat::Text => content.to_string(),
        DocumentFormat::Json => match serde_json::from_str::<Value>(content) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| content.to_string())
            }
            Ok(Value::String(s)) => s,
            Ok(scalar) => scalar.to_string(),
            Err(_) => content.to_string(),
        },
    }
}

pub fn write_document(format: DocumentFormat, content: &str, output_path: &Path) -> Result<()> {
    let rendered = render_document(format, content);
    let mut file = File::create(output_path)?;
    file.write_all(rendered.as_bytes())?;
    tracing::debug!(path = ?output_path, bytes = rendered.len(), "Exported document");
    Ok(())
}
