//! Structured text conversion between plain text, CSV, JSON and XML.
//!
//! Two pairs are rewritten:
//!
//! | source | target | rule |
//! |--------|--------|------|
//! | `text/csv` | `json` | header row → array of objects, pretty-printed |
//! | `application/json` | `csv` | array of objects → header + rows |
//!
//! Every other pair passes the input bytes through unchanged; only the
//! content type attached by the caller differs.
//!
//! CSV handling is deliberately naive: fields are split on every comma and
//! written without quoting, so values containing commas or newlines do not
//! survive a round trip.

use crate::error::ConvertError;
use crate::formats::normalise_media_type;
use serde_json::{Map, Value};
use tracing::debug;

/// Convert structured text `bytes` from `source_media_type` to `target_format`.
///
/// # Errors
/// * [`ConvertError::Read`] when a rewritten pair receives non-UTF-8 input.
/// * [`ConvertError::Parse`] for invalid JSON or a CSV with no header line.
/// * [`ConvertError::Serialize`] when JSON bound for CSV is not a non-empty
///   array of objects.
pub fn convert_text(
    bytes: &[u8],
    source_media_type: &str,
    target_format: &str,
) -> Result<Vec<u8>, ConvertError> {
    let source = normalise_media_type(source_media_type);
    let target = target_format.to_ascii_lowercase();

    match (source.as_str(), target.as_str()) {
        ("text/csv", "json") => {
            let json = csv_to_json(read_utf8(bytes)?)?;
            debug!("CSV → JSON: {} → {} bytes", bytes.len(), json.len());
            Ok(json.into_bytes())
        }
        ("application/json", "csv") => {
            let csv = json_to_csv(read_utf8(bytes)?)?;
            debug!("JSON → CSV: {} → {} bytes", bytes.len(), csv.len());
            Ok(csv.into_bytes())
        }
        _ => {
            debug!("{source} → {target}: passthrough ({} bytes)", bytes.len());
            Ok(bytes.to_vec())
        }
    }
}

/// Convert CSV text into a pretty-printed JSON array of string-valued objects.
///
/// Blank lines are skipped. The first remaining line is the header; header
/// names and values are trimmed. Missing trailing values become `""` and
/// surplus values are ignored.
pub fn csv_to_json(content: &str) -> Result<String, ConvertError> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let header_line = lines.next().ok_or_else(|| ConvertError::Parse {
        detail: "CSV input has no header line".into(),
    })?;
    let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();

    let rows: Vec<Value> = lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            let mut record = Map::with_capacity(headers.len());
            for (idx, header) in headers.iter().enumerate() {
                let value = values.get(idx).copied().unwrap_or("");
                record.insert((*header).to_string(), Value::String(value.to_string()));
            }
            Value::Object(record)
        })
        .collect();

    serde_json::to_string_pretty(&rows).map_err(|e| ConvertError::Serialize {
        detail: e.to_string(),
    })
}

/// Convert a JSON array of objects into comma-separated lines.
///
/// The header is the first object's keys in document order. Each row emits
/// one field per header key; absent and `null` values are empty. Fields are
/// not quoted and rows are joined with `\n` (no trailing newline).
pub fn json_to_csv(content: &str) -> Result<String, ConvertError> {
    let data: Value = serde_json::from_str(content).map_err(|e| ConvertError::Parse {
        detail: format!("invalid JSON: {e}"),
    })?;

    let items = match data {
        Value::Array(items) => items,
        other => {
            return Err(ConvertError::Serialize {
                detail: format!("CSV output needs a JSON array, got {}", kind_of(&other)),
            })
        }
    };

    let first = items.first().ok_or_else(|| ConvertError::Serialize {
        detail: "CSV output needs at least one record, got an empty array".into(),
    })?;
    let headers: Vec<String> = first
        .as_object()
        .ok_or_else(|| ConvertError::Serialize {
            detail: format!("record 0 is {}, not an object", kind_of(first)),
        })?
        .keys()
        .cloned()
        .collect();

    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(headers.join(","));

    for (idx, item) in items.iter().enumerate() {
        let record = item.as_object().ok_or_else(|| ConvertError::Serialize {
            detail: format!("record {idx} is {}, not an object", kind_of(item)),
        })?;
        let row: Vec<String> = headers
            .iter()
            .map(|h| field_text(record.get(h)))
            .collect();
        lines.push(row.join(","));
    }

    Ok(lines.join("\n"))
}

fn read_utf8(bytes: &[u8]) -> Result<&str, ConvertError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ConvertError::Read {
        detail: e.to_string(),
    })?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
