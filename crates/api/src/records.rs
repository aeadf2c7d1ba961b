//! Normalization of list responses into uniform records.
//!
//! List endpoints answer either with a JSON array or with one JSON object per
//! line, where lines may still carry the array's `[`, `,` and `]` punctuation.
//! Both shapes become the same ordered sequence of records.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A remote record: field name to value.
pub type Record = Map<String, Value>;

fn into_record(kind: &str, value: Value) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::malformed(
            kind,
            format!("expected an object, found {other}"),
        )),
    }
}

fn strip_line(line: &str) -> &str {
    line.trim()
        .trim_start_matches(['[', ','])
        .trim_end_matches([']', ','])
        .trim()
}

/// Parse a list response body into records, preserving order.
///
/// # Errors
///
/// Returns `MalformedPayload` when the body is neither a JSON document of
/// objects nor line-delimited objects.
pub fn parse_records(kind: &str, body: &str) -> Result<Vec<Record>> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }

    if let Ok(document) = serde_json::from_str::<Value>(trimmed) {
        return match document {
            Value::Array(items) => items.into_iter().map(|v| into_record(kind, v)).collect(),
            Value::Object(map) => Ok(vec![map]),
            other => Err(Error::malformed(
                kind,
                format!("expected a list of records, found {other}"),
            )),
        };
    }

    (1_usize..)
        .zip(trimmed.lines())
        .map(|(number, line)| (number, strip_line(line)))
        .filter(|(_, line)| !line.is_empty())
        .map(|(number, line)| {
            serde_json::from_str::<Value>(line)
                .map_err(|e| Error::malformed(kind, format!("line {number}: {e}")))
                .and_then(|v| into_record(kind, v))
        })
        .collect()
}

/// Decode records into typed values.
///
/// # Errors
///
/// Returns `MalformedPayload` naming the index of the first record that does
/// not decode.
pub fn decode_records<T: DeserializeOwned>(kind: &str, records: Vec<Record>) -> Result<Vec<T>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            serde_json::from_value(Value::Object(record))
                .map_err(|e| Error::malformed(kind, format!("record {i}: {e}")))
        })
        .collect()
}
