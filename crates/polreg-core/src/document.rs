//! # Document I/O
//!
//! Text-level parsing and emission of YAML documents, plus the small set of
//! shape accessors the registry operations need.
//!
//! Documents are kept as `serde_yaml::Value` so that mappings retain their
//! insertion order when written back. Sorting only ever happens on the
//! canonical copy used for hashing.

use serde_yaml::{Mapping, Value};

use crate::error::{DocumentError, PolregError};

const BOM: char = '\u{feff}';

/// Parse YAML text, tolerating a leading UTF-8 byte-order mark.
///
/// Blank input yields `Value::Null`. Duplicate mapping keys are rejected by
/// the parser.
pub fn parse_yaml(text: &str) -> Result<Value, PolregError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml::from_str(text)?)
}

/// Decode raw file bytes as UTF-8 (BOM tolerated) and parse them as YAML.
pub fn parse_yaml_bytes(bytes: &[u8]) -> Result<Value, PolregError> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        PolregError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    parse_yaml(text)
}

/// Emit a document as YAML, keys in insertion order.
pub fn to_yaml(value: &Value) -> Result<String, PolregError> {
    Ok(serde_yaml::to_string(value)?)
}

/// Borrow a document root (or field) as a mapping.
pub fn expect_mapping<'a>(value: &'a Value, document: &str) -> Result<&'a Mapping, DocumentError> {
    value.as_mapping().ok_or_else(|| DocumentError::WrongType {
        document: document.to_string(),
        field: "<root>".to_string(),
        expected: "mapping",
    })
}

/// Mutably borrow a document root as a mapping.
pub fn expect_mapping_mut<'a>(
    value: &'a mut Value,
    document: &str,
) -> Result<&'a mut Mapping, DocumentError> {
    value.as_mapping_mut().ok_or_else(|| DocumentError::WrongType {
        document: document.to_string(),
        field: "<root>".to_string(),
        expected: "mapping",
    })
}

/// Read a required string field from a mapping.
pub fn required_str<'a>(
    map: &'a Mapping,
    field: &str,
    document: &str,
) -> Result<&'a str, DocumentError> {
    match map.get(field) {
        None => Err(DocumentError::MissingField {
            document: document.to_string(),
            field: field.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(DocumentError::WrongType {
            document: document.to_string(),
            field: field.to_string(),
            expected: "string",
        }),
    }
}

/// Read a required scalar field from a mapping.
///
/// Strings, numbers, booleans and null are accepted as-is; sequences,
/// mappings and tagged nodes are not.
pub fn required_scalar<'a>(
    map: &'a Mapping,
    field: &str,
    document: &str,
) -> Result<&'a Value, DocumentError> {
    match map.get(field) {
        None => Err(DocumentError::MissingField {
            document: document.to_string(),
            field: field.to_string(),
        }),
        Some(Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_)) => {
            Err(DocumentError::WrongType {
                document: document.to_string(),
                field: field.to_string(),
                expected: "scalar",
            })
        }
        Some(value) => Ok(value),
    }
}

/// Render a scalar for messages and reports: strings verbatim, everything
/// else in its YAML spelling.
pub fn scalar_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => format!("{other:?}"),
    }
}

/// Read an optional string field; non-string values count as absent.
pub fn optional_str<'a>(map: &'a Mapping, field: &str) -> Option<&'a str> {
    map.get(field).and_then(Value::as_str)
}

/// Insert or overwrite a field. An existing key keeps its position; a new
/// key is appended.
pub fn set_field(map: &mut Mapping, field: &str, value: Value) {
    map.insert(Value::String(field.to_string()), value);
}
