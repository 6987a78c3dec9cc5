//! # Canonical Serialization
//!
//! This module defines [`CanonicalBytes`], the sole construction path for bytes
//! used in digest computation across the registry tooling.
//!
//! ## Invariant
//!
//! The inner `Vec<u8>` is private. The only way to construct `CanonicalBytes` is
//! through [`CanonicalBytes::from_node()`], which runs [`canonicalize()`] before
//! serialization. Digests therefore cannot be computed over a document whose
//! keys are still in file order.
//!
//! ## Canonical Form
//!
//! 1. Mapping keys sorted ascending by code point, at every depth.
//! 2. Sequence order preserved; elements canonicalized recursively.
//! 3. Scalars (string, integer, float, bool, null) unchanged.
//! 4. Compact separators (`,` and `:`), no whitespace.
//! 5. Non-ASCII text emitted as UTF-8, never `\u`-escaped.
//!
//! Non-string keys, non-finite floats and tagged YAML nodes are rejected
//! rather than coerced.

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by canonicalization of a document tree.
///
/// The inner `Vec<u8>` is private, so downstream code cannot construct
/// `CanonicalBytes` except through [`CanonicalBytes::from_node()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from an already-loaded document node.
    pub fn from_node(node: &YamlValue) -> Result<Self, CanonicalizationError> {
        let canonical = canonicalize(node)?;
        Ok(Self(serde_json::to_vec(&canonical)?))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the canonical bytes as text. Always valid UTF-8.
    pub fn as_str(&self) -> &str {
        // serde_json only ever emits UTF-8.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Rewrite a document node into its canonical form.
///
/// The result is a JSON value whose objects were populated in sorted key
/// order, so serialization is stable whichever map backing `serde_json`
/// was built with.
pub fn canonicalize(node: &YamlValue) -> Result<JsonValue, CanonicalizationError> {
    canonicalize_at(node, "")
}

fn canonicalize_at(node: &YamlValue, path: &str) -> Result<JsonValue, CanonicalizationError> {
    match node {
        YamlValue::Null => Ok(JsonValue::Null),
        YamlValue::Bool(b) => Ok(JsonValue::Bool(*b)),
        YamlValue::String(s) => Ok(JsonValue::String(s.clone())),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(JsonValue::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(JsonValue::from(u))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                serde_json::Number::from_f64(f)
                    .map(JsonValue::Number)
                    .ok_or_else(|| CanonicalizationError::NonFiniteNumber {
                        path: display_path(path),
                        value: f,
                    })
            }
        }
        YamlValue::Sequence(items) => {
            let canonical: Result<Vec<_>, _> = items
                .iter()
                .enumerate()
                .map(|(i, item)| canonicalize_at(item, &format!("{path}/{i}")))
                .collect();
            Ok(JsonValue::Array(canonical?))
        }
        YamlValue::Mapping(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (k, v) in map {
                let YamlValue::String(key) = k else {
                    return Err(CanonicalizationError::NonStringKey {
                        path: display_path(path),
                        key: format!("{k:?}"),
                    });
                };
                entries.push((key.as_str(), v));
            }
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut out = serde_json::Map::new();
            for (key, v) in entries {
                out.insert(key.to_string(), canonicalize_at(v, &format!("{path}/{key}"))?);
            }
            Ok(JsonValue::Object(out))
        }
        YamlValue::Tagged(tagged) => Err(CanonicalizationError::UnsupportedTag {
            path: display_path(path),
            tag: tagged.tag.to_string(),
        }),
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> YamlValue {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn sorts_top_level_keys() {
        let cb = CanonicalBytes::from_node(&yaml("b: 2\na: 1\nc: hello\n")).unwrap();
        assert_eq!(cb.as_str(), r#"{"a":1,"b":2,"c":"hello"}"#);
    }

    #[test]
    fn sorts_nested_keys_and_keeps_sequence_order() {
        let doc = yaml("outer:\n  b: 2\n  a: 1\nlist: [3, 2, 1]\n");
        let cb = CanonicalBytes::from_node(&doc).unwrap();
        assert_eq!(cb.as_str(), r#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#);
    }

    #[test]
    fn mappings_inside_sequences_are_sorted() {
        let doc = yaml("- {z: 1, a: 2}\n- {y: 3, b: 4}\n");
        let cb = CanonicalBytes::from_node(&doc).unwrap();
        assert_eq!(cb.as_str(), r#"[{"a":2,"z":1},{"b":4,"y":3}]"#);
    }

    #[test]
    fn scalars_pass_through() {
        let doc = yaml("s: text\ni: -42\nf: 1.5\nt: true\nn: null\n");
        let cb = CanonicalBytes::from_node(&doc).unwrap();
        assert_eq!(cb.as_str(), r#"{"f":1.5,"i":-42,"n":null,"s":"text","t":true}"#);
    }

    #[test]
    fn unicode_is_not_escaped() {
        let doc = yaml("name: \"caf\u{00e9} \u{2603}\"\n");
        let cb = CanonicalBytes::from_node(&doc).unwrap();
        assert_eq!(cb.as_str(), "{\"name\":\"caf\u{00e9} \u{2603}\"}");
    }

    #[test]
    fn sort_is_by_code_point() {
        let doc = yaml("b: 1\nB: 2\n\u{00e9}: 3\na: 4\n");
        let cb = CanonicalBytes::from_node(&doc).unwrap();
        assert_eq!(cb.as_str(), "{\"B\":2,\"a\":4,\"b\":1,\"\u{00e9}\":3}");
    }

    #[test]
    fn empty_containers() {
        assert_eq!(CanonicalBytes::from_node(&yaml("{}")).unwrap().as_bytes(), b"{}");
        assert_eq!(CanonicalBytes::from_node(&yaml("[]")).unwrap().as_bytes(), b"[]");
    }

    #[test]
    fn integer_key_rejected() {
        let err = canonicalize(&yaml("outer:\n  1: one\n")).unwrap_err();
        match err {
            CanonicalizationError::NonStringKey { path, .. } => assert_eq!(path, "/outer"),
            other => panic!("expected NonStringKey, got: {other}"),
        }
    }

    #[test]
    fn non_finite_float_rejected() {
        let err = canonicalize(&yaml("x: .nan\n")).unwrap_err();
        assert!(matches!(err, CanonicalizationError::NonFiniteNumber { .. }));
        let err = canonicalize(&yaml("list: [1, .inf]\n")).unwrap_err();
        match err {
            CanonicalizationError::NonFiniteNumber { path, .. } => assert_eq!(path, "/list/1"),
            other => panic!("expected NonFiniteNumber, got: {other}"),
        }
    }

    #[test]
    fn tagged_node_rejected() {
        let err = canonicalize(&yaml("x: !custom value\n")).unwrap_err();
        assert!(matches!(err, CanonicalizationError::UnsupportedTag { .. }));
    }
}
