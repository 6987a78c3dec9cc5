//! # Policy Registry
//!
//! Operations over the registry document (`policies: [{id, path, ...}]`) and
//! the policy documents it references.
//!
//! A policy's digest never covers its own `hash` field: the field is dropped
//! from a scratch copy before canonicalization, so stamping is idempotent.
//! The registry digest, by contrast, is taken after every entry carries its
//! fresh `sha256`, and so commits to each policy digest.

use serde_yaml::{Mapping, Sequence, Value};

use crate::digest::{digest_node, ContentDigest};
use crate::document::{
    expect_mapping, expect_mapping_mut, optional_str, required_scalar, required_str, scalar_label,
    set_field,
};
use crate::error::{DocumentError, PolregError};

/// Field written into each policy document.
pub const POLICY_HASH_FIELD: &str = "hash";
/// Field written into each registry entry.
pub const ENTRY_DIGEST_FIELD: &str = "sha256";
/// Registry field holding the policy entries.
pub const POLICIES_FIELD: &str = "policies";

/// A registry entry's identity and the location of its policy document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRef {
    /// Policy identifier, e.g. `AIP-1.0.0`. Any scalar is accepted; log
    /// entries match it by value through `policy_id`.
    pub id: Value,
    /// Path to the policy document, relative to the repository root.
    pub path: String,
}

impl PolicyRef {
    /// The id as displayed in logs, reports and error messages.
    pub fn label(&self) -> String {
        scalar_label(&self.id)
    }
}

fn entry_label(map: &Mapping, document: &str) -> Result<String, DocumentError> {
    Ok(scalar_label(required_scalar(map, "id", document)?))
}

fn policies(registry: &Value) -> Result<&Sequence, DocumentError> {
    let root = expect_mapping(registry, "registry")?;
    match root.get(POLICIES_FIELD) {
        None => Err(DocumentError::MissingField {
            document: "registry".to_string(),
            field: POLICIES_FIELD.to_string(),
        }),
        Some(Value::Sequence(seq)) => Ok(seq),
        Some(_) => Err(DocumentError::WrongType {
            document: "registry".to_string(),
            field: POLICIES_FIELD.to_string(),
            expected: "sequence",
        }),
    }
}

fn entry_mut(registry: &mut Value, index: usize) -> Result<&mut Mapping, DocumentError> {
    let root = expect_mapping_mut(registry, "registry")?;
    let document = format!("registry.{POLICIES_FIELD}[{index}]");
    root.get_mut(POLICIES_FIELD)
        .and_then(Value::as_sequence_mut)
        .and_then(|seq| seq.get_mut(index))
        .ok_or_else(|| DocumentError::MissingField {
            document: "registry".to_string(),
            field: format!("{POLICIES_FIELD}[{index}]"),
        })?
        .as_mapping_mut()
        .ok_or(DocumentError::WrongType {
            document,
            field: "<root>".to_string(),
            expected: "mapping",
        })
}

/// List the registry's policy entries in document order.
///
/// Every entry must be a mapping with a scalar `id` and a string `path`.
pub fn policy_refs(registry: &Value) -> Result<Vec<PolicyRef>, DocumentError> {
    policies(registry)?
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let document = format!("registry.{POLICIES_FIELD}[{i}]");
            let map = expect_mapping(entry, &document)?;
            Ok(PolicyRef {
                id: required_scalar(map, "id", &document)?.clone(),
                path: required_str(map, "path", &document)?.to_string(),
            })
        })
        .collect()
}

/// Digest a policy document with its own `hash` field excluded.
pub fn policy_digest(doc: &Value) -> Result<ContentDigest, PolregError> {
    let mut scratch = doc.clone();
    if let Some(map) = scratch.as_mapping_mut() {
        map.remove(POLICY_HASH_FIELD);
    }
    Ok(digest_node(&scratch)?)
}

/// Compute a policy's digest and record it in the document's `hash` field.
pub fn stamp_policy(doc: &mut Value, policy_id: &str) -> Result<ContentDigest, PolregError> {
    let digest = policy_digest(doc)?;
    let map = expect_mapping_mut(doc, &format!("policy {policy_id}"))?;
    set_field(map, POLICY_HASH_FIELD, digest.to_value());
    Ok(digest)
}

/// Record a policy digest in the registry entry at `index`.
pub fn stamp_entry(
    registry: &mut Value,
    index: usize,
    digest: &ContentDigest,
) -> Result<(), DocumentError> {
    let entry = entry_mut(registry, index)?;
    set_field(entry, ENTRY_DIGEST_FIELD, digest.to_value());
    Ok(())
}

/// Digest of the registry document as it currently stands.
pub fn registry_digest(registry: &Value) -> Result<ContentDigest, PolregError> {
    Ok(digest_node(registry)?)
}

/// The `sha256` recorded on each entry, paired with the entry's id, in
/// document order.
pub fn recorded_entry_digests(registry: &Value) -> Result<Vec<(String, Option<String>)>, DocumentError> {
    policies(registry)?
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let document = format!("registry.{POLICIES_FIELD}[{i}]");
            let map = expect_mapping(entry, &document)?;
            Ok((
                entry_label(map, &document)?,
                optional_str(map, ENTRY_DIGEST_FIELD).map(str::to_string),
            ))
        })
        .collect()
}

/// Whether `version` has the shape `MAJOR.MINOR.PATCH` with decimal parts.
pub fn is_semver(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Ids of registry entries whose declared version is not `MAJOR.MINOR.PATCH`.
///
/// The declared version is `current_version`, falling back to `semver`.
pub fn invalid_semver_entries(registry: &Value) -> Result<Vec<String>, DocumentError> {
    let mut bad = Vec::new();
    for (i, entry) in policies(registry)?.iter().enumerate() {
        let document = format!("registry.{POLICIES_FIELD}[{i}]");
        let map = expect_mapping(entry, &document)?;
        let declared = map
            .get("current_version")
            .filter(|v| !v.is_null())
            .or_else(|| map.get("semver"));
        let ok = declared.and_then(Value::as_str).map(is_semver).unwrap_or(false);
        if !ok {
            bad.push(entry_label(map, &document)?);
        }
    }
    Ok(bad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{parse_yaml, to_yaml};

    fn keys_of(doc: &Value) -> Vec<String> {
        doc.as_mapping()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str().unwrap().to_string())
            .collect()
    }

    const REGISTRY: &str = "\
version: 1.0.0
policies:
  - id: p1
    path: policies/p1.yaml
    current_version: 1.0.0
  - id: p2
    path: policies/p2.yaml
    semver: 2.1.0
";

    #[test]
    fn lists_policy_refs_in_order() {
        let reg = parse_yaml(REGISTRY).unwrap();
        let refs = policy_refs(&reg).unwrap();
        assert_eq!(
            refs,
            vec![
                PolicyRef { id: "p1".into(), path: "policies/p1.yaml".into() },
                PolicyRef { id: "p2".into(), path: "policies/p2.yaml".into() },
            ]
        );
    }

    #[test]
    fn non_string_ids_are_kept_as_scalars() {
        let reg = parse_yaml("policies:\n  - {id: 7, path: policies/p7.yaml, semver: '1'}\n").unwrap();
        let refs = policy_refs(&reg).unwrap();
        assert_eq!(refs[0].id, Value::Number(7i64.into()));
        assert_eq!(refs[0].label(), "7");
        assert_eq!(recorded_entry_digests(&reg).unwrap(), vec![("7".to_string(), None)]);
        assert_eq!(invalid_semver_entries(&reg).unwrap(), vec!["7"]);
    }

    #[test]
    fn collection_id_is_an_error() {
        let reg = parse_yaml("policies:\n  - {id: [a], path: a.yaml}\n").unwrap();
        assert!(matches!(
            policy_refs(&reg).unwrap_err(),
            DocumentError::WrongType { expected: "scalar", .. }
        ));
    }

    #[test]
    fn missing_policies_field_is_an_error() {
        let reg = parse_yaml("version: 1\n").unwrap();
        assert!(matches!(
            policy_refs(&reg).unwrap_err(),
            DocumentError::MissingField { .. }
        ));
    }

    #[test]
    fn entry_without_path_is_an_error() {
        let reg = parse_yaml("policies:\n  - id: p1\n").unwrap();
        let err = policy_refs(&reg).unwrap_err();
        assert_eq!(
            err,
            DocumentError::MissingField {
                document: "registry.policies[0]".into(),
                field: "path".into()
            }
        );
    }

    #[test]
    fn stamp_policy_appends_hash_field() {
        let mut doc = parse_yaml("title: Example\nrules: [a, b]\n").unwrap();
        let before = digest_node(&doc).unwrap();
        let digest = stamp_policy(&mut doc, "p1").unwrap();
        assert_eq!(digest, before);
        let keys = keys_of(&doc);
        assert_eq!(keys, vec!["title", "rules", "hash"]);
        assert_eq!(doc.get("hash").and_then(Value::as_str), Some(digest.to_string().as_str()));
    }

    #[test]
    fn stored_hash_matches_hash_excluded_digest() {
        let mut doc = parse_yaml("title: Example\nrules: [a, b]\n").unwrap();
        let digest = stamp_policy(&mut doc, "p1").unwrap();
        let stored = doc.get("hash").and_then(Value::as_str).unwrap();
        assert_eq!(stored, digest.to_string());
        assert_eq!(policy_digest(&doc).unwrap(), digest);
    }

    #[test]
    fn stamping_twice_is_idempotent() {
        let mut doc = parse_yaml("title: Example\nhash: sha256:stale\nrules: [a]\n").unwrap();
        let first = stamp_policy(&mut doc, "p1").unwrap();
        let second = stamp_policy(&mut doc, "p1").unwrap();
        assert_eq!(first, second);
        // Existing field keeps its position.
        assert_eq!(keys_of(&doc), vec!["title", "hash", "rules"]);
        let reparsed = parse_yaml(&to_yaml(&doc).unwrap()).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn stamp_policy_rejects_non_mapping() {
        let mut doc = parse_yaml("- a\n").unwrap();
        assert!(stamp_policy(&mut doc, "p1").is_err());
    }

    #[test]
    fn stamp_entry_sets_sha256() {
        let mut reg = parse_yaml(REGISTRY).unwrap();
        let d = digest_node(&parse_yaml("x: 1").unwrap()).unwrap();
        stamp_entry(&mut reg, 1, &d).unwrap();
        let recorded = recorded_entry_digests(&reg).unwrap();
        assert_eq!(recorded[0], ("p1".to_string(), None));
        assert_eq!(recorded[1], ("p2".to_string(), Some(d.to_string())));
        assert!(stamp_entry(&mut reg, 5, &d).is_err());
    }

    #[test]
    fn semver_shape() {
        assert!(is_semver("1.0.0"));
        assert!(is_semver("10.20.300"));
        assert!(!is_semver("1.0"));
        assert!(!is_semver("1.0.0-rc1"));
        assert!(!is_semver("v1.0.0"));
        assert!(!is_semver("1..0"));
    }

    #[test]
    fn invalid_semver_entries_uses_fallback_field() {
        let reg = parse_yaml(REGISTRY).unwrap();
        assert!(invalid_semver_entries(&reg).unwrap().is_empty());

        let reg = parse_yaml(
            "policies:\n  - {id: a, path: a.yaml, current_version: '1.0'}\n  - {id: b, path: b.yaml}\n",
        )
        .unwrap();
        assert_eq!(invalid_semver_entries(&reg).unwrap(), vec!["a", "b"]);
    }
}
