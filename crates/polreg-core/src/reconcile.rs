//! # Reconciliation
//!
//! [`Workspace`] is the in-memory state of one run: the registry, every
//! policy document it references, the prior manifest and log, and the raw
//! schema bytes. [`reconcile()`] brings all of it up to date without
//! touching storage; the caller decides whether and where to write.
//!
//! Order of operations:
//!
//! 1. Each policy is digested (own `hash` excluded) and stamped.
//! 2. Each registry entry receives its policy's digest as `sha256`.
//! 3. The registry, now carrying fresh entry digests, is digested.
//! 4. The manifest records the registry and schema digests.
//! 5. Log entries are pointed at their policy's current digest.

use std::collections::HashMap;

use serde_yaml::Value;

use crate::digest::{sha256_raw, ContentDigest};
use crate::error::{DocumentError, PolregError};
use crate::manifest::update_manifest;
use crate::policy_log::{into_entries, sync_log};
use crate::registry::{policy_refs, registry_digest, stamp_entry, stamp_policy, PolicyRef};
use crate::temporal::Timestamp;

/// A policy document paired with the registry entry that references it.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    /// The registry entry's id and path.
    pub reference: PolicyRef,
    /// The policy document as loaded.
    pub document: Value,
}

/// Everything one reconciliation reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    /// The registry document.
    pub registry: Value,
    /// Policy documents, index-aligned with the registry's `policies`.
    pub policies: Vec<PolicyDocument>,
    /// The prior manifest, if one exists.
    pub manifest: Option<Value>,
    /// The prior policy log, if one exists.
    pub log: Option<Value>,
    /// The schema file, byte for byte.
    pub schema_bytes: Vec<u8>,
}

impl Workspace {
    /// Assemble a workspace, loading each policy the registry references.
    ///
    /// `load_policy` is called once per registry entry, in document order.
    /// Its error type only needs to absorb [`DocumentError`], so callers can
    /// use `anyhow::Error` or [`PolregError`].
    pub fn assemble<E, F>(
        registry: Value,
        manifest: Option<Value>,
        log: Option<Value>,
        schema_bytes: Vec<u8>,
        mut load_policy: F,
    ) -> Result<Self, E>
    where
        E: From<DocumentError>,
        F: FnMut(&PolicyRef) -> Result<Value, E>,
    {
        let mut policies = Vec::new();
        for reference in policy_refs(&registry)? {
            let document = load_policy(&reference)?;
            policies.push(PolicyDocument {
                reference,
                document,
            });
        }
        Ok(Self {
            registry,
            policies,
            manifest,
            log,
            schema_bytes,
        })
    }
}

/// What a reconciliation computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Digest of the registry after entry digests were written.
    pub registry_digest: ContentDigest,
    /// Digest of the raw schema bytes.
    pub schema_digest: ContentDigest,
    /// Each policy's digest, keyed by its id label, in registry order.
    pub policy_digests: Vec<(String, ContentDigest)>,
    /// Number of log entries whose digest was written.
    pub log_entries_updated: usize,
}

/// Bring every document in the workspace up to date.
///
/// On success `workspace.manifest` and `workspace.log` are always `Some`.
/// On error the workspace may be partially updated and must not be saved.
pub fn reconcile(
    workspace: &mut Workspace,
    reconciled_at: &Timestamp,
) -> Result<ReconcileReport, PolregError> {
    let mut log_entries = into_entries(workspace.log.take())?;

    let mut policy_digests = Vec::with_capacity(workspace.policies.len());
    let mut by_id = HashMap::new();
    for (index, policy) in workspace.policies.iter_mut().enumerate() {
        let label = policy.reference.label();
        let digest = stamp_policy(&mut policy.document, &label)?;
        stamp_entry(&mut workspace.registry, index, &digest)?;
        tracing::debug!(policy_id = %label, digest = %digest, "stamped policy");
        by_id.insert(policy.reference.id.clone(), digest);
        policy_digests.push((label, digest));
    }

    let registry_digest = registry_digest(&workspace.registry)?;
    let schema_digest = sha256_raw(&workspace.schema_bytes);

    workspace.manifest = Some(update_manifest(
        workspace.manifest.take(),
        &registry_digest,
        &schema_digest,
        reconciled_at,
    ));

    let log_entries_updated = sync_log(&mut log_entries, &by_id);
    workspace.log = Some(Value::Sequence(log_entries));

    tracing::info!(
        policies = policy_digests.len(),
        log_entries_updated,
        registry_digest = %registry_digest,
        "reconciled policy registry"
    );

    Ok(ReconcileReport {
        registry_digest,
        schema_digest,
        policy_digests,
        log_entries_updated,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::{ts, workspace, P1};
    use super::*;
    use crate::digest::digest_node;
    use crate::document::parse_yaml;
    use crate::manifest::recorded_registry_digest;
    use crate::registry::recorded_entry_digests;

    #[test]
    fn end_to_end_single_policy() {
        let mut ws = workspace(None, None);
        let report = reconcile(&mut ws, &ts()).unwrap();

        let expected_policy = digest_node(&parse_yaml(P1).unwrap()).unwrap();
        assert_eq!(report.policy_digests, vec![("p1".to_string(), expected_policy)]);

        let stamped = &ws.policies[0].document;
        assert_eq!(
            stamped.get("hash").and_then(Value::as_str),
            Some(expected_policy.to_string().as_str())
        );

        let entries = recorded_entry_digests(&ws.registry).unwrap();
        assert_eq!(entries, vec![("p1".to_string(), Some(expected_policy.to_string()))]);

        assert_eq!(report.registry_digest, digest_node(&ws.registry).unwrap());
        let manifest = ws.manifest.as_ref().unwrap();
        assert_eq!(
            recorded_registry_digest(manifest),
            Some(report.registry_digest.to_string().as_str())
        );
        assert_eq!(report.schema_digest, sha256_raw(b"{\"type\":\"object\"}"));
    }

    #[test]
    fn missing_manifest_and_log_get_defaults() {
        let mut ws = workspace(None, None);
        let report = reconcile(&mut ws, &ts()).unwrap();
        assert_eq!(report.log_entries_updated, 0);
        assert_eq!(ws.log, Some(Value::Sequence(Vec::new())));
        assert!(ws.manifest.as_ref().unwrap().as_mapping().is_some());
    }

    #[test]
    fn log_entries_follow_policy_digest() {
        let mut ws = workspace(None, Some("- policy_id: p1\n- policy_id: p9\n"));
        let report = reconcile(&mut ws, &ts()).unwrap();
        assert_eq!(report.log_entries_updated, 1);
        let log = ws.log.as_ref().unwrap().as_sequence().unwrap();
        let expected = report.policy_digests[0].1.to_string();
        assert_eq!(log[0].get("sha256").and_then(Value::as_str), Some(expected.as_str()));
        assert!(log[1].get("sha256").is_none());
    }

    #[test]
    fn integer_ids_reconcile_and_match_the_log() {
        let mut ws = Workspace::assemble::<PolregError, _>(
            parse_yaml("policies:\n  - id: 7\n    path: policies/p7.yaml\n").unwrap(),
            None,
            Some(parse_yaml("- policy_id: 7\n  event: adopted\n").unwrap()),
            Vec::new(),
            |_| parse_yaml(P1),
        )
        .unwrap();
        let report = reconcile(&mut ws, &ts()).unwrap();

        let expected = digest_node(&parse_yaml(P1).unwrap()).unwrap();
        assert_eq!(report.policy_digests, vec![("7".to_string(), expected)]);
        assert_eq!(report.log_entries_updated, 1);
        let log = ws.log.as_ref().unwrap().as_sequence().unwrap();
        assert_eq!(
            log[0].get("sha256").and_then(Value::as_str),
            Some(expected.to_string().as_str())
        );
        let entries = recorded_entry_digests(&ws.registry).unwrap();
        assert_eq!(entries, vec![("7".to_string(), Some(expected.to_string()))]);
    }

    #[test]
    fn rerun_is_stable() {
        let mut ws = workspace(None, None);
        let first = reconcile(&mut ws, &ts()).unwrap();
        let snapshot = ws.clone();
        let second = reconcile(&mut ws, &ts()).unwrap();
        assert_eq!(first, second);
        assert_eq!(snapshot, ws);
    }

    #[test]
    fn policy_key_order_does_not_change_digests() {
        let mut a = workspace(None, None);
        let mut b = workspace(None, None);
        b.policies[0].document = parse_yaml("rules: [a, b]\ntitle: Example\n").unwrap();
        assert_eq!(
            reconcile(&mut a, &ts()).unwrap().registry_digest,
            reconcile(&mut b, &ts()).unwrap().registry_digest
        );
    }

    #[test]
    fn non_sequence_log_is_fatal() {
        let mut ws = workspace(None, Some("policy_id: p1\n"));
        assert!(matches!(
            reconcile(&mut ws, &ts()).unwrap_err(),
            PolregError::Document(_)
        ));
    }

    #[test]
    fn assemble_propagates_loader_errors() {
        let registry = parse_yaml(super::fixtures::REGISTRY).unwrap();
        let result = Workspace::assemble::<PolregError, _>(registry, None, None, Vec::new(), |_| {
            Err(PolregError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "policies/p1.yaml",
            )))
        });
        assert!(matches!(result.unwrap_err(), PolregError::Io(_)));
    }
}
