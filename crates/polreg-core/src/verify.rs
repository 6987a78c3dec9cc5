//! # Verification
//!
//! Read-only counterpart of [`reconcile()`](crate::reconcile::reconcile):
//! recomputes every digest and reports where the recorded values disagree.
//! Nothing in the workspace is modified.

use serde_yaml::Value;

use crate::digest::{sha256_raw, ContentDigest};
use crate::error::PolregError;
use crate::manifest::{recorded_registry_digest, recorded_schema_digest};
use crate::reconcile::Workspace;
use crate::registry::{
    invalid_semver_entries, policy_digest, recorded_entry_digests, registry_digest,
    POLICY_HASH_FIELD,
};

/// One disagreement between recorded and recomputed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A policy document has no `hash` field.
    PolicyHashMissing {
        /// Policy id.
        id: String,
    },
    /// A policy's `hash` differs from its recomputed digest.
    PolicyHashStale {
        /// Policy id.
        id: String,
        /// Value found in the document.
        recorded: String,
        /// Value recomputed now.
        computed: ContentDigest,
    },
    /// A registry entry has no `sha256` field.
    EntryDigestMissing {
        /// Policy id.
        id: String,
    },
    /// A registry entry's `sha256` differs from its policy's digest.
    EntryDigestMismatch {
        /// Policy id.
        id: String,
        /// Value found in the registry.
        recorded: String,
        /// The policy's recomputed digest.
        computed: ContentDigest,
    },
    /// The manifest's `registry_sha256` is absent or stale.
    RegistryDigestStale {
        /// Value found in the manifest, if any.
        recorded: Option<String>,
        /// Digest of the registry as stored.
        computed: ContentDigest,
    },
    /// The manifest's `schema_sha256` is absent or stale.
    SchemaDigestStale {
        /// Value found in the manifest, if any.
        recorded: Option<String>,
        /// Digest of the schema bytes.
        computed: ContentDigest,
    },
    /// A registry entry's declared version is not `MAJOR.MINOR.PATCH`.
    InvalidSemver {
        /// Policy id.
        id: String,
    },
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PolicyHashMissing { id } => write!(f, "policy {id}: no hash recorded"),
            Self::PolicyHashStale { id, recorded, computed } => {
                write!(f, "policy {id}: hash {recorded} != computed {computed}")
            }
            Self::EntryDigestMissing { id } => write!(f, "registry entry {id}: no sha256 recorded"),
            Self::EntryDigestMismatch { id, recorded, computed } => {
                write!(f, "registry entry {id}: sha256 {recorded} != policy digest {computed}")
            }
            Self::RegistryDigestStale { recorded, computed } => write!(
                f,
                "manifest registry_sha256 {} != computed {computed}",
                recorded.as_deref().unwrap_or("<absent>")
            ),
            Self::SchemaDigestStale { recorded, computed } => write!(
                f,
                "manifest schema_sha256 {} != computed {computed}",
                recorded.as_deref().unwrap_or("<absent>")
            ),
            Self::InvalidSemver { id } => write!(f, "registry entry {id}: invalid semver"),
        }
    }
}

/// Result of a verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Digest of the registry exactly as stored.
    pub registry_digest: ContentDigest,
    /// Every disagreement found, in check order.
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    /// True when recorded state matches recomputed state everywhere.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Recompute every digest in the workspace and compare against what is
/// recorded.
pub fn verify(workspace: &Workspace) -> Result<VerifyReport, PolregError> {
    let mut findings = Vec::new();
    let entries = recorded_entry_digests(&workspace.registry)?;

    for (policy, (_, recorded_entry)) in workspace.policies.iter().zip(entries) {
        let id = policy.reference.label();
        let computed = policy_digest(&policy.document)?;

        match policy.document.get(POLICY_HASH_FIELD).and_then(Value::as_str) {
            None => findings.push(Finding::PolicyHashMissing { id: id.clone() }),
            Some(recorded) if recorded != computed.to_string() => {
                findings.push(Finding::PolicyHashStale {
                    id: id.clone(),
                    recorded: recorded.to_string(),
                    computed,
                })
            }
            Some(_) => {}
        }

        match recorded_entry {
            None => findings.push(Finding::EntryDigestMissing { id: id.clone() }),
            Some(recorded) if recorded != computed.to_string() => {
                findings.push(Finding::EntryDigestMismatch {
                    id: id.clone(),
                    recorded,
                    computed,
                })
            }
            Some(_) => {}
        }
    }

    let registry_digest = registry_digest(&workspace.registry)?;
    let schema_digest = sha256_raw(&workspace.schema_bytes);
    let absent = Value::Null;
    let manifest = workspace.manifest.as_ref().unwrap_or(&absent);

    let recorded = recorded_registry_digest(manifest);
    if recorded != Some(registry_digest.to_string().as_str()) {
        findings.push(Finding::RegistryDigestStale {
            recorded: recorded.map(str::to_string),
            computed: registry_digest,
        });
    }
    let recorded = recorded_schema_digest(manifest);
    if recorded != Some(schema_digest.to_string().as_str()) {
        findings.push(Finding::SchemaDigestStale {
            recorded: recorded.map(str::to_string),
            computed: schema_digest,
        });
    }

    for id in invalid_semver_entries(&workspace.registry)? {
        findings.push(Finding::InvalidSemver { id });
    }

    tracing::debug!(findings = findings.len(), "verified policy registry");
    Ok(VerifyReport {
        registry_digest,
        findings,
    })
}
