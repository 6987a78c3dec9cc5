//! # Registry Manifest
//!
//! The manifest summarizes a reconciliation: which registry digest and which
//! schema digest were current, when, and by which verifier. Keys the
//! reconciler does not own are carried over untouched.

use serde_yaml::{Mapping, Value};

use crate::digest::ContentDigest;
use crate::document::{optional_str, set_field};
use crate::temporal::Timestamp;

/// Manifest format version written on every reconciliation.
pub const MANIFEST_VERSION: &str = "1.0.0";
/// Verifier identifier recorded in `verified_by`.
pub const VERIFIER_ID: &str = "verify-policy";

/// Field names owned by the reconciler.
pub mod fields {
    /// Manifest format version.
    pub const MANIFEST_VERSION: &str = "manifest_version";
    /// `sha256:<hex>` of the registry document.
    pub const REGISTRY_SHA256: &str = "registry_sha256";
    /// `sha256:<hex>` of the schema file's raw bytes.
    pub const SCHEMA_SHA256: &str = "schema_sha256";
    /// Reconciliation timestamp.
    pub const LAST_RECONCILED: &str = "last_reconciled";
    /// Verifier identifier.
    pub const VERIFIED_BY: &str = "verified_by";
}

/// Apply a reconciliation to the existing manifest.
///
/// An absent manifest, or one whose root is not a mapping, starts from an
/// empty mapping.
pub fn update_manifest(
    existing: Option<Value>,
    registry_digest: &ContentDigest,
    schema_digest: &ContentDigest,
    reconciled_at: &Timestamp,
) -> Value {
    let mut map = match existing {
        Some(Value::Mapping(map)) => map,
        Some(other) if !other.is_null() => {
            tracing::warn!("manifest root is not a mapping; starting from an empty manifest");
            Mapping::new()
        }
        _ => Mapping::new(),
    };

    set_field(&mut map, fields::MANIFEST_VERSION, Value::from(MANIFEST_VERSION));
    set_field(&mut map, fields::REGISTRY_SHA256, registry_digest.to_value());
    set_field(&mut map, fields::SCHEMA_SHA256, schema_digest.to_value());
    set_field(
        &mut map,
        fields::LAST_RECONCILED,
        Value::from(reconciled_at.to_canonical_string()),
    );
    set_field(&mut map, fields::VERIFIED_BY, Value::from(VERIFIER_ID));
    Value::Mapping(map)
}

/// The registry digest recorded in a manifest, if any.
pub fn recorded_registry_digest(manifest: &Value) -> Option<&str> {
    manifest
        .as_mapping()
        .and_then(|m| optional_str(m, fields::REGISTRY_SHA256))
}

/// The schema digest recorded in a manifest, if any.
pub fn recorded_schema_digest(manifest: &Value) -> Option<&str> {
    manifest
        .as_mapping()
        .and_then(|m| optional_str(m, fields::SCHEMA_SHA256))
}
