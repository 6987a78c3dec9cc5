//! # Policy Log
//!
//! The policy log is a YAML sequence of historical entries. Reconciliation
//! only ever touches the `sha256` field of entries that name a known policy
//! through `policy_id`; everything else in an entry is history and stays as
//! written.

use std::collections::HashMap;

use serde_yaml::{Mapping, Sequence, Value};

use crate::digest::ContentDigest;
use crate::document::set_field;
use crate::error::DocumentError;
use crate::temporal::Timestamp;

/// Entry field naming the policy an entry refers to.
pub const POLICY_ID_FIELD: &str = "policy_id";
/// Entry field synchronized to the policy's current digest.
pub const DIGEST_FIELD: &str = "sha256";

/// Interpret a loaded log document as a sequence.
///
/// An absent or empty log is an empty sequence. Any other non-sequence root
/// is an error.
pub fn into_entries(log: Option<Value>) -> Result<Sequence, DocumentError> {
    match log {
        None | Some(Value::Null) => Ok(Sequence::new()),
        Some(Value::Sequence(seq)) => Ok(seq),
        Some(_) => Err(DocumentError::WrongType {
            document: "policy log".to_string(),
            field: "<root>".to_string(),
            expected: "sequence",
        }),
    }
}

/// Point every entry that references a known policy at its current digest.
///
/// `digests` is keyed by registry id; `policy_id` is compared by value, so
/// `policy_id: 7` matches `id: 7` but not `id: "7"`. Entries that are not
/// mappings, lack `policy_id`, or name an unknown policy are left unchanged.
/// Returns the number of entries written.
pub fn sync_log(entries: &mut Sequence, digests: &HashMap<Value, ContentDigest>) -> usize {
    let mut updated = 0;
    for entry in entries.iter_mut() {
        let Some(map) = entry.as_mapping_mut() else {
            continue;
        };
        let Some(digest) = map.get(POLICY_ID_FIELD).and_then(|id| digests.get(id)) else {
            continue;
        };
        set_field(map, DIGEST_FIELD, digest.to_value());
        updated += 1;
    }
    updated
}

/// A registry lifecycle event appended to the policy log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// When the event happened.
    pub ts: Timestamp,
    /// Event name, e.g. `policy_registry_initialized`.
    pub event: String,
    /// Registry version the event refers to.
    pub registry_version: String,
    /// Registry digest at the time of the event, possibly empty.
    pub registry_hash: String,
    /// Policy identifiers covered by the event.
    pub policies: Vec<String>,
}

impl LogEvent {
    /// Default event name when none is given.
    pub const DEFAULT_EVENT: &'static str = "policy_registry_initialized";
    /// Default registry version when none is given.
    pub const DEFAULT_REGISTRY_VERSION: &'static str = "1.0.0";
    /// Default policy list when none is given.
    pub const DEFAULT_POLICIES: [&'static str; 2] = ["AIP-1.0.0", "APR-1.0.0"];

    /// Render the event as a log entry mapping.
    pub fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        set_field(&mut map, "ts", Value::from(self.ts.to_canonical_string()));
        set_field(&mut map, "event", Value::from(self.event.as_str()));
        set_field(
            &mut map,
            "registry_version",
            Value::from(self.registry_version.as_str()),
        );
        set_field(&mut map, "registry_hash", Value::from(self.registry_hash.as_str()));
        set_field(
            &mut map,
            "policies",
            Value::Sequence(self.policies.iter().map(|p| Value::from(p.as_str())).collect()),
        );
        Value::Mapping(map)
    }
}

/// Append an event to the log.
pub fn append_event(entries: &mut Sequence, event: &LogEvent) {
    entries.push(event.to_value());
}
