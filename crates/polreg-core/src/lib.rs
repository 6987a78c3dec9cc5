#![deny(missing_docs)]

//! # polreg-core — Canonical Hashing for the Policy Registry
//!
//! This crate holds everything the `polreg` CLI does that is not file I/O:
//! canonicalization, SHA-256 digests, and the registry, manifest and policy
//! log operations built on them. It has no internal crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **[`CanonicalBytes`] is the sole path to document digests.** Mapping
//!    keys are sorted at every depth before serialization, so two documents
//!    that differ only in key order always hash the same.
//!
//! 2. **Documents stay in file order.** Loaded YAML is kept as
//!    `serde_yaml::Value`, whose mappings preserve insertion order. Only the
//!    canonical copy made for hashing is sorted.
//!
//! 3. **Pure reconciliation.** [`reconcile()`] and [`verify()`] operate on an
//!    in-memory [`Workspace`]; loading and saving belong to the caller.
//!
//! 4. **[`PolregError`] hierarchy.** Structured errors with `thiserror`, no
//!    `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod document;
pub mod error;
pub mod manifest;
pub mod policy_log;
pub mod reconcile;
pub mod registry;
pub mod temporal;
pub mod verify;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::{canonicalize, CanonicalBytes};
pub use digest::{digest_hex, digest_node, sha256_digest, sha256_raw, ContentDigest};
pub use document::{parse_yaml, parse_yaml_bytes, to_yaml};
pub use error::{CanonicalizationError, DocumentError, PolregError};
pub use policy_log::LogEvent;
pub use reconcile::{reconcile, PolicyDocument, ReconcileReport, Workspace};
pub use registry::PolicyRef;
pub use temporal::Timestamp;
pub use verify::{verify, Finding, VerifyReport};
