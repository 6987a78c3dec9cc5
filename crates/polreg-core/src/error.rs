//! # Error Hierarchy
//!
//! Structured error types for the policy registry, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Document errors name the document and field that failed so the CLI can
//! report them without re-inspecting the tree.

use thiserror::Error;

/// Top-level error type for registry operations.
#[derive(Error, Debug)]
pub enum PolregError {
    /// Canonicalization failure during digest computation.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A document does not have the shape an operation requires.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// YAML parse or emit failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Mapping keys must be strings; YAML permits integers, booleans and
    /// nested nodes as keys, none of which have a stable sort order against
    /// strings.
    #[error("mapping key at {path} is not a string: {key}")]
    NonStringKey {
        /// Location of the offending mapping, as a JSON-pointer-like path.
        path: String,
        /// Debug rendering of the key.
        key: String,
    },

    /// NaN and infinities have no compact textual form.
    #[error("non-finite number at {path}: {value}")]
    NonFiniteNumber {
        /// Location of the offending scalar.
        path: String,
        /// The rejected value.
        value: f64,
    },

    /// Tagged YAML nodes (`!tag value`) are not plain data.
    #[error("unsupported YAML tag {tag} at {path}")]
    UnsupportedTag {
        /// Location of the tagged node.
        path: String,
        /// The tag text.
        tag: String,
    },

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Errors raised when a document lacks a field or has the wrong type.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DocumentError {
    /// A required field is absent.
    #[error("{document}: missing field `{field}`")]
    MissingField {
        /// Which document (e.g. "registry", "registry.policies[2]").
        document: String,
        /// Field name.
        field: String,
    },

    /// A field or document root has an unexpected node type.
    #[error("{document}: `{field}` must be a {expected}")]
    WrongType {
        /// Which document.
        document: String,
        /// Field name, or `<root>` for the document itself.
        field: String,
        /// Expected node kind.
        expected: &'static str,
    },

    /// A digest string is not of the form `sha256:<64 hex chars>`.
    #[error("malformed digest: {0}")]
    MalformedDigest(String),
}
