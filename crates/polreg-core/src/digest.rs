//! # Content Digests
//!
//! Defines [`ContentDigest`], the SHA-256 value recorded in policy files,
//! registry entries, the manifest and the policy log.
//!
//! Document digests can only be computed from [`CanonicalBytes`], so every
//! recorded `sha256:<hex>` was produced from a canonicalized tree. The one
//! raw-bytes path, [`sha256_raw()`], exists for the schema file, which is
//! hashed exactly as stored and never parsed.

use serde_yaml::Value;
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::{CanonicalizationError, DocumentError};

/// Prefix used whenever a digest is written into a document.
pub const SHA256_PREFIX: &str = "sha256:";

/// A 32-byte SHA-256 digest.
///
/// Renders as `sha256:<64 lowercase hex chars>` via `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest {
    bytes: [u8; 32],
}

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// The raw 32-byte digest value.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Return the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a bare 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, DocumentError> {
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DocumentError::MalformedDigest(hex.to_string()));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| DocumentError::MalformedDigest(hex.to_string()))?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|_| DocumentError::MalformedDigest(hex.to_string()))?;
        }
        Ok(Self { bytes })
    }

    /// Parse a recorded digest of the form `sha256:<hex>`.
    pub fn parse_prefixed(s: &str) -> Result<Self, DocumentError> {
        let hex = s
            .strip_prefix(SHA256_PREFIX)
            .ok_or_else(|| DocumentError::MalformedDigest(s.to_string()))?;
        Self::from_hex(hex)
    }

    /// The digest as a YAML string node, ready to be written into a document.
    pub fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{SHA256_PREFIX}{}", self.to_hex())
    }
}

impl std::str::FromStr for ContentDigest {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_prefixed(s)
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    sha256_raw(data.as_bytes())
}

/// Compute a SHA-256 digest over raw bytes.
///
/// Only for content that is recorded byte-for-byte (the schema file).
pub fn sha256_raw(bytes: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    ContentDigest::from_bytes(out)
}

/// Canonicalize a document node and digest it.
pub fn digest_node(node: &Value) -> Result<ContentDigest, CanonicalizationError> {
    Ok(sha256_digest(&CanonicalBytes::from_node(node)?))
}

/// Canonicalize a document node and return its 64-char lowercase hex digest.
pub fn digest_hex(node: &Value) -> Result<String, CanonicalizationError> {
    Ok(digest_node(node)?.to_hex())
}
