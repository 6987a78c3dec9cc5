//! # polreg-cli — Policy Registry Command-Line Interface
//!
//! Provides the `polreg` binary. Argument parsing and file I/O live here;
//! canonicalization, digests and document operations live in `polreg-core`.
//!
//! ## Subcommands
//!
//! - `polreg update` — Restamp policies and registry, refresh the manifest,
//!   sync the policy log, print `registry_hash=sha256:<hex>`.
//! - `polreg hash` — Print the canonical digest of one YAML document.
//! - `polreg verify` — Read-only check of every recorded digest.
//! - `polreg log` — Append a lifecycle event to the policy log.
//!
//! ```bash
//! polreg update
//! polreg update --reconciled-at 2025-11-09T00:00:00Z
//! polreg hash docs/policies/PolicyRegistry.yaml
//! polreg verify
//! ```

pub mod config;
pub mod event;
pub mod hash;
pub mod store;
pub mod update;
pub mod verify;

use std::path::{Path, PathBuf};

/// Resolve a path that may be relative to the repository root.
///
/// If the path is absolute, returns it as-is. If relative and the file
/// exists relative to `repo_root`, uses that. Otherwise returns the path
/// relative to the current directory.
pub fn resolve_path(path: &Path, repo_root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let repo_relative = repo_root.join(path);
    if repo_relative.exists() {
        repo_relative
    } else {
        path.to_path_buf()
    }
}
