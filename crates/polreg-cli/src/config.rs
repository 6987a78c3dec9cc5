//! # Configuration
//!
//! Where the registry, manifest, schema and policy log live. Every path has
//! a default matching the conventional repository layout, so a config file
//! is only needed when a repository deviates from it.
//!
//! ```yaml
//! # polreg.yaml
//! registry: docs/policies/PolicyRegistry.yaml
//! manifest: docs/policies/RegistryManifest.yaml
//! schema: schemas/policy.schema.json
//! log: logs/POLICY_LOG.yaml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Config file looked up at the repository root when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "polreg.yaml";

/// Directory whose presence marks the repository root.
pub const ROOT_MARKER: &str = "docs/policies";

/// Repository-relative locations of the documents `polreg` manages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolregConfig {
    /// The policy registry.
    pub registry: PathBuf,
    /// The registry manifest.
    pub manifest: PathBuf,
    /// The policy schema, hashed byte for byte.
    pub schema: PathBuf,
    /// The policy log.
    pub log: PathBuf,
}

impl Default for PolregConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("docs/policies/PolicyRegistry.yaml"),
            manifest: PathBuf::from("docs/policies/RegistryManifest.yaml"),
            schema: PathBuf::from("schemas/policy.schema.json"),
            log: PathBuf::from("logs/POLICY_LOG.yaml"),
        }
    }
}

impl PolregConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `polreg.yaml` at the
    /// repository root is used if present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>, repo_root: &Path) -> Result<Self> {
        let path = match explicit {
            Some(p) => crate::resolve_path(p, repo_root),
            None => {
                let candidate = repo_root.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    tracing::debug!("no config file; using default layout");
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let value = polreg_core::parse_yaml(&text)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        if value.is_null() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_value(value)
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        tracing::debug!(config = %path.display(), "loaded config");
        Ok(config)
    }
}

/// Absolute locations for one run, derived from a config and a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Repository root; policy paths in the registry are relative to it.
    pub root: PathBuf,
    /// The policy registry.
    pub registry: PathBuf,
    /// The registry manifest.
    pub manifest: PathBuf,
    /// The policy schema.
    pub schema: PathBuf,
    /// The policy log.
    pub log: PathBuf,
}

impl Layout {
    /// Resolve every configured path against `root`.
    pub fn new(config: &PolregConfig, root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            registry: root.join(&config.registry),
            manifest: root.join(&config.manifest),
            schema: root.join(&config.schema),
            log: root.join(&config.log),
        }
    }

    /// The default layout rooted at `root`.
    pub fn with_defaults(root: &Path) -> Self {
        Self::new(&PolregConfig::default(), root)
    }

    /// Where a registry entry's `path` points.
    pub fn policy_path(&self, entry_path: &str) -> PathBuf {
        self.root.join(entry_path)
    }
}

/// Walk up from `start` to the first directory containing `docs/policies`.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join(ROOT_MARKER).is_dir() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}
