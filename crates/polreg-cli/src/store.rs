//! # Workspace Storage
//!
//! Reads a [`Workspace`] from disk according to a [`Layout`] and writes it
//! back. Documents are always written in full.

use std::path::Path;

use anyhow::{Context, Result};
use serde_yaml::Value;

use polreg_core::{parse_yaml_bytes, to_yaml, Workspace};

use crate::config::Layout;

/// Read and parse a YAML file that must exist.
pub fn read_yaml(path: &Path) -> Result<Value> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?;
    parse_yaml_bytes(&bytes).with_context(|| format!("failed to parse YAML: {}", path.display()))
}

/// Read and parse a YAML file that may be absent.
pub fn read_optional_yaml(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "optional document absent");
        return Ok(None);
    }
    read_yaml(path).map(Some)
}

/// Serialize and write a YAML document, creating parent directories.
pub fn write_yaml(path: &Path, value: &Value) -> Result<()> {
    let text =
        to_yaml(value).with_context(|| format!("failed to serialize: {}", path.display()))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
    }
    std::fs::write(path, text).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Load the registry, every referenced policy, manifest, log and schema.
pub fn load_workspace(layout: &Layout) -> Result<Workspace> {
    let registry = read_yaml(&layout.registry)?;
    let manifest = read_optional_yaml(&layout.manifest)?;
    let log = read_optional_yaml(&layout.log)?;
    let schema_bytes = std::fs::read(&layout.schema)
        .with_context(|| format!("failed to read schema: {}", layout.schema.display()))?;

    Workspace::assemble(registry, manifest, log, schema_bytes, |reference| {
        let path = layout.policy_path(&reference.path);
        tracing::debug!(policy_id = %reference.label(), path = %path.display(), "loading policy");
        read_yaml(&path).with_context(|| format!("policy {}", reference.label()))
    })
    .with_context(|| format!("failed to load registry: {}", layout.registry.display()))
}

/// Write every document of a reconciled workspace back to disk.
pub fn save_workspace(layout: &Layout, workspace: &Workspace) -> Result<()> {
    for policy in &workspace.policies {
        write_yaml(&layout.policy_path(&policy.reference.path), &policy.document)?;
    }
    write_yaml(&layout.registry, &workspace.registry)?;
    if let Some(manifest) = &workspace.manifest {
        write_yaml(&layout.manifest, manifest)?;
    }
    if let Some(log) = &workspace.log {
        write_yaml(&layout.log, log)?;
    }
    Ok(())
}
