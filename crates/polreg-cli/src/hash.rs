//! # Hash Subcommand
//!
//! Prints the canonical digest of a single YAML document as
//! `sha256:<hex>`. Defaults to the registry, which makes it the quickest way
//! to obtain the registry hash other repositories pin against.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use polreg_core::{digest_node, PolregError};
use polreg_core::registry::policy_digest;

use crate::config::Layout;
use crate::store::read_yaml;

/// Arguments for the `polreg hash` subcommand.
#[derive(Args, Debug, Default)]
pub struct HashArgs {
    /// YAML file to hash. Defaults to the registry.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Leave a top-level `hash` field out of the digest, as done when
    /// stamping policy documents.
    #[arg(long)]
    pub exclude_hash: bool,
}

/// Execute the hash subcommand, writing the digest line to `out`.
pub fn run_hash(args: &HashArgs, layout: &Layout, out: &mut impl Write) -> Result<u8> {
    let path = match &args.file {
        Some(file) => crate::resolve_path(file, &layout.root),
        None => layout.registry.clone(),
    };
    let doc = read_yaml(&path)?;

    let digest = if args.exclude_hash {
        policy_digest(&doc)
    } else {
        digest_node(&doc).map_err(PolregError::from)
    };
    let digest = digest.with_context(|| format!("failed to hash: {}", path.display()))?;

    writeln!(out, "{digest}")?;
    Ok(0)
}
