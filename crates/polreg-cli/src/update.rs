//! # Update Subcommand
//!
//! Recomputes every policy digest, stamps the registry, refreshes the
//! manifest and synchronizes the policy log, then prints
//! `registry_hash=sha256:<hex>`.

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Args;

use polreg_core::{reconcile, Timestamp};

use crate::config::Layout;
use crate::store::{load_workspace, save_workspace};

/// Arguments for the `polreg update` subcommand.
#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Pin the `last_reconciled` timestamp (RFC 3339).
    #[arg(long, value_name = "TIMESTAMP")]
    pub reconciled_at: Option<String>,

    /// Compute and print digests without writing any file.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the update subcommand.
///
/// Writes `registry_hash=sha256:<hex>` to `out`. Returns exit code 0 on
/// success; any failure is an error.
pub fn run_update(args: &UpdateArgs, layout: &Layout, out: &mut impl Write) -> Result<u8> {
    let reconciled_at = resolve_reconciled_at(args.reconciled_at.as_deref())?;
    let mut workspace = load_workspace(layout)?;

    let report = reconcile(&mut workspace, &reconciled_at).context("reconciliation failed")?;

    if args.dry_run {
        tracing::info!("dry run; no files written");
    } else {
        save_workspace(layout, &workspace)?;
    }

    writeln!(out, "registry_hash={}", report.registry_digest)?;
    Ok(0)
}

/// Resolve the reconciliation timestamp.
///
/// Priority:
/// 1. Explicit --reconciled-at flag
/// 2. SOURCE_DATE_EPOCH environment variable
/// 3. Current UTC time
pub fn resolve_reconciled_at(explicit: Option<&str>) -> Result<Timestamp> {
    if let Some(ts) = explicit {
        return Timestamp::parse(ts).with_context(|| format!("invalid --reconciled-at: {ts}"));
    }

    if let Ok(epoch_str) = std::env::var("SOURCE_DATE_EPOCH") {
        let Ok(epoch) = epoch_str.trim().parse::<i64>() else {
            bail!("SOURCE_DATE_EPOCH is not an integer: {epoch_str}");
        };
        if let Some(ts) = Timestamp::from_unix_seconds(epoch) {
            return Ok(ts);
        }
        bail!("SOURCE_DATE_EPOCH out of range: {epoch}");
    }

    Ok(Timestamp::now())
}
