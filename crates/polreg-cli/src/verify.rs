//! # Verify Subcommand
//!
//! Read-only check that every recorded digest matches what `update` would
//! write, and that registry entries declare `MAJOR.MINOR.PATCH` versions.

use anyhow::{Context, Result};
use clap::Args;

use polreg_core::verify;

use crate::config::Layout;
use crate::store::load_workspace;

/// Arguments for the `polreg verify` subcommand.
#[derive(Args, Debug, Default)]
pub struct VerifyArgs {
    /// Print only the final OK/FAIL line.
    #[arg(long, short)]
    pub quiet: bool,
}

/// Execute the verify subcommand.
///
/// Returns exit code: 0 when everything matches, 1 when any finding exists.
pub fn run_verify(args: &VerifyArgs, layout: &Layout) -> Result<u8> {
    let workspace = load_workspace(layout)?;
    let report = verify(&workspace).context("verification failed")?;

    if report.is_clean() {
        println!(
            "OK: {} policies verified, registry_hash={}",
            workspace.policies.len(),
            report.registry_digest
        );
        return Ok(0);
    }

    if !args.quiet {
        for finding in &report.findings {
            println!("  {finding}");
        }
    }
    println!("FAIL: {} finding(s)", report.findings.len());
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::{run_update, UpdateArgs};

    fn seed(root: &std::path::Path) -> Layout {
        let layout = Layout::with_defaults(root);
        std::fs::create_dir_all(root.join("docs/policies")).unwrap();
        std::fs::create_dir_all(root.join("schemas")).unwrap();
        std::fs::create_dir_all(root.join("policies")).unwrap();
        std::fs::write(&layout.schema, "{}").unwrap();
        std::fs::write(
            &layout.registry,
            "policies:\n- id: p1\n  path: policies/p1.yaml\n  current_version: 1.0.0\n",
        )
        .unwrap();
        std::fs::write(root.join("policies/p1.yaml"), "title: Example\n").unwrap();
        layout
    }

    #[test]
    fn unreconciled_repo_fails() {
        let dir = tempfile::tempdir().unwrap();
        let layout = seed(dir.path());
        assert_eq!(run_verify(&VerifyArgs::default(), &layout).unwrap(), 1);
    }

    #[test]
    fn reconciled_repo_passes_until_edited() {
        let dir = tempfile::tempdir().unwrap();
        let layout = seed(dir.path());
        let update = UpdateArgs {
            reconciled_at: Some("2025-11-09T00:00:00Z".into()),
            dry_run: false,
        };
        run_update(&update, &layout, &mut Vec::new()).unwrap();
        assert_eq!(run_verify(&VerifyArgs::default(), &layout).unwrap(), 0);

        std::fs::write(&layout.schema, "{\"type\":\"object\"}").unwrap();
        assert_eq!(run_verify(&VerifyArgs { quiet: true }, &layout).unwrap(), 1);
    }
}
