//! # polreg CLI entry point
//!
//! Parses command-line arguments, resolves the repository layout and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use polreg_cli::config::{find_repo_root, Layout, PolregConfig};
use polreg_cli::event::{run_log, LogArgs};
use polreg_cli::hash::{run_hash, HashArgs};
use polreg_cli::update::{run_update, UpdateArgs};
use polreg_cli::verify::{run_verify, VerifyArgs};

/// Policy registry hash reconciler.
///
/// Keeps policy documents, the policy registry, the registry manifest and
/// the policy log in agreement on canonical SHA-256 content digests.
#[derive(Parser, Debug)]
#[command(name = "polreg", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Repository root. Defaults to the nearest ancestor containing `docs/policies`.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recompute digests and write them into policies, registry, manifest and log.
    Update(UpdateArgs),

    /// Print the canonical digest of a YAML document.
    Hash(HashArgs),

    /// Check recorded digests without writing anything.
    Verify(VerifyArgs),

    /// Append an event to the policy log.
    Log(LogArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level. Stdout carries results.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let repo_root = cli.root.clone().unwrap_or_else(|| {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        find_repo_root(&cwd).unwrap_or_else(|| {
            tracing::warn!("Could not locate repository root; using current directory");
            cwd
        })
    });

    tracing::debug!(repo_root = %repo_root.display(), "resolved repository root");

    let layout = match PolregConfig::load(cli.config.as_deref(), &repo_root) {
        Ok(config) => Layout::new(&config, &repo_root),
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Commands::Update(args) => run_update(&args, &layout, &mut std::io::stdout().lock()),
        Commands::Hash(args) => run_hash(&args, &layout, &mut std::io::stdout().lock()),
        Commands::Verify(args) => run_verify(&args, &layout),
        Commands::Log(args) => run_log(&args, &layout),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
