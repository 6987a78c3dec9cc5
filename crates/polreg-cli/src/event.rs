//! # Log Subcommand
//!
//! Appends a registry lifecycle event to the policy log:
//!
//! ```bash
//! polreg log policy_registry_initialized 1.0.0 sha256:ab12... AIP-1.0.0,APR-1.0.0
//! ```
//!
//! Every positional argument is optional and falls back to the defaults on
//! [`LogEvent`].

use anyhow::Result;
use clap::Args;

use polreg_core::policy_log::{append_event, into_entries};
use polreg_core::LogEvent;
use serde_yaml::Value;

use crate::config::Layout;
use crate::store::{read_optional_yaml, write_yaml};
use crate::update::resolve_reconciled_at;

/// Arguments for the `polreg log` subcommand.
#[derive(Args, Debug, Default)]
pub struct LogArgs {
    /// Event name.
    #[arg(value_name = "EVENT")]
    pub event: Option<String>,

    /// Registry version the event refers to.
    #[arg(value_name = "REGISTRY_VERSION")]
    pub registry_version: Option<String>,

    /// Registry hash at the time of the event.
    #[arg(value_name = "REGISTRY_HASH")]
    pub registry_hash: Option<String>,

    /// Comma-separated policy identifiers.
    #[arg(value_name = "POLICIES", value_delimiter = ',')]
    pub policies: Option<Vec<String>>,

    /// Pin the event timestamp (RFC 3339).
    #[arg(long, value_name = "TIMESTAMP")]
    pub ts: Option<String>,
}

impl LogArgs {
    fn to_event(&self) -> Result<LogEvent> {
        Ok(LogEvent {
            ts: resolve_reconciled_at(self.ts.as_deref())?,
            event: self
                .event
                .clone()
                .unwrap_or_else(|| LogEvent::DEFAULT_EVENT.to_string()),
            registry_version: self
                .registry_version
                .clone()
                .unwrap_or_else(|| LogEvent::DEFAULT_REGISTRY_VERSION.to_string()),
            registry_hash: self.registry_hash.clone().unwrap_or_default(),
            policies: self.policies.clone().unwrap_or_else(|| {
                LogEvent::DEFAULT_POLICIES
                    .iter()
                    .map(|p| p.to_string())
                    .collect()
            }),
        })
    }
}

/// Execute the log subcommand.
pub fn run_log(args: &LogArgs, layout: &Layout) -> Result<u8> {
    let event = args.to_event()?;
    let mut entries = into_entries(read_optional_yaml(&layout.log)?)?;
    append_event(&mut entries, &event);
    write_yaml(&layout.log, &Value::Sequence(entries))?;

    tracing::info!(event = %event.event, log = %layout.log.display(), "appended policy log event");
    println!("Logged: {} {}", event.event, event.ts);
    Ok(0)
}
