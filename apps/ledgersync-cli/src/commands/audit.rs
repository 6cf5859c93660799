//! Audit command - show the latest sync audit entries

use std::sync::Arc;

use clap::Args;
use ledgersync_client::audit::AuditLog;

use super::{connect_store, print_json};
use crate::error::CliResult;

/// Arguments for the audit command
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Number of entries to show
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: usize,

    /// Only show entries that did not succeed
    #[arg(long)]
    pub failures: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: AuditArgs) -> CliResult<()> {
    let audit = AuditLog::new(Arc::new(connect_store().await?));
    let entries: Vec<_> = audit
        .recent(args.limit)
        .await?
        .into_iter()
        .filter(|e| !args.failures || e.status != "Success")
        .collect();

    if args.json {
        return print_json(&serde_json::to_value(&entries)?);
    }

    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{}  {:<9} {:<40} {} -> {}",
            entry.date.format("%Y-%m-%d %H:%M:%S"),
            entry.status,
            entry.title,
            entry.from_endpoint,
            entry.to_endpoint
        );
        if let Some(error) = &entry.error {
            println!("    {error}");
        }
    }
    Ok(())
}
