//! Sync command - pull remote collections into the local mirror

use chrono::Utc;
use clap::{Args, ValueEnum};
use ledgersync_client::reconciler::UpsertReport;
use ledgersync_client::sync::SyncScheduler;
use serde_json::json;

use super::{print_json, AppContext};
use crate::error::CliResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Collection {
    Customers,
    Orders,
    Invoices,
    All,
}

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Collection to pull
    #[arg(value_enum, default_value_t = Collection::All)]
    pub collection: Collection,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: SyncArgs) -> CliResult<()> {
    let ctx = AppContext::load().await?;
    let scheduler = SyncScheduler::new(ctx.client, ctx.store, ctx.config.windows);
    let today = Utc::now().date_naive();

    let reports = match args.collection {
        Collection::Customers => vec![scheduler.sync_customers().await?],
        Collection::Orders => vec![scheduler.sync_orders(today).await?],
        Collection::Invoices => vec![scheduler.sync_invoices(today).await?],
        Collection::All => {
            let summary = scheduler.sync_all().await?;
            vec![summary.customers, summary.orders, summary.invoices]
        }
    };

    if args.json {
        let rows: Vec<_> = reports.iter().map(report_json).collect();
        return print_json(&json!(rows));
    }

    println!("{:<12} {:>9} {:>9} {:>10} {:>8}", "ENTITY", "INSERTED", "UPDATED", "UNCHANGED", "SKIPPED");
    for report in &reports {
        println!(
            "{:<12} {:>9} {:>9} {:>10} {:>8}",
            report.entity, report.inserted, report.updated, report.unchanged, report.skipped
        );
    }
    Ok(())
}

fn report_json(report: &UpsertReport) -> serde_json::Value {
    json!({
        "entity": report.entity,
        "inserted": report.inserted,
        "updated": report.updated,
        "unchanged": report.unchanged,
        "skipped": report.skipped,
    })
}
