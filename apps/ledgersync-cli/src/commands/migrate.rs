//! Migrate command - apply the mirror schema

use clap::Args;
use ledgersync_db::run_migrations;

use super::connect_store;
use crate::error::CliResult;

#[derive(Args, Debug)]
pub struct MigrateArgs {}

pub async fn execute(_args: MigrateArgs) -> CliResult<()> {
    let store = connect_store().await?;
    run_migrations(store.pool()).await?;
    println!("Migrations applied.");
    Ok(())
}
