//! Customer commands

use clap::{Args, Subcommand};
use ledgersync_client::customer::CustomerProvisioner;

use super::AppContext;
use crate::error::CliResult;

#[derive(Args, Debug)]
pub struct CustomerArgs {
    #[command(subcommand)]
    pub command: CustomerCommand,
}

#[derive(Subcommand, Debug)]
pub enum CustomerCommand {
    /// Create a local customer on the remote platform
    Provision {
        /// Local customer id
        id: i64,
    },
}

pub async fn execute(args: CustomerArgs) -> CliResult<()> {
    let ctx = AppContext::load().await?;
    match args.command {
        CustomerCommand::Provision { id } => {
            let customer = CustomerProvisioner::new(ctx.client, ctx.store)
                .provision(id)
                .await?;
            println!(
                "Customer {} provisioned with remote id {}",
                customer.id,
                customer.remote_id.unwrap_or_default()
            );
            Ok(())
        }
    }
}
