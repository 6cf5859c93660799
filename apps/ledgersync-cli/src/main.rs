//! ledgersync CLI - operator entry point
//!
//! Wires configuration, logging and the PostgreSQL mirror store to the
//! ledgersync core:
//! - Pull customers, orders and invoices from the accounting platform
//! - Provision customers and invoices remotely
//! - Inspect the sync audit trail
//! - Diagnose configuration and connectivity

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod logging;
mod renderer;

use error::CliResult;

/// ledgersync - accounting platform mirror and invoice provisioning
#[derive(Parser)]
#[command(name = "ledgersync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull remote records into the local mirror
    Sync(commands::sync::SyncArgs),

    /// Manage customers on the remote platform
    Customer(commands::customer::CustomerArgs),

    /// Create and finalize invoices
    Invoice(commands::invoice::InvoiceArgs),

    /// Show recent sync audit entries
    Audit(commands::audit::AuditArgs),

    /// Diagnose configuration, database and platform connectivity
    Doctor(commands::doctor::DoctorArgs),

    /// Apply database migrations
    Migrate(commands::migrate::MigrateArgs),
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    logging::init_logging(logging::DEFAULT_FILTER, logging::LogFormat::from_env());

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Sync(args) => commands::sync::execute(args).await,
        Commands::Customer(args) => commands::customer::execute(args).await,
        Commands::Invoice(args) => commands::invoice::execute(args).await,
        Commands::Audit(args) => commands::audit::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args).await,
        Commands::Migrate(args) => commands::migrate::execute(args).await,
    }
}
