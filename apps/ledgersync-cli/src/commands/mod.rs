//! CLI command implementations

pub mod audit;
pub mod customer;
pub mod doctor;
pub mod invoice;
pub mod migrate;
pub mod sync;

use std::sync::Arc;

use ledgersync_client::client::LedgerClient;
use ledgersync_client::{build_client_from_config, LedgerConfig};
use ledgersync_db::{LedgerStore, PgLedgerStore};

use crate::error::{CliError, CliResult};

/// Connections kept small: the CLI runs one flow at a time.
const MAX_DB_CONNECTIONS: u32 = 4;

/// Read `DATABASE_URL`.
pub fn database_url() -> CliResult<String> {
    std::env::var("DATABASE_URL")
        .map_err(|_| CliError::Config("DATABASE_URL environment variable is required".into()))
}

pub async fn connect_store() -> CliResult<PgLedgerStore> {
    Ok(PgLedgerStore::connect(&database_url()?, MAX_DB_CONNECTIONS).await?)
}

/// Everything a command talking to both sides needs.
pub struct AppContext {
    pub config: LedgerConfig,
    pub client: LedgerClient,
    pub store: Arc<dyn LedgerStore>,
}

impl AppContext {
    pub async fn load() -> CliResult<Self> {
        let config = LedgerConfig::from_env()?;
        let client = build_client_from_config(&config)?;
        let store: Arc<dyn LedgerStore> = Arc::new(connect_store().await?);
        Ok(Self {
            config,
            client,
            store,
        })
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json(value: &serde_json::Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
