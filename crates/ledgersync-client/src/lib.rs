//! Remote accounting platform integration for ledgersync.
//!
//! - [`client::LedgerClient`]: typed HTTP operations against the platform.
//! - [`reconciler::Reconciler`]: natural-key upsert of remote records into the mirror.
//! - [`saga::InvoiceSaga`]: order → invoice → voucher → attachment → approve → send.
//! - [`sync::SyncScheduler`]: on-demand pull of customers, orders and invoices.
//! - [`audit::AuditLog`]: append-only trail of remote step outcomes.

pub mod audit;
pub mod auth;
pub mod client;
pub mod config;
pub mod customer;
pub mod error;
pub mod mapper;
pub mod models;
pub mod reconciler;
pub mod retry;
pub mod saga;
pub mod sync;

pub use config::{ConfigError, LedgerConfig};
pub use error::{LedgerError, LedgerResult, ReconcileError};

use std::sync::Arc;

/// Build a [`client::LedgerClient`] authenticated with a session token
/// created from the configured consumer/employee token pair.
pub fn build_client_from_config(config: &LedgerConfig) -> LedgerResult<client::LedgerClient> {
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(concat!("ledgersync/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| LedgerError::Config(format!("Failed to build HTTP client: {e}")))?;

    let auth = auth::SessionTokenProvider::new(
        &config.api_base_url,
        config.consumer_token.clone(),
        config.employee_token.clone(),
        http_client.clone(),
    );

    Ok(client::LedgerClient::with_http_client(
        &config.api_base_url,
        Arc::new(auth),
        http_client,
    ))
}
