//! Local mirror store for ledgersync.
//!
//! Holds the local copies of remote-authoritative records (customers, sales
//! orders, invoices) plus the append-only sync audit trail. Every mirrored
//! entity carries a nullable remote identifier which is its natural key:
//! at most one local row exists per non-null remote id.
//!
//! Two backends implement the store traits:
//!
//! - [`PgLedgerStore`]: PostgreSQL via `sqlx`, batch commits run in a transaction.
//! - [`InMemoryLedgerStore`]: process-local, used by tests and embedders.

pub mod error;
pub mod migrations;
pub mod models;
pub mod store;

pub use error::{DbError, DbResult};
pub use migrations::run_migrations;
pub use models::{
    AuditStatus, Customer, Invoice, MirrorRecord, NewSyncAuditEntry, SaleOrder, SyncAuditEntry,
};
pub use store::memory::InMemoryLedgerStore;
pub use store::postgres::PgLedgerStore;
pub use store::{AuditStore, InvoiceStore, LedgerStore, MirrorStore, UpsertPlan};
