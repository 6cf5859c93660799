//! Store traits for the local mirror.
//!
//! Callers hold an `Arc<dyn LedgerStore>` and pick the entity through the
//! generic [`MirrorStore`] trait, e.g. `MirrorStore::<Customer>::get(store.as_ref(), id)`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::DbResult;
use crate::models::{Customer, Invoice, MirrorRecord, NewSyncAuditEntry, SaleOrder, SyncAuditEntry};

/// A batch of changes applied all-or-nothing by [`MirrorStore::commit`].
#[derive(Debug, Clone)]
pub struct UpsertPlan<E> {
    /// New records; their local id is ignored and assigned by the store.
    pub inserts: Vec<E>,
    /// Existing records, addressed by local id.
    pub updates: Vec<E>,
}

impl<E> Default for UpsertPlan<E> {
    fn default() -> Self {
        Self {
            inserts: Vec::new(),
            updates: Vec::new(),
        }
    }
}

impl<E> UpsertPlan<E> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }
}

/// Persistence for one mirrored entity type.
#[async_trait]
pub trait MirrorStore<E: MirrorRecord>: Send + Sync {
    /// Look up by local id.
    async fn get(&self, id: i64) -> DbResult<Option<E>>;

    /// Look up by remote id (natural key).
    async fn get_by_remote_id(&self, remote_id: i64) -> DbResult<Option<E>>;

    /// Insert a new record and return it with its assigned identity.
    ///
    /// Fails with [`crate::DbError::Conflict`] if the remote id is taken.
    async fn add(&self, record: E) -> DbResult<E>;

    /// Persist changes to an existing record.
    async fn update(&self, record: &E) -> DbResult<E>;

    /// Apply a batch of inserts and updates atomically.
    async fn commit(&self, plan: UpsertPlan<E>) -> DbResult<()>;

    /// Every record, ordered by local id.
    async fn list(&self) -> DbResult<Vec<E>>;
}

/// Invoice-specific lookups.
#[async_trait]
pub trait InvoiceStore: MirrorStore<Invoice> {
    /// The invoice generated from a local sales order, if any.
    async fn get_by_sale_order(&self, sale_order_id: i64) -> DbResult<Option<Invoice>>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: NewSyncAuditEntry) -> DbResult<SyncAuditEntry>;

    /// The latest `limit` entries, newest first.
    async fn recent(&self, limit: usize) -> DbResult<Vec<SyncAuditEntry>>;
}

/// The complete local store required by the sync engine.
pub trait LedgerStore:
    MirrorStore<Customer> + MirrorStore<SaleOrder> + InvoiceStore + AuditStore
{
}

impl<T> LedgerStore for T where
    T: MirrorStore<Customer> + MirrorStore<SaleOrder> + InvoiceStore + AuditStore
{
}
