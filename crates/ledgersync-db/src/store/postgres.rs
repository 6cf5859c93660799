//! PostgreSQL store backend.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

use super::{AuditStore, InvoiceStore, MirrorStore, UpsertPlan};
use crate::error::{DbError, DbResult};
use crate::models::{
    Customer, Invoice, MirrorRecord, NewSyncAuditEntry, SaleOrder, SyncAuditEntry,
};

/// Store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

macro_rules! impl_mirror_store {
    ($entity:ty) => {
        #[async_trait]
        impl MirrorStore<$entity> for PgLedgerStore {
            async fn get(&self, id: i64) -> DbResult<Option<$entity>> {
                Ok(<$entity>::get_by_id(&self.pool, id).await?)
            }

            async fn get_by_remote_id(&self, remote_id: i64) -> DbResult<Option<$entity>> {
                Ok(<$entity>::get_by_remote_id(&self.pool, remote_id).await?)
            }

            async fn add(&self, record: $entity) -> DbResult<$entity> {
                Ok(<$entity>::insert(&self.pool, &record).await?)
            }

            async fn update(&self, record: &$entity) -> DbResult<$entity> {
                <$entity>::update(&self.pool, record).await?.ok_or_else(|| {
                    DbError::NotFound(format!(
                        "{} {}",
                        <$entity as MirrorRecord>::ENTITY,
                        record.id
                    ))
                })
            }

            async fn commit(&self, plan: UpsertPlan<$entity>) -> DbResult<()> {
                let inserts = plan.inserts.len();
                let updates = plan.updates.len();
                let mut tx = self.pool.begin().await?;

                for record in &plan.updates {
                    if <$entity>::update(&mut *tx, record).await?.is_none() {
                        // Dropping the transaction rolls it back.
                        return Err(DbError::NotFound(format!(
                            "{} {}",
                            <$entity as MirrorRecord>::ENTITY,
                            record.id
                        )));
                    }
                }
                for record in &plan.inserts {
                    <$entity>::insert(&mut *tx, record).await?;
                }

                tx.commit().await?;
                debug!(
                    entity = <$entity as MirrorRecord>::ENTITY,
                    inserts, updates, "Committed batch"
                );
                Ok(())
            }

            async fn list(&self) -> DbResult<Vec<$entity>> {
                Ok(<$entity>::list_all(&self.pool).await?)
            }
        }
    };
}

impl_mirror_store!(Customer);
impl_mirror_store!(SaleOrder);
impl_mirror_store!(Invoice);

#[async_trait]
impl InvoiceStore for PgLedgerStore {
    async fn get_by_sale_order(&self, sale_order_id: i64) -> DbResult<Option<Invoice>> {
        Ok(Invoice::get_by_sale_order(&self.pool, sale_order_id).await?)
    }
}

#[async_trait]
impl AuditStore for PgLedgerStore {
    async fn append(&self, entry: NewSyncAuditEntry) -> DbResult<SyncAuditEntry> {
        Ok(SyncAuditEntry::create(&self.pool, &entry).await?)
    }

    async fn recent(&self, limit: usize) -> DbResult<Vec<SyncAuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(SyncAuditEntry::list_recent(&self.pool, limit).await?)
    }
}
