//! In-memory store backend.
//!
//! Keeps every table behind one lock so batch commits can be staged on a
//! copy and swapped in only when every change applied cleanly.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{AuditStore, InvoiceStore, MirrorStore, UpsertPlan};
use crate::error::{DbError, DbResult};
use crate::models::{
    Customer, Invoice, MirrorRecord, NewSyncAuditEntry, SaleOrder, SyncAuditEntry,
};

#[derive(Debug, Clone)]
struct Table<E> {
    rows: BTreeMap<i64, E>,
    next_id: i64,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<E: MirrorRecord> Table<E> {
    fn find_by_remote_id(&self, remote_id: i64) -> Option<&E> {
        self.rows
            .values()
            .find(|row| row.remote_id() == Some(remote_id))
    }

    fn check_unique(&self, record: &E, own_id: Option<i64>) -> DbResult<()> {
        let others = self.rows.values().filter(|row| Some(row.id()) != own_id);
        for row in others {
            if record.remote_id().is_some() && row.remote_id() == record.remote_id() {
                return Err(DbError::Conflict(format!(
                    "{} with remote id {:?} already exists",
                    E::ENTITY,
                    record.remote_id()
                )));
            }
            if record.secondary_key().is_some() && row.secondary_key() == record.secondary_key() {
                return Err(DbError::Conflict(format!(
                    "{} with key {:?} already exists",
                    E::ENTITY,
                    record.secondary_key()
                )));
            }
        }
        Ok(())
    }

    fn insert(&mut self, mut record: E) -> DbResult<E> {
        self.check_unique(&record, None)?;
        let id = self.next_id;
        self.next_id += 1;
        record.assign_identity(id, Utc::now());
        self.rows.insert(id, record.clone());
        Ok(record)
    }

    fn update(&mut self, record: &E) -> DbResult<E> {
        let stored = self
            .rows
            .get(&record.id())
            .ok_or_else(|| DbError::NotFound(format!("{} {}", E::ENTITY, record.id())))?;
        let mut updated = record.clone();
        updated.retain_sticky_fields(stored);
        self.check_unique(&updated, Some(updated.id()))?;
        updated.touch(Utc::now());
        self.rows.insert(updated.id(), updated.clone());
        Ok(updated)
    }

    fn apply(&mut self, plan: UpsertPlan<E>) -> DbResult<()> {
        for record in &plan.updates {
            self.update(record)?;
        }
        for record in plan.inserts {
            self.insert(record)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Tables {
    customers: Table<Customer>,
    sale_orders: Table<SaleOrder>,
    invoices: Table<Invoice>,
    audit: Vec<SyncAuditEntry>,
}

/// Process-local store used by tests and embedders without a database.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl InMemoryLedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of audit entries written so far (for testing).
    pub async fn audit_len(&self) -> usize {
        self.tables.read().await.audit.len()
    }
}

macro_rules! impl_mirror_store {
    ($entity:ty, $table:ident) => {
        #[async_trait]
        impl MirrorStore<$entity> for InMemoryLedgerStore {
            async fn get(&self, id: i64) -> DbResult<Option<$entity>> {
                Ok(self.tables.read().await.$table.rows.get(&id).cloned())
            }

            async fn get_by_remote_id(&self, remote_id: i64) -> DbResult<Option<$entity>> {
                Ok(self
                    .tables
                    .read()
                    .await
                    .$table
                    .find_by_remote_id(remote_id)
                    .cloned())
            }

            async fn add(&self, record: $entity) -> DbResult<$entity> {
                self.tables.write().await.$table.insert(record)
            }

            async fn update(&self, record: &$entity) -> DbResult<$entity> {
                self.tables.write().await.$table.update(record)
            }

            async fn commit(&self, plan: UpsertPlan<$entity>) -> DbResult<()> {
                let inserts = plan.inserts.len();
                let updates = plan.updates.len();
                let mut tables = self.tables.write().await;
                let mut staged = tables.$table.clone();
                staged.apply(plan)?;
                tables.$table = staged;
                debug!(
                    entity = <$entity as MirrorRecord>::ENTITY,
                    inserts, updates, "Committed batch"
                );
                Ok(())
            }

            async fn list(&self) -> DbResult<Vec<$entity>> {
                Ok(self.tables.read().await.$table.rows.values().cloned().collect())
            }
        }
    };
}

impl_mirror_store!(Customer, customers);
impl_mirror_store!(SaleOrder, sale_orders);
impl_mirror_store!(Invoice, invoices);

#[async_trait]
impl InvoiceStore for InMemoryLedgerStore {
    async fn get_by_sale_order(&self, sale_order_id: i64) -> DbResult<Option<Invoice>> {
        Ok(self
            .tables
            .read()
            .await
            .invoices
            .rows
            .values()
            .find(|invoice| invoice.sale_order_id == Some(sale_order_id))
            .cloned())
    }
}

#[async_trait]
impl AuditStore for InMemoryLedgerStore {
    async fn append(&self, entry: NewSyncAuditEntry) -> DbResult<SyncAuditEntry> {
        let now = Utc::now();
        let row = SyncAuditEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            title: entry.title,
            status: entry.status.as_str().to_string(),
            error: entry.error,
            from_endpoint: entry.from_endpoint,
            to_endpoint: entry.to_endpoint,
            date: entry.date,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.audit.push(row.clone());
        Ok(row)
    }

    async fn recent(&self, limit: usize) -> DbResult<Vec<SyncAuditEntry>> {
        let tables = self.tables.read().await;
        Ok(tables.audit.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditStatus;

    fn customer(remote_id: Option<i64>, name: &str) -> Customer {
        Customer {
            remote_id,
            name: Some(name.to_string()),
            ..Customer::default()
        }
    }

    #[tokio::test]
    async fn test_add_assigns_identity_and_rejects_duplicate_remote_id() {
        let store = InMemoryLedgerStore::new();

        let first = store.add(customer(Some(80_389_576), "Acme AS")).await.unwrap();
        assert_eq!(first.id, 1);

        let err = store
            .add(customer(Some(80_389_576), "Acme Duplicate"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        // Unprovisioned customers never collide.
        store.add(customer(None, "Local A")).await.unwrap();
        store.add(customer(None, "Local B")).await.unwrap();
        assert_eq!(MirrorStore::<Customer>::list(&store).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = InMemoryLedgerStore::new();
        let mut existing = store.add(customer(Some(1), "One")).await.unwrap();
        existing.name = Some("One Renamed".to_string());

        let plan = UpsertPlan {
            inserts: vec![customer(Some(2), "Two"), customer(Some(1), "Clash")],
            updates: vec![existing],
        };
        let err = store.commit(plan).await.unwrap_err();
        assert!(err.is_conflict());

        let rows = MirrorStore::<Customer>::list(&store).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name.as_deref(), Some("One"));
    }

    #[tokio::test]
    async fn test_update_unknown_row_is_not_found() {
        let store = InMemoryLedgerStore::new();
        let ghost = Customer {
            id: 42,
            ..Customer::default()
        };
        assert!(MirrorStore::<Customer>::update(&store, &ghost)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_invoice_update_keeps_voucher_and_order_link() {
        let store = InMemoryLedgerStore::new();
        let stored = store
            .add(Invoice {
                remote_id: Some(555),
                voucher_id: Some(9001),
                sale_order_id: Some(7),
                customer_id: 1,
                ..Invoice::default()
            })
            .await
            .unwrap();

        let mut incoming = stored.clone();
        incoming.voucher_id = None;
        incoming.sale_order_id = None;
        let updated = MirrorStore::<Invoice>::update(&store, &incoming).await.unwrap();

        assert_eq!(updated.voucher_id, Some(9001));
        assert_eq!(updated.sale_order_id, Some(7));
        assert_eq!(
            store.get_by_sale_order(7).await.unwrap().map(|i| i.id),
            Some(stored.id)
        );
    }

    #[tokio::test]
    async fn test_one_invoice_per_sale_order() {
        let store = InMemoryLedgerStore::new();
        let invoice = Invoice {
            sale_order_id: Some(7),
            customer_id: 1,
            ..Invoice::default()
        };
        store.add(invoice.clone()).await.unwrap();
        assert!(store.add(invoice).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_recent_audit_entries_newest_first() {
        let store = InMemoryLedgerStore::new();
        for title in ["first", "second", "third"] {
            store
                .append(NewSyncAuditEntry {
                    user_id: "0".to_string(),
                    title: title.to_string(),
                    status: AuditStatus::Success,
                    error: None,
                    from_endpoint: "local".to_string(),
                    to_endpoint: "remote".to_string(),
                    date: Utc::now(),
                })
                .await
                .unwrap();
        }

        let recent = store.recent(2).await.unwrap();
        let titles: Vec<_> = recent.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second"]);
        assert_eq!(store.audit_len().await, 3);
    }
}
