//! Mirror-store entity models.
//!
//! Each entity mirrors a remote-authoritative record. The [`MirrorRecord`]
//! trait exposes the natural key (remote id) and the rule for overwriting
//! remote-sourced fields while leaving local-only fields alone.

pub mod customer;
pub mod invoice;
pub mod sale_order;
pub mod sync_audit_entry;

use chrono::{DateTime, Utc};

pub use customer::Customer;
pub use invoice::Invoice;
pub use sale_order::SaleOrder;
pub use sync_audit_entry::{AuditStatus, NewSyncAuditEntry, SyncAuditEntry};

/// A locally stored copy of a remote-authoritative record.
pub trait MirrorRecord: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Entity name used in logs and errors ("customer", "sale_order", ...).
    const ENTITY: &'static str;

    /// Local identity. `0` until the store has persisted the record.
    fn id(&self) -> i64;

    /// Remote identifier (natural key), `None` until provisioned remotely.
    fn remote_id(&self) -> Option<i64>;

    /// Overwrite the remote-sourced fields with those of `incoming`.
    ///
    /// Local-only fields and the local identity are never touched. Returns
    /// `true` if any field actually changed.
    fn merge_remote(&mut self, incoming: &Self) -> bool;

    /// Assign store-managed identity and creation timestamps.
    fn assign_identity(&mut self, id: i64, at: DateTime<Utc>);

    /// Bump the modification timestamp.
    fn touch(&mut self, at: DateTime<Utc>);

    /// Local unique key other than the remote id, if the entity has one.
    fn secondary_key(&self) -> Option<i64> {
        None
    }

    /// Carry over fields from the stored row that an update must not clear.
    fn retain_sticky_fields(&mut self, _stored: &Self) {}
}
