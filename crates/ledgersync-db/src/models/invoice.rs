//! Invoice mirror model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use super::MirrorRecord;

/// Default invoice currency.
pub const DEFAULT_CURRENCY: &str = "NOK";

/// An invoice known to the local store.
///
/// `voucher_id` is resolved asynchronously after the remote invoice exists;
/// once set it is never cleared. `sale_order_id` is local-only and links the
/// invoice to the order it was generated from.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub remote_id: Option<i64>,
    pub voucher_id: Option<i64>,
    /// Display string combining the remote lifecycle state and amount.
    pub status: String,
    pub total: Decimal,
    pub currency: String,
    pub invoice_created: NaiveDate,
    pub invoice_due_date: NaiveDate,
    pub customer_id: i64,
    /// Denormalized remote id of the owning customer.
    pub customer_remote_id: i64,
    pub sale_order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Invoice {
    fn default() -> Self {
        Self {
            id: 0,
            remote_id: None,
            voucher_id: None,
            status: String::new(),
            total: Decimal::ZERO,
            currency: DEFAULT_CURRENCY.to_string(),
            invoice_created: NaiveDate::default(),
            invoice_due_date: NaiveDate::default(),
            customer_id: 0,
            customer_remote_id: 0,
            sale_order_id: None,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}

impl Invoice {
    pub async fn get_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn get_by_remote_id<'e, E>(
        executor: E,
        remote_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM invoices WHERE remote_id = $1")
            .bind(remote_id)
            .fetch_optional(executor)
            .await
    }

    /// Find the invoice generated from a local sales order.
    pub async fn get_by_sale_order<'e, E>(
        executor: E,
        sale_order_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM invoices WHERE sale_order_id = $1")
            .bind(sale_order_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM invoices ORDER BY id")
            .fetch_all(executor)
            .await
    }

    pub async fn insert<'e, E>(executor: E, data: &Self) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO invoices
                (remote_id, voucher_id, status, total, currency, invoice_created,
                 invoice_due_date, customer_id, customer_remote_id, sale_order_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            ",
        )
        .bind(data.remote_id)
        .bind(data.voucher_id)
        .bind(&data.status)
        .bind(data.total)
        .bind(&data.currency)
        .bind(data.invoice_created)
        .bind(data.invoice_due_date)
        .bind(data.customer_id)
        .bind(data.customer_remote_id)
        .bind(data.sale_order_id)
        .fetch_one(executor)
        .await
    }

    /// Overwrite the mutable columns of an existing invoice.
    ///
    /// `voucher_id` is coalesced so an update can never clear it.
    pub async fn update<'e, E>(executor: E, data: &Self) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            UPDATE invoices
            SET remote_id = $2,
                voucher_id = COALESCE($3, voucher_id),
                status = $4,
                total = $5,
                currency = $6,
                invoice_created = $7,
                invoice_due_date = $8,
                customer_id = $9,
                customer_remote_id = $10,
                sale_order_id = COALESCE($11, sale_order_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(data.id)
        .bind(data.remote_id)
        .bind(data.voucher_id)
        .bind(&data.status)
        .bind(data.total)
        .bind(&data.currency)
        .bind(data.invoice_created)
        .bind(data.invoice_due_date)
        .bind(data.customer_id)
        .bind(data.customer_remote_id)
        .bind(data.sale_order_id)
        .fetch_optional(executor)
        .await
    }
}

impl MirrorRecord for Invoice {
    const ENTITY: &'static str = "invoice";

    fn id(&self) -> i64 {
        self.id
    }

    fn remote_id(&self) -> Option<i64> {
        self.remote_id
    }

    fn merge_remote(&mut self, incoming: &Self) -> bool {
        let before = self.clone();
        self.status.clone_from(&incoming.status);
        self.total = incoming.total;
        self.currency.clone_from(&incoming.currency);
        self.invoice_created = incoming.invoice_created;
        self.invoice_due_date = incoming.invoice_due_date;
        self.customer_id = incoming.customer_id;
        self.customer_remote_id = incoming.customer_remote_id;
        if self.voucher_id.is_none() {
            self.voucher_id = incoming.voucher_id;
        }
        *self != before
    }

    fn assign_identity(&mut self, id: i64, at: DateTime<Utc>) {
        self.id = id;
        self.created_at = at;
        self.updated_at = at;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn secondary_key(&self) -> Option<i64> {
        self.sale_order_id
    }

    fn retain_sticky_fields(&mut self, stored: &Self) {
        if self.voucher_id.is_none() {
            self.voucher_id = stored.voucher_id;
        }
        if self.sale_order_id.is_none() {
            self.sale_order_id = stored.sale_order_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_invoice(status: &str, voucher_id: Option<i64>) -> Invoice {
        Invoice {
            remote_id: Some(555),
            voucher_id,
            status: status.to_string(),
            total: Decimal::new(20000, 2),
            customer_id: 1,
            customer_remote_id: 80_389_576,
            ..Invoice::default()
        }
    }

    #[test]
    fn test_merge_never_clears_voucher() {
        let mut local = remote_invoice("Draft (200.00 NOK)", Some(9001));
        let changed = local.merge_remote(&remote_invoice("Approved (200.00 NOK)", None));

        assert!(changed);
        assert_eq!(local.voucher_id, Some(9001));
        assert_eq!(local.status, "Approved (200.00 NOK)");
    }

    #[test]
    fn test_merge_fills_missing_voucher() {
        let mut local = remote_invoice("Draft (200.00 NOK)", None);
        assert!(local.merge_remote(&remote_invoice("Draft (200.00 NOK)", Some(77))));
        assert_eq!(local.voucher_id, Some(77));
    }

    #[test]
    fn test_merge_preserves_sale_order_link() {
        let mut local = remote_invoice("Draft (200.00 NOK)", None);
        local.sale_order_id = Some(12);
        local.merge_remote(&remote_invoice("Draft (200.00 NOK)", None));
        assert_eq!(local.sale_order_id, Some(12));
    }
}
