//! Sales order mirror model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use super::MirrorRecord;

/// Lifecycle label written after the remote order has been accepted.
pub const STATUS_CREATED: &str = "Created";

/// Lifecycle label written after an invoice has been generated from the order.
pub const STATUS_INVOICED: &str = "Invoiced";

/// A sales order known to the local store.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SaleOrder {
    pub id: i64,
    pub remote_id: Option<i64>,
    pub number: String,
    /// Free-text lifecycle label.
    pub status: String,
    pub amount: Decimal,
    pub order_date: NaiveDate,
    /// Owning customer; `None` when pulled from remote before the customer.
    pub customer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SaleOrder {
    pub async fn get_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM sale_orders WHERE id = $1")
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
        sqlx::query_as("SELECT * FROM sale_orders WHERE remote_id = $1")
            .bind(remote_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM sale_orders ORDER BY id")
            .fetch_all(executor)
            .await
    }

    pub async fn insert<'e, E>(executor: E, data: &Self) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO sale_orders (remote_id, number, status, amount, order_date, customer_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(data.remote_id)
        .bind(&data.number)
        .bind(&data.status)
        .bind(data.amount)
        .bind(data.order_date)
        .bind(data.customer_id)
        .fetch_one(executor)
        .await
    }

    pub async fn update<'e, E>(executor: E, data: &Self) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            UPDATE sale_orders
            SET remote_id = $2,
                number = $3,
                status = $4,
                amount = $5,
                order_date = $6,
                customer_id = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(data.id)
        .bind(data.remote_id)
        .bind(&data.number)
        .bind(&data.status)
        .bind(data.amount)
        .bind(data.order_date)
        .bind(data.customer_id)
        .fetch_optional(executor)
        .await
    }
}

impl MirrorRecord for SaleOrder {
    const ENTITY: &'static str = "sale_order";

    fn id(&self) -> i64 {
        self.id
    }

    fn remote_id(&self) -> Option<i64> {
        self.remote_id
    }

    fn merge_remote(&mut self, incoming: &Self) -> bool {
        let before = self.clone();
        self.number.clone_from(&incoming.number);
        // Remote listings may omit the lifecycle label; keep the local one then.
        if !incoming.status.is_empty() {
            self.status.clone_from(&incoming.status);
        }
        self.amount = incoming.amount;
        self.order_date = incoming.order_date;
        // An unresolved owner on the remote side never unlinks a local one.
        if incoming.customer_id.is_some() {
            self.customer_id = incoming.customer_id;
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
}
