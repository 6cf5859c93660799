//! Sync audit log model.
//!
//! Append-only record of remote step outcomes. Rows are written once and
//! never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// Outcome of an audited remote step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    /// The remote platform accepted the request.
    Success,
    /// The remote platform answered with a non-success status.
    Failed,
    /// The request never produced a usable response (transport, parse, ...).
    Exception,
}

impl AuditStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "Success",
            AuditStatus::Failed => "Failed",
            AuditStatus::Exception => "Exception",
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Success" => Ok(AuditStatus::Success),
            "Failed" => Ok(AuditStatus::Failed),
            "Exception" => Ok(AuditStatus::Exception),
            other => Err(format!("unknown audit status: {other}")),
        }
    }
}

/// A persisted audit entry.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SyncAuditEntry {
    pub id: Uuid,
    /// The acting user on whose behalf the step ran.
    pub user_id: String,
    pub title: String,
    /// One of `Success`, `Failed`, `Exception`.
    pub status: String,
    pub error: Option<String>,
    pub from_endpoint: String,
    pub to_endpoint: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncAuditEntry {
    /// Parsed status, `None` if the row holds an unknown label.
    #[must_use]
    pub fn audit_status(&self) -> Option<AuditStatus> {
        self.status.parse().ok()
    }

    /// Append an entry.
    pub async fn create<'e, E>(executor: E, data: &NewSyncAuditEntry) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO sync_audit_entries
                (id, user_id, title, status, error, from_endpoint, to_endpoint, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(&data.user_id)
        .bind(&data.title)
        .bind(data.status.as_str())
        .bind(&data.error)
        .bind(&data.from_endpoint)
        .bind(&data.to_endpoint)
        .bind(data.date)
        .fetch_one(executor)
        .await
    }

    /// Most recent entries first.
    pub async fn list_recent<'e, E>(executor: E, limit: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT * FROM sync_audit_entries
            ORDER BY created_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(executor)
        .await
    }
}

/// Data required to append an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSyncAuditEntry {
    pub user_id: String,
    pub title: String,
    pub status: AuditStatus,
    pub error: Option<String>,
    pub from_endpoint: String,
    pub to_endpoint: String,
    pub date: DateTime<Utc>,
}
