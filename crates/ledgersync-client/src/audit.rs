//! Audit log for remote step outcomes.
//!
//! Thin layer over an [`AuditStore`]. Writing an entry never fails the step
//! being audited: store errors are logged and swallowed.

use std::sync::Arc;

use chrono::Utc;
use ledgersync_db::{AuditStatus, AuditStore, LedgerStore, NewSyncAuditEntry, SyncAuditEntry};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};

/// Identifies an audited step.
#[derive(Debug, Clone, Copy)]
pub struct StepAudit<'a> {
    pub user_id: &'a str,
    pub title: &'a str,
    pub from_endpoint: &'a str,
    pub to_endpoint: &'a str,
}

/// Classify a step error: remote rejections are `Failed`, everything else
/// (transport, malformed response, local faults) is an `Exception`.
#[must_use]
pub fn status_for_error(error: &LedgerError) -> AuditStatus {
    match error {
        LedgerError::RemoteRequest { .. } => AuditStatus::Failed,
        LedgerError::RetriesExhausted { last, .. } => status_for_error(last),
        _ => AuditStatus::Exception,
    }
}

/// Append-only audit sink.
pub struct AuditLog<S: ?Sized = dyn LedgerStore> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for AuditLog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AuditStore + ?Sized> AuditLog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append one entry. Store failures are logged, never returned.
    pub async fn record(&self, step: &StepAudit<'_>, status: AuditStatus, error: Option<String>) {
        let entry = NewSyncAuditEntry {
            user_id: step.user_id.to_string(),
            title: step.title.to_string(),
            status,
            error,
            from_endpoint: step.from_endpoint.to_string(),
            to_endpoint: step.to_endpoint.to_string(),
            date: Utc::now(),
        };
        match self.store.append(entry).await {
            Ok(row) => debug!(audit_id = %row.id, title = step.title, status = %status, "Audit entry written"),
            Err(e) => warn!(title = step.title, status = %status, error = %e, "Failed to write audit entry"),
        }
    }

    /// Append the entry matching a step result.
    pub async fn record_result<T>(&self, step: &StepAudit<'_>, result: &LedgerResult<T>) {
        match result {
            Ok(_) => self.record(step, AuditStatus::Success, None).await,
            Err(e) => self.record(step, status_for_error(e), Some(e.to_string())).await,
        }
    }

    /// The latest `limit` entries, newest first.
    pub async fn recent(&self, limit: usize) -> LedgerResult<Vec<SyncAuditEntry>> {
        Ok(self.store.recent(limit).await?)
    }
}
