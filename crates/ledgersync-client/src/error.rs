//! Error types for the ledgersync client.

use ledgersync_db::DbError;
use thiserror::Error;

/// Result alias for remote and saga operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors raised while talking to the remote platform or driving the saga.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A local precondition does not hold; the caller must fix it and retry.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The remote platform answered with a non-success status.
    #[error("Remote request failed with HTTP {status}: {body}")]
    RemoteRequest { status: u16, body: String },

    /// The remote response did not have the expected shape.
    #[error("Unexpected remote response: {0}")]
    RemoteProtocol(String),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// The remote resource exists but has not materialized yet; ask again later.
    #[error("Not yet available: {0}")]
    NotYetAvailable(String),

    /// Network-level failure (connect, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Store error: {0}")]
    Store(#[from] DbError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A retried operation failed on every attempt.
    #[error("{operation} failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: Box<LedgerError>,
    },
}

impl LedgerError {
    /// Create a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::RemoteProtocol(message.into())
    }

    /// Whether a retry of the same request might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteRequest { .. } | Self::Transport(_))
    }

    /// Whether the failure originated on the remote side of the wire.
    #[must_use]
    pub fn is_remote_failure(&self) -> bool {
        match self {
            Self::RemoteRequest { .. } | Self::RemoteProtocol(_) | Self::Transport(_) => true,
            Self::RetriesExhausted { last, .. } => last.is_remote_failure(),
            _ => false,
        }
    }

    /// HTTP status of a remote rejection, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRequest { status, .. } => Some(*status),
            Self::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

/// Failures of a natural-key upsert batch.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Two records in one batch share a remote id.
    #[error("Duplicate remote id {remote_id} in {entity} batch")]
    DuplicateRemoteId { entity: &'static str, remote_id: i64 },

    /// A remote-sourced record arrived without a remote id.
    #[error("{entity} record without remote id in batch")]
    MissingRemoteId { entity: &'static str },

    /// The store rejected the batch; nothing was applied.
    #[error("Commit of {entity} batch failed: {source}")]
    Commit {
        entity: &'static str,
        #[source]
        source: DbError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let http = LedgerError::RemoteRequest {
            status: 500,
            body: "boom".into(),
        };
        assert!(http.is_retryable());
        assert!(http.is_remote_failure());
        assert_eq!(http.status(), Some(500));

        assert!(!LedgerError::precondition("customer has no remote id").is_retryable());
        assert!(!LedgerError::protocol("missing value").is_retryable());
        assert!(LedgerError::protocol("missing value").is_remote_failure());
        assert!(!LedgerError::NotYetAvailable("voucher".into()).is_remote_failure());
    }

    #[test]
    fn test_exhausted_retries_expose_last_status() {
        let err = LedgerError::RetriesExhausted {
            operation: "create_invoice".into(),
            attempts: 3,
            last: Box::new(LedgerError::RemoteRequest {
                status: 422,
                body: "invalid".into(),
            }),
        };
        assert_eq!(err.status(), Some(422));
        assert!(err.to_string().contains("after 3 attempt(s)"));
    }

    #[test]
    fn test_reconcile_error_converts() {
        let err: LedgerError = ReconcileError::DuplicateRemoteId {
            entity: "customer",
            remote_id: 7,
        }
        .into();
        assert!(matches!(err, LedgerError::Reconcile(_)));
        assert_eq!(err.to_string(), "Duplicate remote id 7 in customer batch");
    }
}
