//! CLI error types and exit codes

use ledgersync_client::{ConfigError, LedgerError};
use ledgersync_db::DbError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Authentication failed
/// - 3: Network error
/// - 4: Validation error
/// - 5: Remote platform error
/// - 6: Partial success (invoice created, a follow-up step failed)
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not yet available: {0}")]
    NotYetAvailable(String),

    #[error("Remote platform error (status {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Protocol(String),

    #[error("Invoice {invoice_id} created with incomplete follow-up steps")]
    Partial { invoice_id: i64 },

    #[error("I/O error: {0}")]
    Io(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::AuthenticationFailed(_) => 2,
            CliError::Network(_) => 3,
            CliError::Validation(_) | CliError::NotYetAvailable(_) => 4,
            CliError::Remote { status, .. } => {
                if *status == 401 || *status == 403 {
                    2
                } else if *status >= 500 {
                    5
                } else {
                    4
                }
            }
            CliError::Protocol(_) => 5,
            CliError::Partial { .. } => 6,
            CliError::Config(_) | CliError::Database(_) | CliError::Io(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {self}");
        } else {
            eprintln!("Error: {self}");
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {suggestion}");
            } else {
                eprintln!("\nSuggestion: {suggestion}");
            }
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::AuthenticationFailed(_) => {
                Some("Check LEDGER_CONSUMER_TOKEN and LEDGER_EMPLOYEE_TOKEN, then run 'ledgersync doctor'.")
            }
            CliError::Database(_) => Some("Check DATABASE_URL and run 'ledgersync migrate'."),
            CliError::NotYetAvailable(_) => Some("The platform has not finished processing; try again shortly."),
            CliError::Partial { .. } => Some("Run 'ledgersync audit' to see which step failed."),
            _ => None,
        }
    }
}

impl From<LedgerError> for CliError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Precondition(message) => CliError::Validation(message),
            LedgerError::RemoteRequest { status, body } => CliError::Remote {
                status,
                message: body,
            },
            LedgerError::RemoteProtocol(message) => CliError::Protocol(message),
            LedgerError::NotYetAvailable(message) => CliError::NotYetAvailable(message),
            LedgerError::Transport(e) => CliError::Network(e.to_string()),
            LedgerError::Auth(message) => CliError::AuthenticationFailed(message),
            LedgerError::Store(e) => CliError::from(e),
            LedgerError::Config(message) => CliError::Config(message),
            LedgerError::RetriesExhausted { last, .. } => CliError::from(*last),
            other @ LedgerError::Reconcile(_) => CliError::Database(other.to_string()),
        }
    }
}

impl From<DbError> for CliError {
    fn from(e: DbError) -> Self {
        CliError::Database(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(format!("JSON error: {e}"))
    }
}
