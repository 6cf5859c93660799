//! Configuration loaded from environment variables.
//!
//! Fail-fast: required variables must be present and every set variable
//! must parse, otherwise loading returns a [`ConfigError`].

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::retry::RetryPolicy;
use crate::sync::SyncWindows;

pub const DEFAULT_API_BASE_URL: &str = "https://api-test.tripletex.tech/v2";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Settings for the remote client, saga and sync scheduler.
#[derive(Clone)]
pub struct LedgerConfig {
    pub api_base_url: String,
    pub consumer_token: String,
    pub employee_token: String,
    pub http_timeout: Duration,
    /// Retry policy for invoice creation.
    pub retry: RetryPolicy,
    pub windows: SyncWindows,
    /// Days between invoice date and due date when the caller gives none.
    pub invoice_due_days: i64,
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("api_base_url", &self.api_base_url)
            .field("consumer_token", &"[REDACTED]")
            .field("employee_token", &"[REDACTED]")
            .field("http_timeout", &self.http_timeout)
            .field("retry", &self.retry)
            .field("windows", &self.windows)
            .field("invoice_due_days", &self.invoice_due_days)
            .finish()
    }
}

impl LedgerConfig {
    /// Load configuration from the process environment.
    ///
    /// # Required Variables
    ///
    /// - `LEDGER_CONSUMER_TOKEN`, `LEDGER_EMPLOYEE_TOKEN`
    ///
    /// # Optional Variables
    ///
    /// - `LEDGER_API_BASE_URL` (default: the platform test environment)
    /// - `LEDGER_HTTP_TIMEOUT_SECS` (default: 30)
    /// - `LEDGER_RETRY_MAX_ATTEMPTS` (default: 3)
    /// - `LEDGER_RETRY_BASE_DELAY_MS` (default: 1000)
    /// - `LEDGER_INVOICE_LOOKBACK_DAYS` (default: 30)
    /// - `LEDGER_ORDER_LOOKBACK_DAYS` (default: 30)
    /// - `LEDGER_ORDER_LOOKAHEAD_DAYS` (default: 2)
    /// - `LEDGER_INVOICE_DUE_DAYS` (default: 14)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development only)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
        };

        let api_base_url = lookup("LEDGER_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: "LEDGER_API_BASE_URL".to_string(),
                message: "Must be an http(s) URL".to_string(),
            });
        }

        let consumer_token = required("LEDGER_CONSUMER_TOKEN")?;
        let employee_token = required("LEDGER_EMPLOYEE_TOKEN")?;

        let timeout_secs: u64 = parse_or(&lookup, "LEDGER_HTTP_TIMEOUT_SECS", 30)?;
        let max_attempts: u32 = parse_or(&lookup, "LEDGER_RETRY_MAX_ATTEMPTS", 3)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                var: "LEDGER_RETRY_MAX_ATTEMPTS".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }
        let base_delay_ms: u64 = parse_or(&lookup, "LEDGER_RETRY_BASE_DELAY_MS", 1000)?;

        let windows = SyncWindows {
            invoice_lookback_days: parse_or(&lookup, "LEDGER_INVOICE_LOOKBACK_DAYS", 30)?,
            order_lookback_days: parse_or(&lookup, "LEDGER_ORDER_LOOKBACK_DAYS", 30)?,
            order_lookahead_days: parse_or(&lookup, "LEDGER_ORDER_LOOKAHEAD_DAYS", 2)?,
        };

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            consumer_token,
            employee_token,
            http_timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(base_delay_ms)),
            windows,
            invoice_due_days: parse_or(&lookup, "LEDGER_INVOICE_DUE_DAYS", 14)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var: name.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const TOKENS: [(&str, &str); 2] = [
        ("LEDGER_CONSUMER_TOKEN", "consumer"),
        ("LEDGER_EMPLOYEE_TOKEN", "employee"),
    ];

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::from_lookup(lookup(&TOKENS)).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.windows, SyncWindows::default());
        assert_eq!(config.invoice_due_days, 14);
    }

    #[test]
    fn test_missing_token() {
        let err = LedgerConfig::from_lookup(lookup(&[("LEDGER_CONSUMER_TOKEN", "c")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "LEDGER_EMPLOYEE_TOKEN"));
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let mut vars = TOKENS.to_vec();
        vars.push(("LEDGER_RETRY_BASE_DELAY_MS", "soon"));
        let err = LedgerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("LEDGER_RETRY_BASE_DELAY_MS"));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let mut vars = TOKENS.to_vec();
        vars.push(("LEDGER_API_BASE_URL", "http://localhost:9000/v2/"));
        vars.push(("LEDGER_RETRY_MAX_ATTEMPTS", "5"));
        vars.push(("LEDGER_ORDER_LOOKAHEAD_DAYS", "7"));
        let config = LedgerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:9000/v2");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.windows.order_lookahead_days, 7);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let config = LedgerConfig::from_lookup(lookup(&TOKENS)).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("consumer\""));
        assert!(rendered.contains("[REDACTED]"));
    }
}
