//! Remote platform authentication.
//!
//! The platform authenticates every request with HTTP Basic where the user is
//! `0` and the password is a session token. Session tokens are minted from a
//! consumer/employee token pair and cached until shortly before they lapse.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};

/// Lifetime of a cached session token. Sessions are requested to expire the
/// following day, so an hour of slack is kept.
const SESSION_TTL_HOURS: i64 = 23;

/// A bearer credential with its expiry.
///
/// The [`Debug`] impl redacts the token.
#[derive(Clone)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Value of the `Authorization` header for this credential.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let encoded = STANDARD.encode(format!("0:{}", self.token));
        format!("Basic {encoded}")
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of credentials for the remote client.
#[async_trait]
pub trait AuthProvider: Send + Sync + std::fmt::Debug {
    /// A currently valid credential, minting a new one if needed.
    async fn credential(&self) -> LedgerResult<Credential>;

    /// Drop any cached credential (e.g. after a 401).
    async fn invalidate(&self);
}

/// Serves one fixed token that never expires.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    credential: Credential,
}

impl StaticTokenProvider {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            credential: Credential::new(token, DateTime::<Utc>::MAX_UTC),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn credential(&self) -> LedgerResult<Credential> {
        Ok(self.credential.clone())
    }

    async fn invalidate(&self) {}
}

#[derive(Debug, Deserialize)]
struct SessionEnvelope {
    value: Option<SessionValue>,
}

#[derive(Debug, Deserialize)]
struct SessionValue {
    token: Option<String>,
}

/// Creates session tokens from a consumer/employee token pair.
///
/// The cached credential is shared across clones.
#[derive(Clone)]
pub struct SessionTokenProvider {
    base_url: String,
    consumer_token: String,
    employee_token: String,
    http_client: reqwest::Client,
    cached: Arc<RwLock<Option<Credential>>>,
}

impl std::fmt::Debug for SessionTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenProvider")
            .field("base_url", &self.base_url)
            .field("consumer_token", &"[REDACTED]")
            .field("employee_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SessionTokenProvider {
    #[must_use]
    pub fn new(
        base_url: &str,
        consumer_token: impl Into<String>,
        employee_token: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            consumer_token: consumer_token.into(),
            employee_token: employee_token.into(),
            http_client,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    async fn create_session(&self) -> LedgerResult<Credential> {
        let now = Utc::now();
        let expiration_date = (now + Duration::days(1)).format("%Y-%m-%d").to_string();
        let url = format!("{}/token/session/:create", self.base_url);

        debug!(url = %url, expiration_date = %expiration_date, "Creating session token");
        let response = self
            .http_client
            .put(&url)
            .query(&[
                ("consumerToken", self.consumer_token.as_str()),
                ("employeeToken", self.employee_token.as_str()),
                ("expirationDate", expiration_date.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LedgerError::Auth(format!("Session request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(LedgerError::Auth(format!(
                "Session endpoint returned {status}: {body}"
            )));
        }

        let envelope: SessionEnvelope = response
            .json()
            .await
            .map_err(|e| LedgerError::Auth(format!("Failed to parse session response: {e}")))?;
        let token = envelope
            .value
            .and_then(|v| v.token)
            .ok_or_else(|| LedgerError::Auth("Session response missing value.token".into()))?;

        info!("Session token created");
        Ok(Credential::new(token, now + Duration::hours(SESSION_TTL_HOURS)))
    }
}

#[async_trait]
impl AuthProvider for SessionTokenProvider {
    async fn credential(&self) -> LedgerResult<Credential> {
        {
            let cache = self.cached.read().await;
            if let Some(credential) = cache.as_ref() {
                if !credential.is_expired(Utc::now()) {
                    return Ok(credential.clone());
                }
            }
        }

        let mut cache = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(credential) = cache.as_ref() {
            if !credential.is_expired(Utc::now()) {
                return Ok(credential.clone());
            }
        }
        let credential = self.create_session().await?;
        *cache = Some(credential.clone());
        Ok(credential)
    }

    async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}
