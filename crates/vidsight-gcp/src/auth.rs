//! Access tokens for Google REST APIs.
//!
//! [`TokenCache`] keeps one token per process and shares it between the
//! annotation and BigQuery clients. Refreshes happen under the write lock,
//! so concurrent callers wait for a single provider call. If the provider
//! fails while the old token has not yet expired, the old token is served.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gcp_auth::TokenProvider;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Refresh tokens this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// TTL used when the provider reports an unusable expiry.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// Scope covering Video Intelligence and BigQuery.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Debug, Error)]
#[error("Authentication failed: {0}")]
pub struct AuthError(pub String);

impl AuthError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Source of bearer tokens for API calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// A currently valid access token.
    async fn access_token(&self) -> Result<String, AuthError>;

    /// Drop any cached token so the next call fetches a fresh one.
    async fn invalidate(&self) {}
}

/// Fixed token, for emulators and tests.
#[derive(Debug, Clone)]
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn from_provider(token: &gcp_auth::Token) -> Self {
        Self {
            access_token: token.as_str().to_string(),
            expires_at: expiry_deadline(token.expires_at(), Utc::now()),
        }
    }

    /// Outside the refresh margin.
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    /// Not yet expired, margin or not.
    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Map a wall-clock expiry onto the monotonic clock. Past expiries map to
/// now; expiries too far out to represent use the default TTL.
fn expiry_deadline(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Instant {
    if expires_at <= now {
        return Instant::now();
    }
    let ttl = (expires_at - now).to_std().unwrap_or(TOKEN_DEFAULT_TTL);
    Instant::now() + ttl
}

/// Caching token source backed by a gcp_auth provider.
pub struct TokenCache {
    auth: Arc<dyn TokenProvider>,
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth,
            slot: RwLock::new(None),
        }
    }

    /// Discover credentials the standard way (metadata server,
    /// `GOOGLE_APPLICATION_CREDENTIALS`, gcloud user credentials).
    pub async fn discover() -> Result<Self, AuthError> {
        let auth = gcp_auth::provider()
            .await
            .map_err(|e| AuthError::new(format!("No usable Google credentials: {}", e)))?;
        Ok(Self::new(auth))
    }

    async fn cached(&self) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|t| t.is_valid())
            .map(|t| t.access_token.clone())
    }
}

#[async_trait]
impl TokenSource for TokenCache {
    async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        let mut slot = self.slot.write().await;
        if let Some(current) = slot.as_ref().filter(|t| t.is_valid()) {
            return Ok(current.access_token.clone());
        }

        match self.auth.token(&[CLOUD_PLATFORM_SCOPE]).await {
            Ok(token) => {
                let fresh = CachedToken::from_provider(&token);
                let access_token = fresh.access_token.clone();
                *slot = Some(fresh);
                debug!("Refreshed Google access token");
                Ok(access_token)
            }
            Err(e) => match slot.as_ref().filter(|t| t.is_usable()) {
                Some(stale) => {
                    warn!(error = %e, "Token refresh failed, serving unexpired token");
                    Ok(stale.access_token.clone())
                }
                None => Err(AuthError::new(format!("Failed to obtain auth token: {}", e))),
            },
        }
    }

    async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}
