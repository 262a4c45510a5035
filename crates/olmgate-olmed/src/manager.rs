//! Token lifecycle management.
//!
//! [`TokenManager`] pairs the token store with the auth client and implements
//! the refresh policy: tokens are refreshed proactively once they are within
//! the configured margin of expiry, a failed refresh falls back to a full
//! login, and logout always removes the local token whatever the remote side
//! says. The manager is an injected component, constructed once at process
//! start and shared by handle, never a process-wide static.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::client::OlmedAuthClient;
use crate::error::OlmedError;
use crate::token::{TokenInfo, TokenStore, OLMED_PROVIDER};

pub struct TokenManager {
    store: Arc<TokenStore>,
    client: OlmedAuthClient,
    provider_key: String,
    refresh_margin: Duration,
    /// Serialises refresh/login attempts so concurrent job executions do not
    /// stampede the auth endpoints. Waiters observe the winner's token.
    flight: tokio::sync::Mutex<()>,
}

impl TokenManager {
    #[must_use]
    pub fn new(store: Arc<TokenStore>, client: OlmedAuthClient, refresh_margin_secs: u64) -> Self {
        Self {
            store,
            client,
            provider_key: OLMED_PROVIDER.to_owned(),
            refresh_margin: Duration::seconds(
                i64::try_from(refresh_margin_secs).unwrap_or(i64::MAX),
            ),
            flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Snapshot of the current non-expired token, if any. No network calls.
    #[must_use]
    pub fn current(&self) -> Option<TokenInfo> {
        self.store.get(&self.provider_key)
    }

    /// Host of the Olmed deployment this manager authenticates against.
    #[must_use]
    pub fn olmed_host(&self) -> Option<&str> {
        self.client.host()
    }

    /// Port of the Olmed deployment, falling back to the scheme default.
    #[must_use]
    pub fn olmed_port(&self) -> Option<u16> {
        self.client.port()
    }

    /// Ensures a usable token is cached, refreshing or logging in as needed.
    ///
    /// - Fresh token (outside the refresh margin): returned as-is, no call.
    /// - Near-expiry token: refreshed; a failed refresh falls back to login.
    /// - Absent (or already expired, which the store treats as absent): login.
    ///
    /// # Errors
    ///
    /// Returns the login failure when no flow could produce a token.
    pub async fn refresh_if_needed(&self) -> Result<TokenInfo, OlmedError> {
        let now = Utc::now();
        if let Some(info) = self.store.get(&self.provider_key) {
            if !info.expires_within(now, self.refresh_margin) {
                return Ok(info);
            }
        }

        let _guard = self.flight.lock().await;

        // Re-check after acquiring: another caller may have refreshed while
        // we waited on the guard.
        let now = Utc::now();
        let current = self.store.get(&self.provider_key);
        if let Some(info) = &current {
            if !info.expires_within(now, self.refresh_margin) {
                return Ok(info.clone());
            }
        }

        let renewed = match current {
            Some(info) => match self.client.refresh(&info.token).await {
                Ok(renewed) => {
                    tracing::info!(provider = %self.provider_key, "token refreshed");
                    renewed
                }
                Err(e) => {
                    tracing::warn!(
                        provider = %self.provider_key,
                        error = %e,
                        "token refresh failed; falling back to login"
                    );
                    self.client.login().await?
                }
            },
            None => self.client.login().await?,
        };

        self.store.set(&self.provider_key, renewed.clone());
        Ok(renewed)
    }

    /// Unconditionally performs a full login and replaces the cached token.
    ///
    /// # Errors
    ///
    /// Surfaces the login failure; the cached token is left untouched.
    pub async fn login(&self) -> Result<TokenInfo, OlmedError> {
        let _guard = self.flight.lock().await;
        let info = self.client.login().await?;
        tracing::info!(provider = %self.provider_key, expires_at = %info.expires_at, "logged in");
        self.store.set(&self.provider_key, info.clone());
        Ok(info)
    }

    /// Logs out remotely and removes the cached token.
    ///
    /// The local token is removed even when the remote call fails: a token
    /// the remote side may have invalidated must not linger in the cache.
    /// Remote failures are logged, not surfaced.
    pub async fn logout(&self) {
        let _guard = self.flight.lock().await;
        let current = self.store.get(&self.provider_key);
        self.store.remove(&self.provider_key);

        if let Some(info) = current {
            if let Err(e) = self.client.logout(&info.token).await {
                tracing::warn!(
                    provider = %self.provider_key,
                    error = %e,
                    "remote logout failed; local token removed anyway"
                );
            }
        }
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("provider_key", &self.provider_key)
            .field("refresh_margin", &self.refresh_margin)
            .finish_non_exhaustive()
    }
}
