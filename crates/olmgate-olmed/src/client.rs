//! HTTP client for the Olmed ERP auth endpoints.
//!
//! Wraps `reqwest` with Olmed-specific error handling and typed response
//! deserialization. Login and refresh both parse the `{token, expiresIn}`
//! envelope; a missing `expiresIn` defaults to one hour. Transient failures
//! are retried with back-off; 4xx rejections are surfaced immediately.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::OlmedError;
use crate::retry::retry_with_backoff;
use crate::token::TokenInfo;

const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Client for the Olmed ERP auth API.
///
/// Use [`OlmedAuthClient::new`] for production or point `base_url` at a mock
/// server in tests.
pub struct OlmedAuthClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl OlmedAuthClient {
    /// Creates a new client for the given Olmed deployment.
    ///
    /// # Errors
    ///
    /// Returns [`OlmedError::Config`] if `base_url` is not a valid URL, or
    /// [`OlmedError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        timeout_secs: u64,
    ) -> Result<Self, OlmedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("olmgate/0.1 (olmed-integration)")
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // join() appends to the path rather than replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| OlmedError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            username: username.to_owned(),
            password: password.to_owned(),
            max_retries: 3,
            backoff_base_ms: 1_000,
        })
    }

    /// Overrides the transient-error retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Host component of the configured base URL.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.base_url.host_str()
    }

    /// Port of the configured base URL, falling back to the scheme default.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.base_url.port_or_known_default()
    }

    /// Exchanges the configured credentials for a fresh token.
    ///
    /// # Errors
    ///
    /// - [`OlmedError::Http`] on network failure or non-2xx status (after
    ///   transient-error retries).
    /// - [`OlmedError::Deserialize`] if the response is not a token envelope.
    pub async fn login(&self) -> Result<TokenInfo, OlmedError> {
        let url = self.endpoint("api/auth/login")?;
        let credentials = serde_json::json!({
            "username": self.username,
            "password": self.password,
        });

        let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let credentials = credentials.clone();
            async move {
                let response = self.client.post(url).json(&credentials).send().await?;
                Ok(response.error_for_status()?)
            }
        })
        .await?;

        Self::token_from_response("login", response).await
    }

    /// Trades a still-accepted token for a new one.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`OlmedAuthClient::login`]; a 401 here means the
    /// presented token is no longer accepted and the caller should fall back
    /// to a full login.
    pub async fn refresh(&self, current_token: &str) -> Result<TokenInfo, OlmedError> {
        let url = self.endpoint("api/auth/refresh")?;

        let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .post(url)
                    .bearer_auth(current_token)
                    .send()
                    .await?;
                Ok(response.error_for_status()?)
            }
        })
        .await?;

        Self::token_from_response("refresh", response).await
    }

    /// Invalidates `current_token` on the remote side.
    ///
    /// Not retried: the caller removes the local copy regardless of this
    /// call's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`OlmedError::Http`] on network failure or non-2xx status.
    pub async fn logout(&self, current_token: &str) -> Result<(), OlmedError> {
        let url = self.endpoint("api/auth/logout")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(current_token)
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url, OlmedError> {
        self.base_url
            .join(path)
            .map_err(|e| OlmedError::Config(format!("invalid endpoint path '{path}': {e}")))
    }

    async fn token_from_response(
        context: &str,
        response: reqwest::Response,
    ) -> Result<TokenInfo, OlmedError> {
        let body = response.text().await?;
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| OlmedError::Deserialize {
                context: context.to_owned(),
                source: e,
            })?;

        // A zero or missing TTL gets the documented one-hour default.
        let ttl_secs = parsed
            .expires_in
            .filter(|&secs| secs > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

        Ok(TokenInfo::new(parsed.token, ttl_secs))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    #[serde(rename = "expiresIn")]
    expires_in: Option<u64>,
}
