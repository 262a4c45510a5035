//! Job execution.
//!
//! Builds and sends one outbound HTTP request from a job's request template.
//! Every failure mode (bad template, transport error, non-2xx status) is
//! folded into an [`ExecutionOutcome`] rather than surfaced as an error, so
//! a broken job can never take down the scheduler loop or its siblings.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use olmgate_olmed::TokenManager;
use reqwest::{Client, Method, Url};

use crate::error::SchedulerError;
use crate::job::{ExecutionOutcome, RequestTemplate};

const DEFAULT_RECORDED_BODY_LIMIT: usize = 2048;

pub struct JobExecutor {
    http: Client,
    tokens: Arc<TokenManager>,
    olmed_host: String,
    olmed_port: Option<u16>,
    max_recorded_body: usize,
}

impl JobExecutor {
    /// Creates an executor sharing the given token manager.
    ///
    /// The shared bearer token is only ever attached to requests whose host
    /// and port match the token manager's Olmed deployment.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(tokens: Arc<TokenManager>, timeout_secs: u64) -> Result<Self, SchedulerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("olmgate/0.1 (olmed-integration)")
            .build()?;

        let olmed_host = tokens.olmed_host().unwrap_or_default().to_owned();
        let olmed_port = tokens.olmed_port();

        Ok(Self {
            http,
            tokens,
            olmed_host,
            olmed_port,
            max_recorded_body: DEFAULT_RECORDED_BODY_LIMIT,
        })
    }

    /// Overrides how much of a response body is kept on the job record.
    #[must_use]
    pub fn with_recorded_body_limit(mut self, limit: usize) -> Self {
        self.max_recorded_body = limit;
        self
    }

    /// Executes one request from the template and reports the outcome.
    ///
    /// Success is determined by HTTP status class; transport-level failures
    /// are recorded with no status code. Never returns an error and never
    /// panics; the outcome is the only channel.
    pub async fn execute(&self, template: &RequestTemplate) -> ExecutionOutcome {
        let executed_at = Utc::now();

        match self.send(template).await {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let success = status.is_success();
                if !success {
                    tracing::warn!(
                        method = %template.method,
                        url = %template.url,
                        status = status.as_u16(),
                        "job request rejected by remote"
                    );
                }
                ExecutionOutcome {
                    success,
                    status_code: Some(status.as_u16()),
                    response_body: truncate_for_record(&body, self.max_recorded_body),
                    error: (!success).then(|| format!("HTTP {status}")),
                    executed_at,
                }
            }
            Err(e) => {
                tracing::warn!(
                    method = %template.method,
                    url = %template.url,
                    error = %e,
                    "job request failed before a response was received"
                );
                ExecutionOutcome {
                    success: false,
                    status_code: None,
                    response_body: String::new(),
                    error: Some(e.to_string()),
                    executed_at,
                }
            }
        }
    }

    async fn send(&self, template: &RequestTemplate) -> Result<reqwest::Response, SchedulerError> {
        let method: Method = template.method.to_uppercase().parse().map_err(|_| {
            SchedulerError::InvalidTemplate(format!("invalid HTTP method '{}'", template.method))
        })?;
        let url = Url::parse(&template.url).map_err(|e| {
            SchedulerError::InvalidTemplate(format!("invalid URL '{}': {e}", template.url))
        })?;

        let mut request = self.http.request(method.clone(), url.clone());

        // Copy caller headers, holding Content-Type back so it is only ever
        // applied together with a body.
        let mut content_type = None;
        for (name, value) in &template.headers {
            if name.eq_ignore_ascii_case("content-type") {
                content_type = Some(value.clone());
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }

        if let Some(token) = self.shared_auth_token(template, &url).await {
            request = request.bearer_auth(token);
        }

        if method_carries_body(&method) {
            if let Some(body) = template.body.as_deref().filter(|b| !b.is_empty()) {
                request = request
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        content_type.unwrap_or_else(|| "application/json".to_owned()),
                    )
                    .body(body.to_owned());
            }
        }

        Ok(request.send().await?)
    }

    /// Resolves the shared bearer token for a template, if it applies.
    ///
    /// A missing or expired token downgrades to an unauthenticated request;
    /// the downstream 401 surfaces as a normal failed outcome.
    async fn shared_auth_token(&self, template: &RequestTemplate, url: &Url) -> Option<String> {
        if !template.use_shared_auth {
            return None;
        }
        let host_matches = !self.olmed_host.is_empty()
            && url
                .host_str()
                .is_some_and(|h| h.eq_ignore_ascii_case(&self.olmed_host))
            && url.port_or_known_default() == self.olmed_port;
        if !host_matches {
            return None;
        }

        if let Err(e) = self.tokens.refresh_if_needed().await {
            tracing::warn!(error = %e, "shared token refresh failed; trying the cached token");
        }

        match self.tokens.current() {
            Some(info) => Some(info.token),
            None => {
                tracing::warn!(
                    url = %url,
                    "no valid shared token available; sending request unauthenticated"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for JobExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobExecutor")
            .field("olmed_host", &self.olmed_host)
            .field("max_recorded_body", &self.max_recorded_body)
            .finish_non_exhaustive()
    }
}

fn method_carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn truncate_for_record(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        return body.to_owned();
    }
    let mut end = limit;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_put_patch_carry_bodies() {
        assert!(method_carries_body(&Method::POST));
        assert!(method_carries_body(&Method::PUT));
        assert!(method_carries_body(&Method::PATCH));
        assert!(!method_carries_body(&Method::GET));
        assert!(!method_carries_body(&Method::DELETE));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_for_record("hello", 10), "hello");
        assert_eq!(truncate_for_record("hello", 3), "hel");
        // "é" is two bytes; cutting mid-char must back off.
        assert_eq!(truncate_for_record("éé", 3), "é");
    }
}
