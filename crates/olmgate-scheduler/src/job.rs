use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;

/// HTTP request template re-sent verbatim on every execution of a job.
///
/// Immutable once attached to a job; only the shared-auth bearer header is
/// injected dynamically at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTemplate {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub use_shared_auth: bool,
}

/// Result of one execution attempt, recorded on the owning job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub success: bool,
    pub status_code: Option<u16>,
    /// Response body, truncated for bookkeeping.
    pub response_body: String,
    #[serde(default)]
    pub error: Option<String>,
    pub executed_at: DateTime<Utc>,
}

/// A named recurring unit of work: a schedule plus a request template,
/// with the runtime bookkeeping the scheduler loop maintains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub schedule: Schedule,
    pub request: RequestTemplate,
    pub next_execution: DateTime<Utc>,
    #[serde(default)]
    pub last_execution: Option<DateTime<Utc>>,
    pub execution_count: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_outcome: Option<ExecutionOutcome>,
}
