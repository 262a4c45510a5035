use thiserror::Error;

/// Errors produced by the scheduling subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A schedule failed validation and was rejected before entering the registry.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// A request template could not be turned into an HTTP request.
    #[error("invalid request template: {0}")]
    InvalidTemplate(String),

    /// Failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
