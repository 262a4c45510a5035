use thiserror::Error;

/// Errors returned by the Olmed auth client.
#[derive(Debug, Error)]
pub enum OlmedError {
    /// Network or TLS failure, or a non-2xx response from the auth API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Client construction failed (bad base URL or HTTP client settings).
    #[error("invalid client configuration: {0}")]
    Config(String),
}
