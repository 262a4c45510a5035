use thiserror::Error;

/// Errors produced while loading gateway configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sync config file {path}: {source}")]
    SyncFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sync config file {path}: {source}")]
    SyncFileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid sync config: {0}")]
    Validation(String),
}
