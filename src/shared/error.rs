//! Gateway Error Types
//!
//! Errors are operational: they are logged and counted, never sent over the
//! socket protocol.

/// Failure to turn an inbound text frame into an event.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame is not a JSON object")]
    NotAnObject,

    #[error("Malformed event: {0}")]
    Malformed(serde_json::Error),

    #[error("Invalid field {field}: {message}")]
    Invalid { field: String, message: String },
}

impl FrameError {
    /// Short label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            FrameError::Json(_) => "invalid_json",
            FrameError::NotAnObject => "not_an_object",
            FrameError::Malformed(_) => "missing_field",
            FrameError::Invalid { .. } => "invalid_field",
        }
    }
}

/// Failure of the external profile store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to read profile seed {path}: {source}")]
    SeedIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile seed: {0}")]
    SeedFormat(#[from] serde_json::Error),

    #[error("Profile store unavailable: {0}")]
    Unavailable(String),
}
