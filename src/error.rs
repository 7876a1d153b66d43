use thiserror::Error;

/// Central error type for the pipeline system
#[derive(Error, Debug)]
pub enum NexusError {
    // ============================================================================
    // Stage Errors
    // ============================================================================
    #[error("Stage '{0}' does not implement process()")]
    NotImplemented(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    // ============================================================================
    // Registry Errors
    // ============================================================================
    #[error("Pipeline not found: {0}")]
    NotFound(String),

    #[error("Mutex lock error")]
    LockError,

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// Implement conversion from PoisonError for Mutex locks
impl<T> From<std::sync::PoisonError<T>> for NexusError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        NexusError::LockError
    }
}

// Helper type alias for Results
pub type NexusResult<T> = Result<T, NexusError>;
