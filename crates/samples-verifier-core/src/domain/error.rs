//! Error taxonomy for the samples verifier.
//!
//! Only pipeline-level failures live here. Compile errors, warnings and
//! exceptions thrown by a snippet are data carried in
//! [`ExecutionResult`](super::ExecutionResult), never a `VerifierError`.

/// Samples verifier errors.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("git error: {0}")]
    Git(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{operation} timed out after {limit_ms}ms")]
    Timeout { operation: String, limit_ms: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifierError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VerifierError::Transport(_) | VerifierError::Timeout { .. }
        )
    }
}

impl From<reqwest::Error> for VerifierError {
    fn from(err: reqwest::Error) -> Self {
        VerifierError::Transport(err.to_string())
    }
}

impl From<ignore::Error> for VerifierError {
    fn from(err: ignore::Error) -> Self {
        match err.into_io_error() {
            Some(io) => VerifierError::Io(io),
            None => VerifierError::Io(std::io::Error::other("directory walk failed")),
        }
    }
}

/// Result type for samples verifier operations.
pub type Result<T> = std::result::Result<T, VerifierError>;
