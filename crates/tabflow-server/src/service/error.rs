//! Service layer error types.

use tabflow_runtime::WorkflowError;

/// Result type alias for service layer operations.
pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

/// Errors raised by the service layer outside of HTTP handling.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Service configuration is invalid.
    #[error("invalid service configuration: {0}")]
    Config(String),

    /// The runner stopped accepting workflow runs.
    #[error("workflow runner is closed")]
    Closed,

    /// The blocking worker executing a run did not complete.
    #[error("workflow run aborted: {0}")]
    Aborted(String),

    /// The workflow failed to build or run.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl ServiceError {
    /// Creates a new configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
