//! Step-local error types.

use thiserror::Error;

use super::table::CsvError;

/// Result type for node hooks.
pub type NodeResult<T> = Result<T, NodeError>;

/// Failure raised by a step while preparing, executing or cleaning up.
///
/// The engine wraps these into [`WorkflowError`] together with the ID and
/// type of the node that raised them.
///
/// [`WorkflowError`]: crate::WorkflowError
#[derive(Debug, Error)]
pub enum NodeError {
    /// A required input slot holds no value.
    #[error("no value on input slot '{slot}'")]
    MissingInput {
        /// Name of the empty slot.
        slot: String,
    },

    /// An input slot holds a value of the wrong shape.
    #[error("input slot '{slot}' expected {expected}, found {found}")]
    InvalidInput {
        /// Name of the slot.
        slot: String,
        /// Shape the step accepts.
        expected: &'static str,
        /// Shape that was supplied.
        found: &'static str,
    },

    /// A configured column does not exist in the input table.
    #[error("column '{column}' not found (available: {})", .available.join(", "))]
    ColumnNotFound {
        /// Requested column name.
        column: String,
        /// Columns of the input table.
        available: Vec<String>,
    },

    /// The payload could not be parsed.
    #[error(transparent)]
    Parse(#[from] CsvError),

    /// Any other step failure.
    #[error("{0}")]
    Failed(String),
}

impl NodeError {
    /// Creates a generic failure from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Returns whether this error reports an empty input slot.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::MissingInput { .. })
    }

    /// Returns the slot named by a missing-input error.
    pub fn missing_slot(&self) -> Option<&str> {
        match self {
            Self::MissingInput { slot } => Some(slot),
            _ => None,
        }
    }
}
