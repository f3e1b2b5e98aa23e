use std::fmt;

use thiserror::Error;

/// Why input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalid {
    EmptyText,
    MissingDate,
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyText => f.write_str("task text is empty"),
            Self::MissingDate => f.write_str("task date is missing or invalid"),
        }
    }
}

/// Typed outcomes of task operations.
///
/// Validation and lookup failures leave in-memory state untouched. A write
/// failure never rolls back the mutation that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("validation failed: {0}")]
    ValidationFailed(Invalid),

    #[error("task not found: {0}")]
    NotFound(String),

    #[error("failed to persist tasks: {0}")]
    PersistenceWriteFailed(String),

    #[error("stored tasks are unreadable: {0}")]
    PersistenceReadCorrupt(String),

    #[error("no edit in progress")]
    NoActiveEdit,
}

impl TaskError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationFailed(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
