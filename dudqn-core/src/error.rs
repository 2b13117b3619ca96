//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DudqnError {
    /// The replay buffer holds fewer valid transitions than requested.
    #[error("Insufficient data: requested {requested} transitions, {available} available")]
    InsufficientData {
        /// Requested batch size.
        requested: usize,
        /// Number of valid transitions in the buffer.
        available: usize,
    },

    /// A vector or tensor has an unexpected size.
    #[error("Dimension mismatch in {name}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// What was checked.
        name: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// An action index outside `[0, n_actions)`.
    #[error("Invalid action {action}: the action space has {n_actions} actions")]
    InvalidAction {
        /// The offending action.
        action: usize,
        /// Number of discrete actions.
        n_actions: usize,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),
}

impl DudqnError {
    /// Shorthand for [`DudqnError::DimensionMismatch`].
    pub fn dimension_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }
}
