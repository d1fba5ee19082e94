use std::time::Duration;

use thiserror::Error;

use crate::types::ConfigStatus;

/// Errors raised by a [`ConfigStore`](crate::store::ConfigStore) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("write conflict on {id}: expected status {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: ConfigStatus,
        actual: ConfigStatus,
    },

    #[error("record {id} is {status}; fee-determining fields are immutable")]
    Immutable { id: String, status: ConfigStatus },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the fee engine.
#[derive(Error, Debug)]
pub enum FeeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("fee configuration not found: {0}")]
    NotFound(String),

    #[error("cannot {operation} configuration {config_id} in status {status}")]
    InvalidState {
        config_id: String,
        status: ConfigStatus,
        operation: &'static str,
    },

    #[error("calculation error: {0}")]
    Calculation(String),

    #[error("store call {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl FeeError {
    pub(crate) fn invalid_state(
        config_id: impl Into<String>,
        status: ConfigStatus,
        operation: &'static str,
    ) -> Self {
        FeeError::InvalidState {
            config_id: config_id.into(),
            status,
            operation,
        }
    }
}

pub type Result<T> = std::result::Result<T, FeeError>;
