//! Pool Governance Errors

use lib_dex::DexError;
use lib_pool_storage::StorageError;
use lib_pool_types::{InvalidTransition, Transaction};
use thiserror::Error;
use tracing::error;

/// Caller-visible error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidState,
    Conflict,
    InvalidInput,
    ExternalUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::InvalidState => "INVALID_STATE",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::ExternalUnavailable => "EXTERNAL_UNAVAILABLE",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Error during pool governance operations
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service unavailable: {0}")]
    ExternalUnavailable(String),

    /// Swap preparation failed; the failed transaction has been persisted
    #[error("Swap execution failed: {reason}")]
    SwapFailed {
        transaction: Box<Transaction>,
        reason: String,
    },

    #[error("Internal error")]
    Internal,
}

impl PoolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::NotFound(_) => ErrorKind::NotFound,
            PoolError::Unauthorized(_) => ErrorKind::Unauthorized,
            PoolError::InvalidState(_) => ErrorKind::InvalidState,
            PoolError::Conflict(_) => ErrorKind::Conflict,
            PoolError::InvalidInput(_) => ErrorKind::InvalidInput,
            PoolError::ExternalUnavailable(_) | PoolError::SwapFailed { .. } => {
                ErrorKind::ExternalUnavailable
            }
            PoolError::Internal => ErrorKind::Internal,
        }
    }

    /// Persisted failed transaction, for `SwapFailed`
    pub fn failed_transaction(&self) -> Option<&Transaction> {
        match self {
            PoolError::SwapFailed { transaction, .. } => Some(transaction),
            _ => None,
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        PoolError::NotFound(what.into())
    }
}

impl From<StorageError> for PoolError {
    fn from(err: StorageError) -> Self {
        error!("Storage failure: {}", err);
        PoolError::Internal
    }
}

impl From<DexError> for PoolError {
    fn from(err: DexError) -> Self {
        PoolError::ExternalUnavailable(err.to_string())
    }
}

impl From<InvalidTransition> for PoolError {
    fn from(err: InvalidTransition) -> Self {
        PoolError::InvalidState(err.to_string())
    }
}

/// Result type for pool governance operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Reject blank required fields
pub(crate) fn require(field: &str, value: &str) -> PoolResult<()> {
    if value.trim().is_empty() {
        return Err(PoolError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_detail_is_not_exposed() {
        let err: PoolError = StorageError::Migration("table swap_proposals is locked".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "Internal error");
    }

    #[test]
    fn blank_fields_are_invalid_input() {
        assert!(require("name", "pool").is_ok());
        let err = require("name", "   ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("name"));
    }
}
