//! DEX client errors

use thiserror::Error;

/// Failure talking to the aggregator or the token catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DexError {
    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("Swap execution unavailable: {0}")]
    ExecutionUnavailable(String),

    #[error("Token catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

/// Result type for DEX operations
pub type DexResult<T> = Result<T, DexError>;
