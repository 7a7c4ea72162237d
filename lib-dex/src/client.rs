//! Client seams

use async_trait::async_trait;

use crate::errors::DexResult;
use crate::types::{Quote, QuoteRequest, SwapRequest, TokenInfo, TxDescriptor};

/// Quote and swap preparation against a liquidity aggregator
#[async_trait]
pub trait DexClient: Send + Sync {
    /// Price a swap; fails with `QuoteUnavailable`
    async fn get_quote(&self, request: &QuoteRequest) -> DexResult<Quote>;

    /// Build the transaction for a swap; fails with `ExecutionUnavailable`
    async fn prepare_swap_transaction(&self, request: &SwapRequest) -> DexResult<TxDescriptor>;
}

/// Source of tradable tokens
#[async_trait]
pub trait TokenCatalog: Send + Sync {
    async fn list_available_tokens(&self) -> DexResult<Vec<TokenInfo>>;
}
