//! Local stand-in for an aggregator
//!
//! Prices every pair at a flat 5% haircut and reports fixed gas figures.

use async_trait::async_trait;
use tracing::debug;

use crate::client::{DexClient, TokenCatalog};
use crate::errors::{DexError, DexResult};
use crate::tokens::{builtin_tokens, NATIVE_TOKEN_ADDRESS, ZERO_ADDRESS};
use crate::types::{parse_amount, Quote, QuoteRequest, RawQuote, SwapRequest, TokenInfo, TxDescriptor};

const HAIRCUT: f64 = 0.95;
const ESTIMATED_GAS: &str = "210000";
const GAS_PRICE: &str = "20000000000";
const ROUTER_ADDRESS: &str = "0x111111125421cA6dc452d289314280a0f8842A65";
const DEX_NAME: &str = "Simulated DEX";

/// Deterministic demo client
#[derive(Debug, Clone)]
pub struct SimulatedDexClient {
    chain_id: String,
}

impl SimulatedDexClient {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
        }
    }

    fn is_native(address: &str) -> bool {
        address.eq_ignore_ascii_case(NATIVE_TOKEN_ADDRESS) || address == ZERO_ADDRESS
    }
}

impl Default for SimulatedDexClient {
    fn default() -> Self {
        Self::new("196")
    }
}

#[async_trait]
impl DexClient for SimulatedDexClient {
    async fn get_quote(&self, request: &QuoteRequest) -> DexResult<Quote> {
        let from = parse_amount(&request.amount).map_err(DexError::QuoteUnavailable)?;
        debug!(
            "Simulated quote: {} {} -> {}",
            request.amount, request.from_token_address, request.to_token_address
        );

        let raw = RawQuote {
            to_amount: (from * HAIRCUT).to_string(),
            estimated_gas: ESTIMATED_GAS.to_string(),
            dex_name: DEX_NAME.to_string(),
            price_impact: "0".to_string(),
            tx_data: Some("0x".to_string()),
            gas_price: Some(GAS_PRICE.to_string()),
        };
        Quote::from_raw(request, raw)
    }

    async fn prepare_swap_transaction(&self, request: &SwapRequest) -> DexResult<TxDescriptor> {
        let from = parse_amount(&request.amount).map_err(DexError::ExecutionUnavailable)?;
        debug!(
            "Simulated swap for {}: {} {} -> {}",
            request.recipient_address, request.amount, request.from_token_address, request.to_token_address
        );

        let value = if Self::is_native(&request.from_token_address) {
            request.amount.clone()
        } else {
            "0".to_string()
        };

        Ok(TxDescriptor {
            to: ROUTER_ADDRESS.to_string(),
            data: "0x".to_string(),
            value,
            gas: ESTIMATED_GAS.to_string(),
            gas_price: GAS_PRICE.to_string(),
            to_amount: (from * HAIRCUT).to_string(),
        })
    }
}

#[async_trait]
impl TokenCatalog for SimulatedDexClient {
    async fn list_available_tokens(&self) -> DexResult<Vec<TokenInfo>> {
        Ok(builtin_tokens(&self.chain_id))
    }
}
