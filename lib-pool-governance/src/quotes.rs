//! Price quotes by token symbol

use lib_dex::{parse_amount, quote_address, DexError, Quote, QuoteRequest, TokenInfo};
use serde::Deserialize;
use tracing::debug;

use crate::errors::{require, PoolError, PoolResult};
use crate::service::SwapPoolService;

/// Default slippage tolerance in percent
pub const DEFAULT_QUOTE_SLIPPAGE: f64 = 0.5;

/// Quote request by token symbol
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSwapRequest {
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
    /// Percent; defaults to [`DEFAULT_QUOTE_SLIPPAGE`]
    #[serde(default)]
    pub slippage: Option<String>,
}

impl SwapPoolService {
    /// Tokens the DEX can trade
    pub async fn list_available_tokens(&self) -> PoolResult<Vec<TokenInfo>> {
        Ok(self.catalog.list_available_tokens().await?)
    }

    /// Quote a swap between two catalog symbols
    pub async fn quote_swap(&self, request: QuoteSwapRequest) -> PoolResult<Quote> {
        require("fromToken", &request.from_token)?;
        require("toToken", &request.to_token)?;
        require("amount", &request.amount)?;
        parse_amount(&request.amount).map_err(PoolError::InvalidInput)?;

        let slippage = match request.slippage.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_QUOTE_SLIPPAGE,
            Some(s) => s
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && (0.0..100.0).contains(v))
                .ok_or_else(|| PoolError::InvalidInput(format!("invalid slippage '{s}'")))?,
        };

        let tokens = self.catalog.list_available_tokens().await?;
        let from = find_token(&tokens, &request.from_token)?;
        let to = find_token(&tokens, &request.to_token)?;

        debug!(
            "Quoting {} {} -> {} at {}% slippage",
            request.amount, from.symbol, to.symbol, slippage
        );

        let mut quote = self
            .dex
            .get_quote(&QuoteRequest {
                from_token_address: quote_address(from).to_string(),
                to_token_address: quote_address(to).to_string(),
                amount: request.amount.clone(),
                slippage,
            })
            .await?;

        quote.from_token = from.symbol.clone();
        quote.to_token = to.symbol.clone();
        Ok(quote)
    }
}

fn find_token<'a>(tokens: &'a [TokenInfo], symbol: &str) -> PoolResult<&'a TokenInfo> {
    tokens
        .iter()
        .find(|t| t.symbol == symbol)
        .ok_or_else(|| DexError::QuoteUnavailable(format!("token not found: {symbol}")).into())
}
