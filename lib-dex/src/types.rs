//! Request and response types shared by every DEX client

use serde::{Deserialize, Serialize};

use crate::errors::{DexError, DexResult};

/// Tradable token as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub address: String,
    pub decimals: u8,
    pub chain_id: String,
}

/// Price quote request, tokens given by contract address
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    /// Percent, e.g. `0.5` for half a percent
    pub slippage: f64,
}

/// Price quote
///
/// Token fields echo whatever identifiers the request used; callers working
/// with symbols overwrite them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub from_token: String,
    pub to_token: String,
    pub from_amount: String,
    pub to_amount: String,
    pub price: String,
    pub estimated_gas: String,
    pub dex_name: String,
    pub price_impact: String,
    pub slippage: String,
    pub min_received: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
}

/// Figures reported by an aggregator before price and floor are derived
#[derive(Debug, Clone, Default)]
pub(crate) struct RawQuote {
    pub to_amount: String,
    pub estimated_gas: String,
    pub dex_name: String,
    pub price_impact: String,
    pub tx_data: Option<String>,
    pub gas_price: Option<String>,
}

impl Quote {
    /// Complete a raw quote with `price = to / from` and
    /// `minReceived = to * (1 - slippage / 100)`
    pub(crate) fn from_raw(request: &QuoteRequest, raw: RawQuote) -> DexResult<Self> {
        let from = parse_amount(&request.amount).map_err(DexError::QuoteUnavailable)?;
        let to: f64 = raw
            .to_amount
            .parse()
            .map_err(|_| DexError::QuoteUnavailable(format!("invalid toAmount: {}", raw.to_amount)))?;

        Ok(Quote {
            from_token: request.from_token_address.clone(),
            to_token: request.to_token_address.clone(),
            from_amount: request.amount.clone(),
            price: (to / from).to_string(),
            min_received: min_received(to, request.slippage).to_string(),
            slippage: request.slippage.to_string(),
            to_amount: raw.to_amount,
            estimated_gas: raw.estimated_gas,
            dex_name: raw.dex_name,
            price_impact: raw.price_impact,
            tx_data: raw.tx_data,
            gas_price: raw.gas_price,
        })
    }
}

/// Lower bound on the received amount after slippage
pub fn min_received(to_amount: f64, slippage_percent: f64) -> f64 {
    to_amount * (1.0 - slippage_percent / 100.0)
}

/// Parse a strictly positive decimal amount
pub fn parse_amount(amount: &str) -> Result<f64, String> {
    match amount.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(format!("amount must be a positive number, got '{amount}'")),
    }
}

/// Swap preparation request
#[derive(Debug, Clone, PartialEq)]
pub struct SwapRequest {
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    pub recipient_address: String,
    /// Percent, e.g. `1` for one percent
    pub slippage: String,
    pub chain_id: String,
}

/// Unsigned transaction ready to be signed by the pool wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDescriptor {
    pub to: String,
    pub data: String,
    pub value: String,
    pub gas: String,
    pub gas_price: String,
    pub to_amount: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_must_be_positive_numbers() {
        assert_eq!(parse_amount("1.5"), Ok(1.5));
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-2").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("NaN").is_err());
    }

    #[test]
    fn raw_quote_is_priced_from_request() {
        let request = QuoteRequest {
            from_token_address: "0xfrom".into(),
            to_token_address: "0xto".into(),
            amount: "1".into(),
            slippage: 0.5,
        };
        let raw = RawQuote {
            to_amount: "3608628".into(),
            ..Default::default()
        };

        let quote = Quote::from_raw(&request, raw).unwrap();
        assert_eq!(quote.price, "3608628");
        assert_eq!(quote.min_received, "3590584.86");
        assert_eq!(quote.slippage, "0.5");
        assert_eq!(quote.from_token, "0xfrom");
    }

    #[test]
    fn non_numeric_aggregator_amount_is_rejected() {
        let request = QuoteRequest {
            from_token_address: "0xfrom".into(),
            to_token_address: "0xto".into(),
            amount: "1".into(),
            slippage: 0.5,
        };
        let raw = RawQuote {
            to_amount: "lots".into(),
            ..Default::default()
        };

        assert!(matches!(
            Quote::from_raw(&request, raw),
            Err(DexError::QuoteUnavailable(_))
        ));
    }
}
