//! OKX DEX Aggregator Client
//!
//! Signed REST client for the OKX DEX aggregator.
//! See: https://web3.okx.com/build/docs/waas/dex-get-quote

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use sha2::Sha256;
use tracing::{debug, warn};

use crate::client::{DexClient, TokenCatalog};
use crate::errors::{DexError, DexResult};
use crate::types::{parse_amount, Quote, QuoteRequest, RawQuote, SwapRequest, TokenInfo, TxDescriptor};

type HmacSha256 = Hmac<Sha256>;

const ALL_TOKENS_PATH: &str = "/api/v5/dex/aggregator/all-tokens";
const QUOTE_PATH: &str = "/api/v5/dex/aggregator/quote";
const SWAP_PATH: &str = "/api/v5/dex/aggregator/swap";

/// Connection settings and credentials
#[derive(Debug, Clone)]
pub struct OkxConfig {
    pub base_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
    /// Chain used for catalog lookups and quotes
    pub chain_index: String,
    pub timeout: Duration,
}

impl Default for OkxConfig {
    fn default() -> Self {
        Self {
            base_url: "https://web3.okx.com".to_string(),
            api_key: String::new(),
            secret_key: String::new(),
            passphrase: String::new(),
            chain_index: "196".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl OkxConfig {
    /// All three credentials present
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.secret_key.is_empty() && !self.passphrase.is_empty()
    }
}

/// OKX DEX aggregator client
pub struct OkxDexClient {
    config: OkxConfig,
    client: reqwest::Client,
}

/// Response wrapper common to every OKX endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<Vec<T>, String> {
        if self.code != "0" {
            return Err(format!("OKX error {}: {}", self.code, self.msg));
        }
        Ok(self.data)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxToken {
    token_contract_address: String,
    token_symbol: String,
    #[serde(default)]
    token_name: String,
    #[serde(deserialize_with = "u8_from_string_or_number")]
    decimals: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxQuote {
    to_token_amount: String,
    #[serde(default)]
    estimate_gas_fee: String,
    #[serde(default)]
    price_impact_percentage: String,
    #[serde(default)]
    dex_router_list: Vec<OkxRouter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxRouter {
    #[serde(default)]
    sub_router_list: Vec<OkxSubRouter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxSubRouter {
    #[serde(default)]
    dex_protocol: Vec<OkxProtocol>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxProtocol {
    dex_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxSwap {
    router_result: OkxQuote,
    tx: OkxTx,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxTx {
    to: String,
    data: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    gas: String,
    #[serde(default)]
    gas_price: String,
}

fn u8_from_string_or_number<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::String(s) => s.parse::<u8>().ok(),
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        _ => None,
    };
    parsed.ok_or_else(|| serde::de::Error::custom(format!("invalid decimals: {value}")))
}

impl OkxQuote {
    fn into_raw(self) -> RawQuote {
        let dex_name = self
            .dex_router_list
            .iter()
            .flat_map(|r| r.sub_router_list.iter())
            .flat_map(|s| s.dex_protocol.iter())
            .map(|p| p.dex_name.clone())
            .next()
            .unwrap_or_else(|| "OKX DEX".to_string());

        RawQuote {
            to_amount: self.to_token_amount,
            estimated_gas: self.estimate_gas_fee,
            dex_name,
            price_impact: self.price_impact_percentage,
            tx_data: None,
            gas_price: None,
        }
    }
}

impl From<OkxToken> for TokenInfo {
    fn from(token: OkxToken) -> Self {
        TokenInfo {
            symbol: token.token_symbol,
            name: token.token_name,
            address: token.token_contract_address,
            decimals: token.decimals,
            chain_id: String::new(),
        }
    }
}

impl OkxDexClient {
    /// Create a new client for the given settings
    pub fn new(config: OkxConfig) -> Self {
        if !config.has_credentials() {
            warn!("OKX client created without full API credentials; signed endpoints will be rejected");
        }
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Base64 HMAC-SHA256 over `timestamp + method + requestPath + body`
    pub fn sign(secret: &str, timestamp: &str, method: &str, request_path: &str, body: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC key length is valid");
        mac.update(timestamp.as_bytes());
        mac.update(method.as_bytes());
        mac.update(request_path.as_bytes());
        mac.update(body.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    fn timestamp() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Signed GET returning the envelope's data array
    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<T>, String> {
        let url = reqwest::Url::parse_with_params(&format!("{}{}", self.config.base_url, path), params)
            .map_err(|e| format!("invalid URL: {e}"))?;
        let request_path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let timestamp = Self::timestamp();
        let signature = Self::sign(&self.config.secret_key, &timestamp, "GET", &request_path, "");
        debug!("OKX GET {}", request_path);

        let resp = self
            .client
            .get(url)
            .timeout(self.config.timeout)
            .header("Content-Type", "application/json")
            .header("OK-ACCESS-KEY", &self.config.api_key)
            .header("OK-ACCESS-SIGN", signature)
            .header("OK-ACCESS-TIMESTAMP", timestamp)
            .header("OK-ACCESS-PASSPHRASE", &self.config.passphrase)
            .send()
            .await
            .map_err(|e| format!("request to {path} failed: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("HTTP {status} - {body}"));
        }

        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| format!("failed to parse response from {path}: {e}"))?;
        envelope.into_data()
    }
}

/// OKX expects slippage as a fraction, callers pass percent
fn slippage_fraction(percent: &str) -> Result<String, String> {
    let value: f64 = percent
        .trim()
        .parse()
        .map_err(|_| format!("invalid slippage '{percent}'"))?;
    if !(0.0..100.0).contains(&value) {
        return Err(format!("slippage out of range: {percent}"));
    }
    Ok((value / 100.0).to_string())
}

#[async_trait]
impl DexClient for OkxDexClient {
    async fn get_quote(&self, request: &QuoteRequest) -> DexResult<Quote> {
        parse_amount(&request.amount).map_err(DexError::QuoteUnavailable)?;

        let params = [
            ("chainIndex", self.config.chain_index.clone()),
            ("chainId", self.config.chain_index.clone()),
            ("amount", request.amount.clone()),
            ("fromTokenAddress", request.from_token_address.clone()),
            ("toTokenAddress", request.to_token_address.clone()),
            ("swapMode", "exactIn".to_string()),
        ];

        let quote = self
            .get::<OkxQuote>(QUOTE_PATH, &params)
            .await
            .map_err(DexError::QuoteUnavailable)?
            .into_iter()
            .next()
            .ok_or_else(|| DexError::QuoteUnavailable("no route returned".to_string()))?;

        Quote::from_raw(request, quote.into_raw())
    }

    async fn prepare_swap_transaction(&self, request: &SwapRequest) -> DexResult<TxDescriptor> {
        parse_amount(&request.amount).map_err(DexError::ExecutionUnavailable)?;
        let slippage = slippage_fraction(&request.slippage).map_err(DexError::ExecutionUnavailable)?;

        let params = [
            ("chainIndex", request.chain_id.clone()),
            ("chainId", request.chain_id.clone()),
            ("amount", request.amount.clone()),
            ("fromTokenAddress", request.from_token_address.clone()),
            ("toTokenAddress", request.to_token_address.clone()),
            ("slippage", slippage),
            ("userWalletAddress", request.recipient_address.clone()),
            ("swapReceiverAddress", request.recipient_address.clone()),
        ];

        let swap = self
            .get::<OkxSwap>(SWAP_PATH, &params)
            .await
            .map_err(DexError::ExecutionUnavailable)?
            .into_iter()
            .next()
            .ok_or_else(|| DexError::ExecutionUnavailable("no swap route returned".to_string()))?;

        Ok(TxDescriptor {
            to: swap.tx.to,
            data: swap.tx.data,
            value: swap.tx.value,
            gas: swap.tx.gas,
            gas_price: swap.tx.gas_price,
            to_amount: swap.router_result.to_token_amount,
        })
    }
}

#[async_trait]
impl TokenCatalog for OkxDexClient {
    async fn list_available_tokens(&self) -> DexResult<Vec<TokenInfo>> {
        let params = [("chainIndex", self.config.chain_index.clone())];

        let tokens = self
            .get::<OkxToken>(ALL_TOKENS_PATH, &params)
            .await
            .map_err(DexError::CatalogUnavailable)?;

        Ok(tokens
            .into_iter()
            .map(|token| TokenInfo {
                chain_id: self.config.chain_index.clone(),
                ..TokenInfo::from(token)
            })
            .collect())
    }
}
