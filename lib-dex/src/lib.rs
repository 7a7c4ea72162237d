//! DEX aggregator access for social swap pools
//!
//! Two seams are exposed: [`DexClient`] for quotes and swap preparation, and
//! [`TokenCatalog`] for the list of tradable tokens. [`OkxDexClient`] talks to
//! the OKX DEX aggregator REST API; [`SimulatedDexClient`] answers locally
//! with fixed figures and is used when no API credentials are configured.

pub mod client;
pub mod errors;
pub mod okx;
pub mod simulated;
pub mod tokens;
pub mod types;

pub use client::{DexClient, TokenCatalog};
pub use errors::{DexError, DexResult};
pub use okx::{OkxConfig, OkxDexClient};
pub use simulated::SimulatedDexClient;
pub use tokens::{builtin_tokens, execution_address, quote_address, NATIVE_TOKEN_ADDRESS, ZERO_ADDRESS};
pub use types::{min_received, parse_amount, Quote, QuoteRequest, SwapRequest, TokenInfo, TxDescriptor};
