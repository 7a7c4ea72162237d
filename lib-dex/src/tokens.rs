//! Well-known addresses and the built-in X Layer token list

use crate::types::TokenInfo;

/// Aggregator sentinel for the chain's native token
pub const NATIVE_TOKEN_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// Native token as passed to swap preparation
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Native token symbol
pub const NATIVE_SYMBOL: &str = "ETH";

const BUILTIN: &[(&str, &str, &str, u8)] = &[
    ("ETH", "Ethereum", NATIVE_TOKEN_ADDRESS, 18),
    ("WETH", "Wrapped Ethereum", "0x4200000000000000000000000000000000000006", 18),
    ("USDT", "Tether USD", "0xfd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9", 6),
    ("USDC", "USD Coin", "0x948d2a81086a075b3130b43763d280ae6cd99a09", 6),
    ("OKB", "OKB", "0xda3b25e1f5d34c843c5ef6a7f5e2d6c9415684a0", 18),
];

/// Tokens known without asking an aggregator
pub fn builtin_tokens(chain_id: &str) -> Vec<TokenInfo> {
    BUILTIN
        .iter()
        .map(|(symbol, name, address, decimals)| TokenInfo {
            symbol: symbol.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            decimals: *decimals,
            chain_id: chain_id.to_string(),
        })
        .collect()
}

/// Address a token symbol resolves to when quoting
///
/// The native token always maps to [`NATIVE_TOKEN_ADDRESS`], whatever the
/// catalog reports for it.
pub fn quote_address(token: &TokenInfo) -> &str {
    if token.symbol == NATIVE_SYMBOL {
        NATIVE_TOKEN_ADDRESS
    } else {
        &token.address
    }
}

/// Token identifier as passed to swap preparation
pub fn execution_address(token: &str) -> &str {
    if token == NATIVE_SYMBOL {
        ZERO_ADDRESS
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_list_carries_chain_and_decimals() {
        let tokens = builtin_tokens("196");
        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().all(|t| t.chain_id == "196"));

        let usdt = tokens.iter().find(|t| t.symbol == "USDT").unwrap();
        assert_eq!(usdt.decimals, 6);
    }

    #[test]
    fn native_token_maps_to_sentinels() {
        let eth = TokenInfo {
            symbol: "ETH".into(),
            name: "Ethereum".into(),
            address: "0xsomething-else".into(),
            decimals: 18,
            chain_id: "196".into(),
        };
        assert_eq!(quote_address(&eth), NATIVE_TOKEN_ADDRESS);
        assert_eq!(execution_address("ETH"), ZERO_ADDRESS);
        assert_eq!(execution_address("USDT"), "USDT");
    }
}
