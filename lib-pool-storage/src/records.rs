//! Insert and update payloads
//!
//! Ids and timestamps are assigned by the store.

use lib_pool_types::{PoolVisibility, TransactionStatus, TransactionType};

/// Pool row to insert
#[derive(Debug, Clone)]
pub struct NewPool {
    pub name: String,
    pub description: Option<String>,
    pub multisig_address: String,
    pub creator_id: String,
    pub visibility: PoolVisibility,
    pub join_code: Option<String>,
    pub required_signatures: u32,
}

/// Token balance to insert or overwrite, keyed by (pool, symbol)
#[derive(Debug, Clone)]
pub struct NewToken {
    pub pool_id: String,
    pub symbol: String,
    pub address: Option<String>,
    pub decimals: u8,
    pub balance: String,
}

/// Swap proposal to insert; always starts `PENDING`
#[derive(Debug, Clone)]
pub struct NewProposal {
    pub pool_id: String,
    pub proposer_id: String,
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
    pub min_received: String,
}

/// Ledger entry to insert
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub pool_id: String,
    pub proposal_id: Option<String>,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub amount: Option<String>,
    pub error_message: Option<String>,
}

impl NewTransaction {
    /// Ledger entry without token movement (pool creation, withdrawal)
    pub fn event(pool_id: impl Into<String>, tx_type: TransactionType) -> Self {
        Self {
            pool_id: pool_id.into(),
            proposal_id: None,
            tx_type,
            status: TransactionStatus::Success,
            from_token: None,
            to_token: None,
            amount: None,
            error_message: None,
        }
    }
}

/// Terminal outcome written to a `PENDING` transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementUpdate {
    pub status: TransactionStatus,
    pub tx_hash: Option<String>,
    pub gas_used: Option<String>,
    pub gas_price: Option<String>,
    pub error_message: Option<String>,
}
