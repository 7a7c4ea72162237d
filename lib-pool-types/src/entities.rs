//! Pool entities
//!
//! Identifiers are opaque strings (UUIDs minted by the store). Amounts and
//! balances are decimal strings exactly as supplied by callers or the DEX.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{MemberRole, PoolVisibility, TransactionStatus, TransactionType, VoteChoice};
use crate::status::ProposalStatus;

/// A wallet known to the system, created lazily on first reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub wallet_address: String,
    pub created_at: DateTime<Utc>,
}

/// A collective fund backed by a (simulated) multisig wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub multisig_address: String,
    /// Set at creation, never changes
    pub creator_id: String,
    pub visibility: PoolVisibility,
    pub join_code: Option<String>,
    pub required_signatures: u32,
    pub created_at: DateTime<Utc>,
}

impl Pool {
    /// Whether `code` grants entry to this pool
    pub fn accepts_join_code(&self, code: Option<&str>) -> bool {
        match self.visibility {
            PoolVisibility::Public => true,
            PoolVisibility::Private => match (self.join_code.as_deref(), code) {
                (Some(expected), Some(given)) => expected == given,
                _ => false,
            },
        }
    }
}

/// Pool with the counters shown in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSummary {
    #[serde(flatten)]
    pub pool: Pool,
    /// Active members only
    pub member_count: u64,
    /// Proposals still in `PENDING`
    pub pending_swaps: u64,
}

/// Membership row; soft-deleted on leave
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMember {
    pub id: String,
    pub pool_id: String,
    pub user_id: String,
    pub wallet_address: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Balance of one token held by a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolToken {
    pub id: String,
    pub pool_id: String,
    /// Unique per pool
    pub symbol: String,
    pub address: Option<String>,
    pub decimals: u8,
    pub balance: String,
    pub updated_at: DateTime<Utc>,
}

/// A proposed trade awaiting or having received a pool vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapProposal {
    pub id: String,
    pub pool_id: String,
    pub proposer_id: String,
    pub proposer_address: String,
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
    pub min_received: String,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    /// Non-owning link to the execution record
    pub transaction_id: Option<String>,
    pub error_message: Option<String>,
}

/// One member's latest position on a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    pub proposal_id: String,
    pub user_id: String,
    pub voter_address: String,
    pub vote: VoteChoice,
    pub created_at: DateTime<Utc>,
}

/// Pool-level ledger event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub pool_id: String,
    pub proposal_id: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub amount: Option<String>,
    pub tx_hash: Option<String>,
    pub gas_used: Option<String>,
    pub gas_price: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

/// Proposal as listed for a pool: with its votes and execution record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDetails {
    #[serde(flatten)]
    pub proposal: SwapProposal,
    pub votes: Vec<Vote>,
    pub transaction: Option<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(visibility: PoolVisibility, join_code: Option<&str>) -> Pool {
        Pool {
            id: "pool-1".into(),
            name: "Friends".into(),
            description: None,
            multisig_address: "0xmultisig".into(),
            creator_id: "user-1".into(),
            visibility,
            join_code: join_code.map(str::to_string),
            required_signatures: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn public_pool_ignores_join_code() {
        let p = pool(PoolVisibility::Public, None);
        assert!(p.accepts_join_code(None));
        assert!(p.accepts_join_code(Some("anything")));
    }

    #[test]
    fn private_pool_requires_matching_code() {
        let p = pool(PoolVisibility::Private, Some("s3cret"));
        assert!(p.accepts_join_code(Some("s3cret")));
        assert!(!p.accepts_join_code(Some("guess")));
        assert!(!p.accepts_join_code(None));
    }

    #[test]
    fn private_pool_without_code_rejects_everyone() {
        let p = pool(PoolVisibility::Private, None);
        assert!(!p.accepts_join_code(Some("")));
    }

    #[test]
    fn transaction_type_serializes_as_type() {
        let tx = Transaction {
            id: "tx".into(),
            pool_id: "pool".into(),
            proposal_id: None,
            tx_type: TransactionType::Withdrawal,
            status: TransactionStatus::Success,
            from_token: None,
            to_token: None,
            amount: None,
            tx_hash: None,
            gas_used: None,
            gas_price: None,
            error_message: None,
            created_at: Utc::now(),
            executed_at: None,
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "WITHDRAWAL");
        assert_eq!(json["poolId"], "pool");
    }
}
