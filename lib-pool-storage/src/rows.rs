//! Raw rows and their conversion into domain entities

use chrono::{DateTime, Utc};
use lib_pool_types::{
    Pool, PoolMember, PoolSummary, PoolToken, SwapProposal, Transaction, User, Vote,
};
use sqlx::FromRow;

use crate::errors::{StorageError, StorageResult};

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn timestamp(table: &'static str, millis: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StorageError::corrupt(table, format!("timestamp out of range: {millis}")))
}

fn opt_timestamp(table: &'static str, millis: Option<i64>) -> StorageResult<Option<DateTime<Utc>>> {
    millis.map(|m| timestamp(table, m)).transpose()
}

fn parse<T>(table: &'static str, text: &str) -> StorageResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.parse::<T>().map_err(|e| StorageError::corrupt(table, e))
}

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub wallet_address: String,
    pub created_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> StorageResult<Self> {
        Ok(User {
            id: row.id,
            wallet_address: row.wallet_address,
            created_at: timestamp("users", row.created_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PoolRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub multisig_address: String,
    pub creator_id: String,
    pub visibility: String,
    pub join_code: Option<String>,
    pub required_signatures: i64,
    pub created_at: i64,
}

impl TryFrom<PoolRow> for Pool {
    type Error = StorageError;

    fn try_from(row: PoolRow) -> StorageResult<Self> {
        Ok(Pool {
            id: row.id,
            name: row.name,
            description: row.description,
            multisig_address: row.multisig_address,
            creator_id: row.creator_id,
            visibility: parse("pools", &row.visibility)?,
            join_code: row.join_code,
            required_signatures: u32::try_from(row.required_signatures)
                .map_err(|e| StorageError::corrupt("pools", e))?,
            created_at: timestamp("pools", row.created_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PoolSummaryRow {
    #[sqlx(flatten)]
    pub pool: PoolRow,
    pub member_count: i64,
    pub pending_swaps: i64,
}

impl TryFrom<PoolSummaryRow> for PoolSummary {
    type Error = StorageError;

    fn try_from(row: PoolSummaryRow) -> StorageResult<Self> {
        Ok(PoolSummary {
            pool: row.pool.try_into()?,
            member_count: row.member_count.max(0) as u64,
            pending_swaps: row.pending_swaps.max(0) as u64,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct MemberRow {
    pub id: String,
    pub pool_id: String,
    pub user_id: String,
    pub wallet_address: String,
    pub role: String,
    pub joined_at: i64,
    pub is_active: bool,
}

impl TryFrom<MemberRow> for PoolMember {
    type Error = StorageError;

    fn try_from(row: MemberRow) -> StorageResult<Self> {
        Ok(PoolMember {
            id: row.id,
            pool_id: row.pool_id,
            user_id: row.user_id,
            wallet_address: row.wallet_address,
            role: parse("pool_members", &row.role)?,
            joined_at: timestamp("pool_members", row.joined_at)?,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TokenRow {
    pub id: String,
    pub pool_id: String,
    pub symbol: String,
    pub address: Option<String>,
    pub decimals: i64,
    pub balance: String,
    pub updated_at: i64,
}

impl TryFrom<TokenRow> for PoolToken {
    type Error = StorageError;

    fn try_from(row: TokenRow) -> StorageResult<Self> {
        Ok(PoolToken {
            id: row.id,
            pool_id: row.pool_id,
            symbol: row.symbol,
            address: row.address,
            decimals: u8::try_from(row.decimals).map_err(|e| StorageError::corrupt("pool_tokens", e))?,
            balance: row.balance,
            updated_at: timestamp("pool_tokens", row.updated_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ProposalRow {
    pub id: String,
    pub pool_id: String,
    pub proposer_id: String,
    pub proposer_address: String,
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
    pub min_received: String,
    pub status: String,
    pub created_at: i64,
    pub executed_at: Option<i64>,
    pub transaction_id: Option<String>,
    pub error_message: Option<String>,
}

impl TryFrom<ProposalRow> for SwapProposal {
    type Error = StorageError;

    fn try_from(row: ProposalRow) -> StorageResult<Self> {
        Ok(SwapProposal {
            id: row.id,
            pool_id: row.pool_id,
            proposer_id: row.proposer_id,
            proposer_address: row.proposer_address,
            from_token: row.from_token,
            to_token: row.to_token,
            amount: row.amount,
            min_received: row.min_received,
            status: parse("swap_proposals", &row.status)?,
            created_at: timestamp("swap_proposals", row.created_at)?,
            executed_at: opt_timestamp("swap_proposals", row.executed_at)?,
            transaction_id: row.transaction_id,
            error_message: row.error_message,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct VoteRow {
    pub id: String,
    pub proposal_id: String,
    pub user_id: String,
    pub voter_address: String,
    pub vote: String,
    pub created_at: i64,
}

impl TryFrom<VoteRow> for Vote {
    type Error = StorageError;

    fn try_from(row: VoteRow) -> StorageResult<Self> {
        Ok(Vote {
            id: row.id,
            proposal_id: row.proposal_id,
            user_id: row.user_id,
            voter_address: row.voter_address,
            vote: parse("votes", &row.vote)?,
            created_at: timestamp("votes", row.created_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TransactionRow {
    pub id: String,
    pub pool_id: String,
    pub proposal_id: Option<String>,
    #[sqlx(rename = "type")]
    pub tx_type: String,
    pub status: String,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub amount: Option<String>,
    pub tx_hash: Option<String>,
    pub gas_used: Option<String>,
    pub gas_price: Option<String>,
    pub error_message: Option<String>,
    pub created_at: i64,
    pub executed_at: Option<i64>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StorageError;

    fn try_from(row: TransactionRow) -> StorageResult<Self> {
        Ok(Transaction {
            id: row.id,
            pool_id: row.pool_id,
            proposal_id: row.proposal_id,
            tx_type: parse("transactions", &row.tx_type)?,
            status: parse("transactions", &row.status)?,
            from_token: row.from_token,
            to_token: row.to_token,
            amount: row.amount,
            tx_hash: row.tx_hash,
            gas_used: row.gas_used,
            gas_price: row.gas_price,
            error_message: row.error_message,
            created_at: timestamp("transactions", row.created_at)?,
            executed_at: opt_timestamp("transactions", row.executed_at)?,
        })
    }
}

/// Convert a batch of rows, failing on the first corrupt one
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> StorageResult<Vec<T>>
where
    T: TryFrom<R, Error = StorageError>,
{
    rows.into_iter().map(T::try_from).collect()
}
