//! Pool token balances and the pool ledger

use lib_pool_storage::NewToken;
use lib_pool_types::{PoolToken, Transaction};
use serde::Deserialize;
use tracing::debug;

use crate::errors::{require, PoolError, PoolResult};
use crate::service::SwapPoolService;

/// Token balance to record for a pool
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertTokenRequest {
    pub symbol: String,
    #[serde(default)]
    pub address: Option<String>,
    pub decimals: u8,
    pub balance: String,
}

impl SwapPoolService {
    /// Insert a token balance or overwrite the one with the same symbol
    pub async fn upsert_pool_token(
        &self,
        pool_id: &str,
        request: UpsertTokenRequest,
    ) -> PoolResult<PoolToken> {
        require("symbol", &request.symbol)?;
        require("balance", &request.balance)?;

        let mut tx = self.store.begin().await?;
        if tx.find_pool(pool_id).await?.is_none() {
            return Err(PoolError::not_found(format!("Pool {pool_id}")));
        }

        let token = tx
            .upsert_token(&NewToken {
                pool_id: pool_id.to_string(),
                symbol: request.symbol,
                address: request.address,
                decimals: request.decimals,
                balance: request.balance,
            })
            .await?;
        tx.commit().await?;

        debug!("Pool {} balance of {} set to {}", pool_id, token.symbol, token.balance);
        Ok(token)
    }

    /// Token balances, most recently updated first
    pub async fn list_pool_tokens(&self, pool_id: &str) -> PoolResult<Vec<PoolToken>> {
        let mut tx = self.store.read().await?;
        if tx.find_pool(pool_id).await?.is_none() {
            return Err(PoolError::not_found(format!("Pool {pool_id}")));
        }
        Ok(tx.list_tokens(pool_id).await?)
    }

    /// Pool ledger, newest first
    pub async fn list_pool_transactions(&self, pool_id: &str) -> PoolResult<Vec<Transaction>> {
        let mut tx = self.store.read().await?;
        if tx.find_pool(pool_id).await?.is_none() {
            return Err(PoolError::not_found(format!("Pool {pool_id}")));
        }
        Ok(tx.list_transactions(pool_id).await?)
    }
}
