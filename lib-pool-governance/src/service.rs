//! Service facade
//!
//! [`SwapPoolService`] owns the injected collaborators. The operations
//! themselves are grouped by concern in `lifecycle`, `membership`,
//! `proposals`, `voting`, `execution`, `tokens` and `quotes`.

use std::sync::Arc;
use std::time::Duration;

use lib_dex::{DexClient, TokenCatalog};
use lib_pool_storage::SqliteStore;
use tracing::info;

use crate::locks::KeyedLocks;
use crate::settlement::SettlementConfirmer;

/// Fixed parameters of swap execution
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSettings {
    /// Slippage tolerance in percent, passed through to the aggregator
    pub slippage: String,
    /// Target chain for prepared swaps
    pub chain_id: String,
    /// Upper bound on one swap preparation call
    pub dex_timeout: Duration,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            slippage: "1".to_string(),
            chain_id: "195".to_string(),
            dex_timeout: Duration::from_secs(15),
        }
    }
}

/// Pool governance operations over a store, a DEX and a settlement strategy
pub struct SwapPoolService {
    pub(crate) store: SqliteStore,
    pub(crate) dex: Arc<dyn DexClient>,
    pub(crate) catalog: Arc<dyn TokenCatalog>,
    pub(crate) settlement: Arc<dyn SettlementConfirmer>,
    pub(crate) execution: ExecutionSettings,
    pub(crate) proposal_locks: KeyedLocks,
}

impl SwapPoolService {
    pub fn new(
        store: SqliteStore,
        dex: Arc<dyn DexClient>,
        catalog: Arc<dyn TokenCatalog>,
        settlement: Arc<dyn SettlementConfirmer>,
        execution: ExecutionSettings,
    ) -> Self {
        info!(
            "Swap pool service initialized (chain {}, slippage {}%)",
            execution.chain_id, execution.slippage
        );
        Self {
            store,
            dex,
            catalog,
            settlement,
            execution,
            proposal_locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn execution_settings(&self) -> &ExecutionSettings {
        &self.execution
    }
}
