//! Settlement confirmation
//!
//! After a swap transaction is recorded as `PENDING`, a background task asks
//! a [`SettlementConfirmer`] for the on-chain outcome and writes it back. The
//! write only lands while the transaction is still `PENDING`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use lib_pool_storage::{SettlementUpdate, SqliteStore};
use lib_pool_types::{Transaction, TransactionStatus};
use rand::RngCore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Confirmed on-chain figures for a settled swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: String,
    pub gas_used: String,
    pub gas_price: String,
}

/// Source of settlement outcomes
#[async_trait]
pub trait SettlementConfirmer: Send + Sync {
    /// Wait for the transaction to settle; an error marks it `FAILED`
    async fn confirm(&self, transaction: &Transaction) -> Result<Confirmation>;
}

/// Reports success after a fixed delay with a random hash
#[derive(Debug, Clone)]
pub struct SimulatedSettlement {
    delay: Duration,
}

impl SimulatedSettlement {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedSettlement {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

#[async_trait]
impl SettlementConfirmer for SimulatedSettlement {
    async fn confirm(&self, _transaction: &Transaction) -> Result<Confirmation> {
        tokio::time::sleep(self.delay).await;

        let mut hash = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut hash);

        Ok(Confirmation {
            tx_hash: format!("0x{}", hex::encode(hash)),
            gas_used: "21000".to_string(),
            gas_price: "20".to_string(),
        })
    }
}

/// Background settlement of one transaction
///
/// Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct SettlementHandle {
    task: JoinHandle<Option<Transaction>>,
}

impl SettlementHandle {
    /// Wait for the settlement write; `None` if nothing was updated
    pub async fn wait(self) -> Option<Transaction> {
        match self.task.await {
            Ok(settled) => settled,
            Err(e) => {
                error!("Settlement task aborted: {}", e);
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn settlement for a `PENDING` transaction
pub(crate) fn spawn_settlement(
    store: SqliteStore,
    confirmer: Arc<dyn SettlementConfirmer>,
    transaction: Transaction,
) -> SettlementHandle {
    let task = tokio::spawn(async move { settle(&store, confirmer.as_ref(), &transaction).await });
    SettlementHandle { task }
}

async fn settle(
    store: &SqliteStore,
    confirmer: &dyn SettlementConfirmer,
    transaction: &Transaction,
) -> Option<Transaction> {
    let update = match confirmer.confirm(transaction).await {
        Ok(confirmation) => SettlementUpdate {
            status: TransactionStatus::Success,
            tx_hash: Some(confirmation.tx_hash),
            gas_used: Some(confirmation.gas_used),
            gas_price: Some(confirmation.gas_price),
            error_message: None,
        },
        Err(e) => {
            warn!("Settlement of transaction {} failed: {}", transaction.id, e);
            SettlementUpdate {
                status: TransactionStatus::Failed,
                tx_hash: None,
                gas_used: None,
                gas_price: None,
                error_message: Some(e.to_string()),
            }
        }
    };

    match write_settlement(store, &transaction.id, &update).await {
        Ok(Some(settled)) => {
            info!("Transaction {} settled as {}", settled.id, settled.status);
            Some(settled)
        }
        Ok(None) => {
            info!(
                "Transaction {} no longer pending; settlement ignored",
                transaction.id
            );
            None
        }
        Err(e) => {
            error!("Failed to record settlement of {}: {}", transaction.id, e);
            None
        }
    }
}

async fn write_settlement(
    store: &SqliteStore,
    transaction_id: &str,
    update: &SettlementUpdate,
) -> lib_pool_storage::StorageResult<Option<Transaction>> {
    let mut tx = store.begin().await?;
    let settled = tx.settle_transaction(transaction_id, update).await?;
    tx.commit().await?;
    Ok(settled)
}

#[cfg(test)]
mod tests {
    use lib_pool_storage::{NewPool, NewTransaction};
    use lib_pool_types::{PoolVisibility, TransactionType};

    use super::*;

    struct Rejecting;

    #[async_trait]
    impl SettlementConfirmer for Rejecting {
        async fn confirm(&self, _transaction: &Transaction) -> Result<Confirmation> {
            anyhow::bail!("reverted")
        }
    }

    async fn pending_swap() -> (SqliteStore, Transaction) {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        let user = tx.find_or_create_user("0xcreator").await.unwrap();
        let pool = tx
            .insert_pool(&NewPool {
                name: "Pool".into(),
                description: None,
                multisig_address: "0xmultisig".into(),
                creator_id: user.id,
                visibility: PoolVisibility::Public,
                join_code: None,
                required_signatures: 1,
            })
            .await
            .unwrap();
        let pending = tx
            .insert_transaction(&NewTransaction {
                status: TransactionStatus::Pending,
                from_token: Some("ETH".into()),
                to_token: Some("USDT".into()),
                amount: Some("1".into()),
                ..NewTransaction::event(&pool.id, TransactionType::Swap)
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (store, pending)
    }

    #[tokio::test]
    async fn simulated_settlement_marks_success_once() {
        let (store, pending) = pending_swap().await;
        let confirmer = SimulatedSettlement::new(Duration::ZERO);

        let settled = settle(&store, &confirmer, &pending).await.unwrap();
        assert_eq!(settled.status, TransactionStatus::Success);
        assert_eq!(settled.gas_used.as_deref(), Some("21000"));
        assert_eq!(settled.gas_price.as_deref(), Some("20"));
        let hash = settled.tx_hash.unwrap();
        assert!(hash.starts_with("0x"));
        assert_eq!(hash.len(), 66);

        assert!(settle(&store, &confirmer, &pending).await.is_none());
    }

    #[tokio::test]
    async fn rejected_settlement_marks_failure() {
        let (store, pending) = pending_swap().await;

        let handle = spawn_settlement(store.clone(), Arc::new(Rejecting), pending);
        let settled = handle.wait().await.unwrap();

        assert_eq!(settled.status, TransactionStatus::Failed);
        assert_eq!(settled.error_message.as_deref(), Some("reverted"));
        assert!(settled.tx_hash.is_none());
    }

    #[tokio::test]
    async fn missing_transaction_is_ignored() {
        let (store, mut pending) = pending_swap().await;
        pending.id = "does-not-exist".into();

        let confirmer = SimulatedSettlement::new(Duration::ZERO);
        assert!(settle(&store, &confirmer, &pending).await.is_none());
    }
}
