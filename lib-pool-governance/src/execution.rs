//! Swap execution
//!
//! An approved proposal is executed in three steps:
//!
//! 1. check the proposal inside a read unit,
//! 2. ask the DEX to prepare the swap, outside any storage transaction but
//!    under a per-proposal lock and a timeout,
//! 3. record the outcome in one write unit whose proposal update only applies
//!    while the proposal is still `APPROVED` and unlinked.
//!
//! A successful preparation leaves a `PENDING` swap transaction that a
//! background task settles later.

use lib_dex::{execution_address, DexError, SwapRequest, TxDescriptor};
use lib_pool_storage::{NewTransaction, StorageError, StoreTx};
use lib_pool_types::{ProposalStatus, SwapProposal, Transaction, TransactionStatus, TransactionType};
use tracing::{info, warn};

use crate::errors::{require, PoolError, PoolResult};
use crate::service::SwapPoolService;
use crate::settlement::{spawn_settlement, SettlementHandle};

/// Result of a successful execution
#[derive(Debug)]
pub struct ExecutionReceipt {
    /// The `PENDING` swap transaction as recorded
    pub transaction: Transaction,
    /// Transaction prepared by the DEX
    pub descriptor: TxDescriptor,
    /// Background settlement of `transaction`
    pub settlement: SettlementHandle,
}

impl SwapPoolService {
    /// Execute an approved proposal through the DEX
    ///
    /// A proposal that already has a linked transaction reports `Conflict`,
    /// whatever its status.
    pub async fn execute_proposal(
        &self,
        proposal_id: &str,
        executor_address: &str,
    ) -> PoolResult<ExecutionReceipt> {
        require("executorAddress", executor_address)?;

        let _guard = self.proposal_locks.lock(proposal_id).await;

        let (proposal, request) = self.prepare_execution(proposal_id).await?;

        info!(
            "Executing proposal {} for {}: {} {} -> {}",
            proposal_id, executor_address, proposal.amount, proposal.from_token, proposal.to_token
        );

        let prepared = tokio::time::timeout(
            self.execution.dex_timeout,
            self.dex.prepare_swap_transaction(&request),
        )
        .await
        .unwrap_or_else(|_| {
            Err(DexError::ExecutionUnavailable(format!(
                "swap preparation timed out after {:?}",
                self.execution.dex_timeout
            )))
        });

        match prepared {
            Ok(descriptor) => self.record_success(&proposal, descriptor).await,
            Err(e) => Err(self.record_failure(&proposal, e.to_string()).await),
        }
    }

    async fn prepare_execution(&self, proposal_id: &str) -> PoolResult<(SwapProposal, SwapRequest)> {
        let mut tx = self.store.read().await?;
        let proposal = tx
            .find_proposal(proposal_id)
            .await?
            .ok_or_else(|| PoolError::not_found(format!("Proposal {proposal_id}")))?;

        if proposal.transaction_id.is_some() {
            return Err(PoolError::Conflict("proposal already executed".to_string()));
        }
        if proposal.status != ProposalStatus::Approved {
            return Err(PoolError::InvalidState(format!(
                "proposal must be approved before execution (status {})",
                proposal.status
            )));
        }

        let pool = tx
            .find_pool(&proposal.pool_id)
            .await?
            .ok_or_else(|| PoolError::not_found(format!("Pool {}", proposal.pool_id)))?;

        let request = SwapRequest {
            from_token_address: execution_address(&proposal.from_token).to_string(),
            to_token_address: execution_address(&proposal.to_token).to_string(),
            amount: proposal.amount.clone(),
            recipient_address: pool.multisig_address,
            slippage: self.execution.slippage.clone(),
            chain_id: self.execution.chain_id.clone(),
        };
        Ok((proposal, request))
    }

    async fn record_success(
        &self,
        proposal: &SwapProposal,
        descriptor: TxDescriptor,
    ) -> PoolResult<ExecutionReceipt> {
        let mut tx = self.store.begin().await?;
        let transaction = insert_swap(&mut tx, proposal, TransactionStatus::Pending, None).await?;
        close_proposal(&mut tx, proposal, &transaction, ProposalStatus::Executed, None).await?;
        tx.commit().await?;

        info!(
            "Proposal {} executed; swap transaction {} pending settlement",
            proposal.id, transaction.id
        );

        let settlement = spawn_settlement(self.store.clone(), self.settlement.clone(), transaction.clone());
        Ok(ExecutionReceipt {
            transaction,
            descriptor,
            settlement,
        })
    }

    /// Persist the failed attempt and build the error returned to the caller
    async fn record_failure(&self, proposal: &SwapProposal, reason: String) -> PoolError {
        warn!("Swap preparation for proposal {} failed: {}", proposal.id, reason);

        let persisted = self.persist_failure(proposal, &reason).await;

        match persisted {
            Ok(transaction) => PoolError::SwapFailed {
                transaction: Box::new(transaction),
                reason,
            },
            Err(e) => e,
        }
    }

    async fn persist_failure(&self, proposal: &SwapProposal, reason: &str) -> PoolResult<Transaction> {
        let mut tx = self.store.begin().await?;
        let transaction = insert_swap(&mut tx, proposal, TransactionStatus::Failed, Some(reason)).await?;
        close_proposal(&mut tx, proposal, &transaction, ProposalStatus::Failed, Some(reason)).await?;
        tx.commit().await?;
        Ok(transaction)
    }
}

async fn insert_swap(
    tx: &mut StoreTx,
    proposal: &SwapProposal,
    status: TransactionStatus,
    error_message: Option<&str>,
) -> PoolResult<Transaction> {
    let entry = NewTransaction {
        pool_id: proposal.pool_id.clone(),
        proposal_id: Some(proposal.id.clone()),
        tx_type: TransactionType::Swap,
        status,
        from_token: Some(proposal.from_token.clone()),
        to_token: Some(proposal.to_token.clone()),
        amount: Some(proposal.amount.clone()),
        error_message: error_message.map(str::to_string),
    };

    match tx.insert_transaction(&entry).await {
        Ok(transaction) => Ok(transaction),
        Err(StorageError::UniqueViolation(_)) => {
            Err(PoolError::Conflict("proposal already executed".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn close_proposal(
    tx: &mut StoreTx,
    proposal: &SwapProposal,
    transaction: &Transaction,
    outcome: ProposalStatus,
    error_message: Option<&str>,
) -> PoolResult<()> {
    ProposalStatus::Approved.transition_to(outcome)?;

    let applied = tx
        .record_execution(&proposal.id, &transaction.id, outcome, error_message)
        .await?;
    if !applied {
        return Err(PoolError::Conflict("proposal already executed".to_string()));
    }
    Ok(())
}
