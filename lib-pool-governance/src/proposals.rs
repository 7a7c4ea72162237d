//! Swap proposals

use lib_pool_storage::{NewProposal, StoreTx};
use lib_pool_types::{ProposalDetails, SwapProposal};
use serde::Deserialize;
use tracing::info;

use crate::errors::{require, PoolError, PoolResult};
use crate::service::SwapPoolService;

/// Parameters for a new swap proposal
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalRequest {
    pub proposer_address: String,
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
    pub min_received: String,
}

impl CreateProposalRequest {
    fn validate(&self) -> PoolResult<()> {
        require("proposerAddress", &self.proposer_address)?;
        require("fromToken", &self.from_token)?;
        require("toToken", &self.to_token)?;
        require("amount", &self.amount)?;
        require("minReceived", &self.min_received)
    }
}

impl SwapPoolService {
    /// Open a proposal in `PENDING`
    ///
    /// The proposer does not have to be a member of the pool.
    pub async fn create_proposal(
        &self,
        pool_id: &str,
        request: CreateProposalRequest,
    ) -> PoolResult<SwapProposal> {
        request.validate()?;

        let mut tx = self.store.begin().await?;
        if tx.find_pool(pool_id).await?.is_none() {
            return Err(PoolError::not_found(format!("Pool {pool_id}")));
        }

        let proposer = tx.find_or_create_user(&request.proposer_address).await?;
        let proposal = tx
            .insert_proposal(&NewProposal {
                pool_id: pool_id.to_string(),
                proposer_id: proposer.id,
                from_token: request.from_token,
                to_token: request.to_token,
                amount: request.amount,
                min_received: request.min_received,
            })
            .await?;
        tx.commit().await?;

        info!(
            "Proposal {} in pool {}: {} {} -> {}",
            proposal.id, pool_id, proposal.amount, proposal.from_token, proposal.to_token
        );
        Ok(proposal)
    }

    /// Proposals of a pool, newest first, each with its votes and transaction
    pub async fn list_proposals(&self, pool_id: &str) -> PoolResult<Vec<ProposalDetails>> {
        let mut tx = self.store.read().await?;
        if tx.find_pool(pool_id).await?.is_none() {
            return Err(PoolError::not_found(format!("Pool {pool_id}")));
        }

        let proposals = tx.list_proposals(pool_id).await?;
        let mut details = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            details.push(load_details(&mut tx, proposal).await?);
        }
        Ok(details)
    }

    /// One proposal with its votes and transaction
    pub async fn get_proposal(&self, proposal_id: &str) -> PoolResult<ProposalDetails> {
        let mut tx = self.store.read().await?;
        let proposal = tx
            .find_proposal(proposal_id)
            .await?
            .ok_or_else(|| PoolError::not_found(format!("Proposal {proposal_id}")))?;
        load_details(&mut tx, proposal).await
    }
}

pub(crate) async fn load_details(tx: &mut StoreTx, proposal: SwapProposal) -> PoolResult<ProposalDetails> {
    let votes = tx.list_votes(&proposal.id).await?;
    let transaction = match proposal.transaction_id.as_deref() {
        Some(id) => tx.find_transaction(id).await?,
        None => None,
    };
    Ok(ProposalDetails {
        proposal,
        votes,
        transaction,
    })
}
