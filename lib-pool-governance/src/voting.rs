//! Casting votes and applying the tally

use lib_pool_types::{ProposalStatus, Vote, VoteChoice};
use serde::Serialize;
use tracing::info;

use crate::errors::{require, PoolError, PoolResult};
use crate::service::SwapPoolService;
use crate::tally::VoteTally;

/// Recorded ballot and the proposal status after recomputation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub vote: Vote,
    pub proposal_status: ProposalStatus,
}

impl SwapPoolService {
    /// Record or replace a ballot, then recompute the proposal's status
    ///
    /// Ballots on decided proposals are stored but never change the outcome.
    /// Membership of the voter is not checked.
    pub async fn cast_vote(
        &self,
        proposal_id: &str,
        user_address: &str,
        choice: VoteChoice,
    ) -> PoolResult<VoteReceipt> {
        require("userAddress", user_address)?;

        // The writer lock spans the whole read-tally-write sequence
        let mut tx = self.store.begin().await?;
        let proposal = tx
            .find_proposal(proposal_id)
            .await?
            .ok_or_else(|| PoolError::not_found(format!("Proposal {proposal_id}")))?;

        let user = tx.find_or_create_user(user_address).await?;
        let vote = tx.upsert_vote(proposal_id, &user.id, choice).await?;

        let votes = tx.list_votes(proposal_id).await?;
        let active = tx.count_active_members(&proposal.pool_id).await?;
        let tally = VoteTally::from_votes(&votes, active);

        let mut status = proposal.status;
        if let Some(next) = tally.next_status(proposal.status) {
            status = proposal.status.transition_to(next)?;
            let moved = tx
                .update_proposal_status(proposal_id, proposal.status, status, None)
                .await?;
            if !moved {
                return Err(PoolError::Conflict(
                    "proposal status changed concurrently".to_string(),
                ));
            }
            info!(
                "Proposal {} {} ({} for, {} against, {} abstain of {} members)",
                proposal_id, status, tally.for_votes, tally.against_votes, tally.abstain_votes, active
            );
        }
        tx.commit().await?;

        info!("{} voted {} on proposal {}", user_address, choice, proposal_id);
        Ok(VoteReceipt {
            vote,
            proposal_status: status,
        })
    }
}
