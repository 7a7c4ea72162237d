//! Vote tally
//!
//! A proposal is decided once at least half of the active members (rounded
//! up) have voted. A strict majority of FOR over AGAINST approves it, the
//! reverse rejects it, and a tie leaves it pending. Abstentions count toward
//! quorum only.

use lib_pool_types::{ProposalStatus, Vote, VoteChoice};

/// Ballot counts for one proposal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub for_votes: u64,
    pub against_votes: u64,
    pub abstain_votes: u64,
    pub active_members: u64,
}

impl VoteTally {
    /// Count the latest ballot of each voter
    pub fn from_votes(votes: &[Vote], active_members: u64) -> Self {
        votes.iter().fold(
            Self {
                active_members,
                ..Self::default()
            },
            |mut tally, vote| {
                match vote.vote {
                    VoteChoice::For => tally.for_votes += 1,
                    VoteChoice::Against => tally.against_votes += 1,
                    VoteChoice::Abstain => tally.abstain_votes += 1,
                }
                tally
            },
        )
    }

    /// `ceil(active_members / 2)`
    pub fn required_votes(&self) -> u64 {
        self.active_members.div_ceil(2)
    }

    pub fn total_cast(&self) -> u64 {
        self.for_votes + self.against_votes + self.abstain_votes
    }

    pub fn quorum_reached(&self) -> bool {
        self.total_cast() >= self.required_votes()
    }

    /// Decision implied by the counts, if any
    pub fn decision(&self) -> Option<ProposalStatus> {
        if !self.quorum_reached() {
            return None;
        }
        match self.for_votes.cmp(&self.against_votes) {
            std::cmp::Ordering::Greater => Some(ProposalStatus::Approved),
            std::cmp::Ordering::Less => Some(ProposalStatus::Rejected),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// New status for a proposal currently in `current`
    ///
    /// Only `PENDING` proposals move; anything already decided is left alone.
    pub fn next_status(&self, current: ProposalStatus) -> Option<ProposalStatus> {
        if current.is_decided() {
            return None;
        }
        self.decision()
    }
}
