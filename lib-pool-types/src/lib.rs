//! Social Swap Pool primitives.
//!
//! Entities shared by the storage layer, the governance engine and the node
//! API. Behaviour lives elsewhere; the only logic here is the proposal status
//! machine, which every layer must agree on.

pub mod enums;
pub mod entities;
pub mod status;

pub use enums::{
    MemberRole, ParseEnumError, PoolVisibility, TransactionStatus, TransactionType, VoteChoice,
};
pub use entities::{
    PoolMember, PoolSummary, PoolToken, Pool, ProposalDetails, SwapProposal, Transaction, User,
    Vote,
};
pub use status::{InvalidTransition, ProposalStatus};
