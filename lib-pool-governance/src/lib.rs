//! Social Swap Pool governance
//!
//! Groups of wallets pool funds behind a (simulated) multisig address and vote
//! on token swaps. This crate owns the rules:
//!
//! - membership: who may join, leave or delete a pool, and the cascade when
//!   the last member leaves
//! - proposals and voting: a proposal is decided once half the active members
//!   (rounded up) have voted, by strict majority of FOR over AGAINST
//! - execution: an approved proposal is prepared through a [`lib_dex::DexClient`]
//!   exactly once, recorded, and settled in the background
//!
//! Everything is reached through [`SwapPoolService`].

pub mod errors;
pub mod execution;
pub mod lifecycle;
pub mod locks;
pub mod membership;
pub mod proposals;
pub mod quotes;
pub mod service;
pub mod settlement;
pub mod tally;
pub mod tokens;
pub mod voting;

pub use errors::{ErrorKind, PoolError, PoolResult};
pub use execution::ExecutionReceipt;
pub use lifecycle::CreatePoolRequest;
pub use membership::MemberRemoval;
pub use proposals::CreateProposalRequest;
pub use quotes::{QuoteSwapRequest, DEFAULT_QUOTE_SLIPPAGE};
pub use service::{ExecutionSettings, SwapPoolService};
pub use settlement::{Confirmation, SettlementConfirmer, SettlementHandle, SimulatedSettlement};
pub use tally::VoteTally;
pub use tokens::UpsertTokenRequest;
pub use voting::VoteReceipt;
