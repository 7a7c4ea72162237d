//! Social Swap Pool storage
//!
//! Relational persistence for users, pools, memberships, tokens, proposals,
//! votes and the pool ledger, on SQLite via sqlx.
//!
//! # Transactions
//!
//! Every operation runs inside a [`StoreTx`]. Write units are opened with
//! [`SqliteStore::begin`], which also takes the store's writer lock so that
//! concurrent units never interleave their read-then-write sequences. Read-only
//! units use [`SqliteStore::read`]. Dropping a `StoreTx` without calling
//! [`StoreTx::commit`] rolls every statement back.
//!
//! ```rust,ignore
//! let store = SqliteStore::open_in_memory().await?;
//! let mut tx = store.begin().await?;
//! let user = tx.find_or_create_user("0xabc").await?;
//! tx.commit().await?;
//! ```

pub mod errors;
pub mod records;
mod rows;
mod schema;
pub mod store;
mod pool_queries;
mod proposal_queries;

pub use errors::{StorageError, StorageResult};
pub use records::{NewPool, NewProposal, NewToken, NewTransaction, SettlementUpdate};
pub use store::{SqliteStore, StoreTx};
