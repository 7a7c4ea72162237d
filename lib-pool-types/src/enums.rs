//! String-backed enums persisted as upper-case text columns.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unknown textual value for one of the pool enums
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares `as_str`, `Display` and `FromStr` for an enum whose stored form
/// matches its serde form.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Stored/serialized representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::enums::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::enums::ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use text_enum;

/// Who can see and join a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolVisibility {
    #[default]
    Public,
    /// Joining requires the pool's join code
    Private,
}

text_enum!(PoolVisibility, "visibility", {
    Public => "PUBLIC",
    Private => "PRIVATE",
});

/// Role of a member inside a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Creator,
    Member,
}

text_enum!(MemberRole, "member role", {
    Creator => "CREATOR",
    Member => "MEMBER",
});

/// A member's position on a swap proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteChoice {
    For,
    Against,
    Abstain,
}

text_enum!(VoteChoice, "vote", {
    For => "FOR",
    Against => "AGAINST",
    Abstain => "ABSTAIN",
});

/// Kind of pool-level ledger event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    PoolCreation,
    Withdrawal,
    Swap,
}

text_enum!(TransactionType, "transaction type", {
    PoolCreation => "POOL_CREATION",
    Withdrawal => "WITHDRAWAL",
    Swap => "SWAP",
});

/// Settlement state of a ledger event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

text_enum!(TransactionStatus, "transaction status", {
    Pending => "PENDING",
    Success => "SUCCESS",
    Failed => "FAILED",
});

impl TransactionStatus {
    /// `SUCCESS` and `FAILED` are never updated again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}
