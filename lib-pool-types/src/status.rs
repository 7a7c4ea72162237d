//! Swap proposal status machine
//!
//! ```text
//! PENDING ──► APPROVED ──► EXECUTED
//!    │            └──────► FAILED
//!    └──────► REJECTED
//! ```
//!
//! Nothing ever returns to `PENDING`. `REJECTED`, `EXECUTED` and `FAILED` are
//! terminal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::text_enum;

/// Swap proposal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    /// Accepting votes, quorum or majority not reached yet
    Pending,
    /// Majority in favour, waiting for execution
    Approved,
    /// Majority against
    Rejected,
    /// Swap prepared and recorded
    Executed,
    /// Swap preparation failed
    Failed,
}

text_enum!(ProposalStatus, "proposal status", {
    Pending => "PENDING",
    Approved => "APPROVED",
    Rejected => "REJECTED",
    Executed => "EXECUTED",
    Failed => "FAILED",
});

/// Attempted edge outside the status machine
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid proposal transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ProposalStatus,
    pub to: ProposalStatus,
}

impl ProposalStatus {
    /// Whether `self -> next` is an edge of the status machine
    pub fn can_transition_to(&self, next: ProposalStatus) -> bool {
        use ProposalStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Executed) | (Approved, Failed)
        )
    }

    /// Validate an edge and return the new status
    pub fn transition_to(self, next: ProposalStatus) -> Result<ProposalStatus, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }

    /// No further transitions possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Rejected | ProposalStatus::Executed | ProposalStatus::Failed
        )
    }

    /// Voting outcome already fixed (everything except `PENDING`)
    pub fn is_decided(&self) -> bool {
        !matches!(self, ProposalStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::ProposalStatus::*;
    use super::*;

    const ALL: [ProposalStatus; 5] = [Pending, Approved, Rejected, Executed, Failed];

    #[test]
    fn allowed_edges() {
        assert_eq!(Pending.transition_to(Approved), Ok(Approved));
        assert_eq!(Pending.transition_to(Rejected), Ok(Rejected));
        assert_eq!(Approved.transition_to(Executed), Ok(Executed));
        assert_eq!(Approved.transition_to(Failed), Ok(Failed));
    }

    #[test]
    fn nothing_returns_to_pending() {
        for from in ALL {
            assert!(!from.can_transition_to(Pending), "{from} -> PENDING must be rejected");
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                let err = from.transition_to(to).unwrap_err();
                assert_eq!(err.from, from);
            }
        }
    }

    #[test]
    fn parses_stored_text() {
        assert_eq!("APPROVED".parse::<ProposalStatus>(), Ok(Approved));
        assert_eq!("executed".parse::<ProposalStatus>(), Ok(Executed));

        let err = "CANCELLED".parse::<ProposalStatus>().unwrap_err();
        assert_eq!(err.kind, "proposal status");
        assert_eq!(err.value, "CANCELLED");
        assert_eq!(Failed.to_string(), "FAILED");
    }

    #[test]
    fn only_pending_is_undecided() {
        for status in ALL {
            assert_eq!(status.is_decided(), status != Pending);
        }
    }

    #[test]
    fn pending_cannot_skip_to_execution() {
        assert!(Pending.transition_to(Executed).is_err());
        assert!(Pending.transition_to(Failed).is_err());
        assert!(Rejected.transition_to(Approved).is_err());
    }
}
