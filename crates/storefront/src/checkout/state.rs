//! The checkout state machine.
//!
//! ```text
//! Validating ──▶ Reserving ──▶ Committing ──▶ Completed
//!     │              │              │
//!     ▼              ▼              ▼
//! ValidationFailed  ReservationFailed  CommitFailed
//! ```

use serde::Serialize;
use std::fmt::{self, Display};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum CheckoutState {
    Validating,
    Reserving,
    Committing,
    Completed,
    ValidationFailed,
    /// `partial` lines had been reserved (and were released again) before the failure.
    ReservationFailed { partial: usize },
    /// `partial` reserved lines were released again after the commit failed.
    CommitFailed { partial: usize },
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("Illegal checkout transition: {from} -> {to}")]
pub struct StateError {
    pub from: CheckoutState,
    pub to: CheckoutState,
}

impl CheckoutState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::ValidationFailed
                | Self::ReservationFailed { .. }
                | Self::CommitFailed { .. }
        )
    }

    /// Moves to `next` if the diagram above allows it.
    pub fn advance(self, next: CheckoutState) -> Result<CheckoutState, StateError> {
        use CheckoutState::*;
        let allowed = matches!(
            (self, next),
            (Validating, Reserving)
                | (Validating, ValidationFailed)
                | (Reserving, Committing)
                | (Reserving, ReservationFailed { .. })
                | (Committing, Completed)
                | (Committing, CommitFailed { .. })
        );
        if allowed {
            Ok(next)
        } else {
            Err(StateError {
                from: self,
                to: next,
            })
        }
    }
}

impl Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validating => f.write_str("validating"),
            Self::Reserving => f.write_str("reserving"),
            Self::Committing => f.write_str("committing"),
            Self::Completed => f.write_str("completed"),
            Self::ValidationFailed => f.write_str("validation failed"),
            Self::ReservationFailed { partial } => {
                write!(f, "reservation failed ({partial} line(s) released)")
            }
            Self::CommitFailed { partial } => {
                write!(f, "commit failed ({partial} line(s) released)")
            }
        }
    }
}
