//! Error types for checkout.
//!
//! Every [`CheckoutError`] is reported after compensation has run: the caller sees
//! either a completed order or a failure that left cart, stock and history as they
//! were. `PersistenceFailure::compensated == false` is the one exception and is also
//! logged at `error`.

use serde::Serialize;
use std::fmt::{self, Display};
use thiserror::Error;

use super::state::StateError;
use super::validator::LineCheck;
use crate::model::{CartLineKey, ProductId, Size, UserId};

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum ValidationError {
    #[error("Order has no lines")]
    EmptyOrder,

    #[error("Line {0} appears more than once")]
    DuplicateLine(CartLineKey),

    #[error("Missing shipping fields: {}", .0.join(", "))]
    MissingShippingField(Vec<String>),

    /// Lines that are out of stock, not offered in that size, or not in the catalog.
    #[error("{} line(s) cannot be fulfilled", .0.len())]
    Rejected(Vec<LineCheck>),
}

/// Where a store failure interrupted the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureStage {
    Validation,
    Lease,
    Reservation,
    Commit,
    CartRemoval,
}

impl Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Lease => "lease",
            Self::Reservation => "reservation",
            Self::Commit => "commit",
            Self::CartRemoval => "cart removal",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Lost a stock race on one line.
    #[error("{product_id} size {size}: requested {requested}, only {available} available")]
    ReservationConflict {
        product_id: ProductId,
        size: Size,
        requested: u32,
        available: i64,
    },

    #[error("Store failure during {stage}: {reason}")]
    PersistenceFailure {
        stage: FailureStage,
        reason: String,
        /// Every partial effect was undone.
        compensated: bool,
    },

    #[error("Negative stock for {product_id} size {size}: {quantity}")]
    InvariantViolation {
        product_id: ProductId,
        size: Size,
        quantity: i64,
    },

    #[error("A checkout is already in progress for {0}")]
    CheckoutInProgress(UserId),

    #[error("Unknown user {0}")]
    UnknownUser(UserId),

    #[error("Account {0} is blocked")]
    AccountBlocked(UserId),

    #[error(transparent)]
    IllegalState(#[from] StateError),
}

impl CheckoutError {
    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ReservationConflict { .. }
                | Self::PersistenceFailure { .. }
                | Self::CheckoutInProgress(_)
        )
    }
}
