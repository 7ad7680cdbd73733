//! Error types for the Product actor.

use resource_actor::{FrameworkError, WriteTag};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::{ProductId, Size};

/// Errors that can occur during product operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    /// The requested product was not found.
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("{product_id} has no size {size}")]
    UnknownSize { product_id: ProductId, size: Size },

    /// The requested quantity exceeds the available stock.
    #[error("Insufficient stock for {product_id} size {size}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        size: Size,
        requested: u32,
        available: i64,
    },

    /// A stock counter is (or would become) negative.
    #[error("Negative stock for {product_id} size {size}: {quantity}")]
    NegativeStock {
        product_id: ProductId,
        size: Size,
        quantity: i64,
    },

    /// A stock counter would leave the `i64` range.
    #[error("Stock for {product_id} size {size} would overflow")]
    StockOverflow { product_id: ProductId, size: Size },

    #[error("Negative price: {0}")]
    NegativePrice(Decimal),

    /// The provided quantity is invalid (e.g., zero or negative).
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Product name must not be empty")]
    EmptyName,

    /// Conditional writes kept losing to concurrent writers.
    #[error("{product_id} still contended after {attempts} attempts")]
    Contended { product_id: ProductId, attempts: u32 },

    /// A tagged stock write may or may not have landed and the re-read failed too.
    #[error("Outcome of write {tag} on {product_id} is unknown")]
    Unresolved { product_id: ProductId, tag: WriteTag },

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {reason}")]
    ActorCommunicationError {
        reason: String,
        ambiguous: bool,
        transient: bool,
    },
}

impl ProductError {
    /// The write may have been applied even though it reported failure.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            Self::Unresolved { .. }
                | Self::ActorCommunicationError {
                    ambiguous: true,
                    ..
                }
        )
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ActorCommunicationError {
                transient: true,
                ..
            }
        )
    }
}

impl From<FrameworkError> for ProductError {
    fn from(e: FrameworkError) -> Self {
        if let Some(inner) = e.entity_error::<ProductError>() {
            return inner.clone();
        }
        match e {
            FrameworkError::NotFound(id) => Self::NotFound(id),
            other => Self::ActorCommunicationError {
                reason: other.to_string(),
                ambiguous: other.is_ambiguous(),
                transient: other.is_transient(),
            },
        }
    }
}
