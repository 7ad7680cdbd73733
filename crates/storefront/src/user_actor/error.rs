//! Error types for the User actor.

use resource_actor::FrameworkError;
use thiserror::Error;

use crate::model::{CartError, OrderError, ProductId, UserId};

/// Errors that can occur during user, cart, wishlist and history operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    /// The requested user was not found.
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Account {0} is blocked")]
    Blocked(UserId),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("{0} is not in the wishlist")]
    NotInWishlist(ProductId),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {reason}")]
    ActorCommunicationError {
        reason: String,
        ambiguous: bool,
        transient: bool,
    },
}

impl UserError {
    /// The request may have been applied even though it reported failure.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            Self::ActorCommunicationError {
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

impl From<FrameworkError> for UserError {
    fn from(e: FrameworkError) -> Self {
        if let Some(inner) = e.entity_error::<UserError>() {
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
