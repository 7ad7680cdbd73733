//! # Framework Errors
//!
//! Common error type for every actor and client. Besides describing what went wrong,
//! each variant answers the question a saga has to ask after a failed call: *could the
//! request still have been applied?*
//!
//! | Variant | Applied? | Worth retrying? |
//! |---------|----------|-----------------|
//! | `ActorClosed` | no | no |
//! | `Unavailable` | no | yes |
//! | `ActorDropped` | unknown | yes, after a re-read |
//! | `Timeout` | unknown | yes, after a re-read |
//! | `NotFound`, `RevisionConflict`, `EntityError` | no | depends on the caller |

use crate::record::Revision;
use std::time::Duration;

/// Errors that can occur within the actor framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("No reply within {0:?}")]
    Timeout(Duration),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Revision conflict on {id}: expected {expected}, found {actual}")]
    RevisionConflict {
        id: String,
        expected: Revision,
        actual: Revision,
    },
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

impl FrameworkError {
    /// The request may or may not have been applied; re-read before acting on it.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::ActorDropped | Self::Timeout(_))
    }

    /// The store did not answer, so the same request may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::ActorDropped | Self::Timeout(_)
        )
    }

    /// Borrow the typed entity error, if this is one of type `E`.
    pub fn entity_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::EntityError(inner) => inner.as_ref().downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error, PartialEq)]
    #[error("out of stock")]
    struct OutOfStock;

    #[test]
    fn test_classification() {
        assert!(FrameworkError::ActorDropped.is_ambiguous());
        assert!(FrameworkError::Timeout(Duration::from_millis(5)).is_ambiguous());
        assert!(!FrameworkError::Unavailable("down".into()).is_ambiguous());
        assert!(FrameworkError::Unavailable("down".into()).is_transient());
        assert!(!FrameworkError::ActorClosed.is_transient());
        assert!(!FrameworkError::NotFound("x".into()).is_transient());
    }

    #[test]
    fn test_entity_error_downcast() {
        let err = FrameworkError::EntityError(Box::new(OutOfStock));
        assert_eq!(err.entity_error::<OutOfStock>(), Some(&OutOfStock));
        assert!(err.entity_error::<std::io::Error>().is_none());
        assert!(FrameworkError::ActorClosed
            .entity_error::<OutOfStock>()
            .is_none());
    }
}
