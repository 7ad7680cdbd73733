//! # Generic Messages
//!
//! This module defines the generic message types used for communication between
//! the `ResourceClient` and `ResourceActor`.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::record::{Revision, Versioned, WriteTag};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to the actor to request operations.
///
/// # Resource-Oriented Architecture
/// Each actor manages one type of record (the [`ActorEntity`]). Instead of ad-hoc messages
/// for every operation, requests are standardized around the lifecycle operations that
/// apply to almost any stored record.
///
/// - **Create**: Lifecycle start. Uses [`ActorEntity::Create`] to initialize a new record.
/// - **Get / List**: Retrieval. Returns records wrapped in [`Versioned`].
/// - **Update**: Patch. Uses [`ActorEntity::Update`] and commits a new revision.
/// - **Replace**: Compare-and-set. Installs a whole record if the stored revision still
///   equals `expected`, remembering `tag` so the caller can later check whether it landed.
/// - **Delete**: Lifecycle end.
/// - **Action**: Extensibility. Executes a custom [`ActorEntity::Action`].
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<Versioned<T>>>,
    },
    List {
        respond_to: Response<Vec<(T::Id, Versioned<T>)>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<Versioned<T>>,
    },
    Replace {
        id: T::Id,
        expected: Revision,
        record: T,
        tag: WriteTag,
        respond_to: Response<Revision>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}

/// Discriminant of a [`ResourceRequest`], used to target fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Create,
    Get,
    List,
    Update,
    Replace,
    Delete,
    Action,
}

impl<T: ActorEntity> ResourceRequest<T> {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Create { .. } => RequestKind::Create,
            Self::Get { .. } => RequestKind::Get,
            Self::List { .. } => RequestKind::List,
            Self::Update { .. } => RequestKind::Update,
            Self::Replace { .. } => RequestKind::Replace,
            Self::Delete { .. } => RequestKind::Delete,
            Self::Action { .. } => RequestKind::Action,
        }
    }

    /// Answer the request with `error` without processing it.
    pub fn refuse(self, error: FrameworkError) {
        match self {
            Self::Create { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
            Self::Get { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
            Self::List { respond_to } => {
                let _ = respond_to.send(Err(error));
            }
            Self::Update { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
            Self::Replace { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
            Self::Delete { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
            Self::Action { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
        }
    }
}
