//! # Generic Client
//!
//! This module defines the generic client for communicating with actors.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{ResourceRequest, Response};
use crate::record::{Revision, Versioned, WriteTag};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// ## ResourceClient
///
/// The `ResourceClient<T>` provides a type-safe, async API for interacting with a
/// `ResourceActor<T>`. It forwards requests over a Tokio mpsc channel and receives results
/// via oneshot channels. The client is cheap to clone and can be shared across tasks.
///
/// ## Call timeouts
///
/// Without a timeout a call waits as long as the actor needs. With
/// [`with_timeout`](Self::with_timeout) the same limit applies to both halves of a call:
///
/// * waiting for mailbox space → [`FrameworkError::Unavailable`] (never delivered)
/// * waiting for the reply → [`FrameworkError::Timeout`] (delivered, outcome unknown)
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
    call_timeout: Option<Duration>,
}

impl<T: ActorEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            call_timeout: self.call_timeout,
        }
    }
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self {
            sender,
            call_timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    pub(crate) fn sender(&self) -> &mpsc::Sender<ResourceRequest<T>> {
        &self.sender
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        let request = build(respond_to);

        let Some(limit) = self.call_timeout else {
            self.sender
                .send(request)
                .await
                .map_err(|_| FrameworkError::ActorClosed)?;
            return response.await.map_err(|_| FrameworkError::ActorDropped)?;
        };

        match tokio::time::timeout(limit, self.sender.send(request)).await {
            Err(_) => {
                return Err(FrameworkError::Unavailable(format!(
                    "mailbox full for {limit:?}"
                )))
            }
            Ok(Err(_)) => return Err(FrameworkError::ActorClosed),
            Ok(Ok(())) => {}
        }
        match tokio::time::timeout(limit, response).await {
            Err(_) => Err(FrameworkError::Timeout(limit)),
            Ok(Err(_)) => Err(FrameworkError::ActorDropped),
            Ok(Ok(result)) => result,
        }
    }

    pub async fn create(&self, params: T::Create) -> Result<T::Id, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Create { params, respond_to })
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<Versioned<T>>, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    /// All records, in no particular order.
    pub async fn list(&self) -> Result<Vec<(T::Id, Versioned<T>)>, FrameworkError> {
        self.call(|respond_to| ResourceRequest::List { respond_to })
            .await
    }

    pub async fn update(
        &self,
        id: T::Id,
        update: T::Update,
    ) -> Result<Versioned<T>, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Update {
            id,
            update,
            respond_to,
        })
        .await
    }

    /// Compare-and-set: installs `record` if the stored revision is still `expected`.
    ///
    /// Returns the new revision. After an ambiguous failure, re-read the record and check
    /// [`Versioned::applied`] with the same `tag`.
    pub async fn replace(
        &self,
        id: T::Id,
        expected: Revision,
        record: T,
        tag: WriteTag,
    ) -> Result<Revision, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Replace {
            id,
            expected,
            record,
            tag,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        self.call(|respond_to| ResourceRequest::Delete { id, respond_to })
            .await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Action {
            id,
            action,
            respond_to,
        })
        .await
    }
}
