//! # Generic Actor Server
//!
//! This module defines the `ResourceActor`, the component that owns a collection of
//! versioned records. It implements the "Server" side of the Actor Model, processing
//! messages sequentially and ensuring exclusive access to the store.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use crate::record::{Revision, Versioned, WriteTag};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The generic actor that manages a collection of records.
///
/// # Concurrency Model
/// Each actor processes its own messages *sequentially* in a loop, so the `store` needs no
/// `Mutex` or `RwLock`. Requests are handled in arrival order: a read sent after a write
/// from the same client always observes that write.
///
/// # Operations
///
/// * **Create**: allocates the next `u32` id, builds the record with
///   `T::from_create_params`, runs `on_create` and stores it at revision 1.
/// * **Get / List**: clone the stored [`Versioned`] records.
/// * **Update**: stages `on_update` on a clone, commits it under revision + 1.
/// * **Replace**: commits the caller's record only if the stored revision equals
///   `expected`, otherwise answers [`FrameworkError::RevisionConflict`].
/// * **Delete**: runs `on_delete`, then removes the record.
/// * **Action**: stages `handle_action` on a clone. Read-only actions are answered
///   without touching the store; all others commit under revision + 1.
///
/// Every staged record passes `check_invariants` before it is committed.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, Versioned<T>>,
    next_id: u32,
}

fn rejected<E: std::error::Error + Send + Sync + 'static>(e: E) -> FrameworkError {
    FrameworkError::EntityError(Box::new(e))
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the capacity of the MPSC channel. If the channel is full, calls
    /// to the client wait for space (or fail with `Unavailable` once the client's call
    /// timeout elapses).
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id: 1,
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs the actor's event loop, processing messages until the channel closes.
    ///
    /// The `context` argument is injected into every entity hook.
    pub async fn run(mut self, context: T::Context) {
        // "Product" instead of "storefront::model::product::Product"
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let result = self.create(params, &context).await;
                    match &result {
                        Ok(id) => info!(entity_type, %id, size = self.store.len(), "Created"),
                        Err(e) => warn!(entity_type, error = %e, "Create failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let found = item.is_some();
                    debug!(entity_type, %id, found, "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { respond_to } => {
                    debug!(entity_type, size = self.store.len(), "List");
                    let items = self
                        .store
                        .iter()
                        .map(|(id, item)| (id.clone(), item.clone()))
                        .collect();
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let result = self.update(&id, update, &context).await;
                    match &result {
                        Ok(item) => info!(entity_type, %id, revision = item.revision(), "Updated"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Update failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Replace {
                    id,
                    expected,
                    record,
                    tag,
                    respond_to,
                } => {
                    debug!(entity_type, %id, expected, %tag, "Replace");
                    let result = self.replace(&id, expected, record, tag);
                    match &result {
                        Ok(revision) => info!(entity_type, %id, revision, %tag, "Replaced"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Replace rejected"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    let result = self.delete(&id, &context).await;
                    match &result {
                        Ok(()) => info!(entity_type, %id, size = self.store.len(), "Deleted"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Delete failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let result = self.action(&id, action, &context).await;
                    match &result {
                        Ok(_) => debug!(entity_type, %id, "Action ok"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Action failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }

    async fn create(
        &mut self,
        params: T::Create,
        context: &T::Context,
    ) -> Result<T::Id, FrameworkError> {
        let id = T::Id::from(self.next_id);
        self.next_id += 1;

        let mut item = T::from_create_params(id.clone(), params).map_err(rejected)?;
        item.on_create(context).await.map_err(rejected)?;
        item.check_invariants().map_err(rejected)?;
        self.store.insert(id.clone(), Versioned::new(1, item));
        Ok(id)
    }

    async fn update(
        &mut self,
        id: &T::Id,
        update: T::Update,
        context: &T::Context,
    ) -> Result<Versioned<T>, FrameworkError> {
        let current = self
            .store
            .get_mut(id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;

        let mut staged = current.record().clone();
        staged.on_update(update, context).await.map_err(rejected)?;
        staged.check_invariants().map_err(rejected)?;
        current.commit(staged, None);
        Ok(current.clone())
    }

    fn replace(
        &mut self,
        id: &T::Id,
        expected: Revision,
        record: T,
        tag: WriteTag,
    ) -> Result<Revision, FrameworkError> {
        let current = self
            .store
            .get_mut(id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;

        if current.revision() != expected {
            return Err(FrameworkError::RevisionConflict {
                id: id.to_string(),
                expected,
                actual: current.revision(),
            });
        }
        record.check_invariants().map_err(rejected)?;
        current.commit(record, Some(tag));
        Ok(current.revision())
    }

    async fn delete(&mut self, id: &T::Id, context: &T::Context) -> Result<(), FrameworkError> {
        let item = self
            .store
            .get(id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        item.record().on_delete(context).await.map_err(rejected)?;
        self.store.remove(id);
        Ok(())
    }

    async fn action(
        &mut self,
        id: &T::Id,
        action: T::Action,
        context: &T::Context,
    ) -> Result<T::ActionResult, FrameworkError> {
        let current = self
            .store
            .get_mut(id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;

        let read_only = T::is_read_only(&action);
        let mut staged = current.record().clone();
        let result = staged
            .handle_action(action, context)
            .await
            .map_err(rejected)?;
        if !read_only {
            staged.check_invariants().map_err(rejected)?;
            current.commit(staged, None);
        }
        Ok(result)
    }
}
