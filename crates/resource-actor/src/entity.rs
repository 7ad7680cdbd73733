//! # ActorEntity Trait
//!
//! The `ActorEntity` trait defines the contract every record type (User, Product, …) must
//! implement to be stored by the generic `ResourceActor`. It specifies associated types for
//! IDs, DTOs, actions, context and errors, and provides the lifecycle hooks
//! (`on_create`, `on_update`, `on_delete`, `handle_action`) plus an invariant check that
//! guards every write path.
//!
//! # Staged Writes
//! Hooks never run against the stored record directly. The actor clones the current
//! record, runs the hook on the clone, calls [`ActorEntity::check_invariants`] and only
//! then commits the clone under a new revision. A hook that fails halfway leaves the
//! stored record exactly as it was.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any record type must implement to be managed by `ResourceActor`.
///
/// # Async & Context
/// This trait is `#[async_trait]` to allow asynchronous operations in hooks (e.g., calling
/// other actors). The `Context` type is injected into every hook at `run()` time, so
/// dependencies are bound late instead of at construction.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity.
    /// Must be convertible from u32 for automatic ID generation.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + From<u32>;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to patch an existing instance.
    type Update: Send + Sync + Debug;

    /// Enum representing resource-specific operations.
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// The error type for this entity.
    ///
    /// One enum per actor rather than one per message: clients deal with a single error
    /// type and the framework can box it into [`FrameworkError::EntityError`](crate::FrameworkError).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full Entity from the ID and Payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Called after the entity is constructed and before it is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Called immediately before the entity is removed from the store.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle a custom resource-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;

    /// Actions for which this returns `true` never bump the record revision.
    fn is_read_only(_action: &Self::Action) -> bool {
        false
    }

    /// Validates a candidate record before it is committed by create, update, replace or
    /// action.
    fn check_invariants(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}
