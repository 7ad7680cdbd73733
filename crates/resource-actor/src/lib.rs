//! # Resource Actor
//!
//! Building blocks for type-safe, concurrent record stores in Rust. Each store is a
//! **Resource-Oriented** actor: a Tokio task that owns a map of records of one type and
//! serves a uniform set of operations over a channel.
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - the record type and its business rules
//! 2. **Runtime Layer** ([`ResourceActor`]) - sequential message processing over a `HashMap`
//! 3. **Interface Layer** ([`ResourceClient`]) - cloneable, type-safe async handle
//!
//! ## Versioned Records
//!
//! Every stored record carries a [`Revision`] that increases with each committed write.
//! Besides the usual create/get/update/delete/action operations, the actor offers
//! [`ResourceClient::replace`], a compare-and-set that only commits against the revision
//! the caller read. Each replace carries a caller-chosen [`WriteTag`]; the record remembers
//! recent tags, so a caller whose reply was lost can re-read and ask
//! [`Versioned::applied`] instead of guessing.
//!
//! ## Failure Model
//!
//! [`FrameworkError`] distinguishes *definite* failures (the request was not applied)
//! from *ambiguous* ones (it may have been). See [`FrameworkError::is_ambiguous`].
//! Because an actor answers requests in arrival order, a read sent after an ambiguous
//! write observes that write if it happened at all.
//!
//! ```rust
//! use async_trait::async_trait;
//! use resource_actor::{ActorEntity, ResourceActor, WriteTag};
//!
//! #[derive(Clone, Debug)]
//! struct Shelf {
//!     id: u32,
//!     items: i64,
//! }
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("shelf error")]
//! struct ShelfError;
//!
//! #[async_trait]
//! impl ActorEntity for Shelf {
//!     type Id = u32;
//!     type Create = i64;
//!     type Update = i64;
//!     type Action = ();
//!     type ActionResult = ();
//!     type Context = ();
//!     type Error = ShelfError;
//!
//!     fn from_create_params(id: u32, items: i64) -> Result<Self, ShelfError> {
//!         Ok(Self { id, items })
//!     }
//!     async fn on_update(&mut self, items: i64, _: &()) -> Result<(), ShelfError> {
//!         self.items = items;
//!         Ok(())
//!     }
//!     async fn handle_action(&mut self, _: (), _: &()) -> Result<(), ShelfError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = ResourceActor::<Shelf>::new(10);
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client.create(5).await.unwrap();
//!     let current = client.get(id).await.unwrap().unwrap();
//!
//!     let mut next = current.record().clone();
//!     next.items -= 2;
//!     let tag = WriteTag::new();
//!     client.replace(id, current.revision(), next, tag).await.unwrap();
//!
//!     let after = client.get(id).await.unwrap().unwrap();
//!     assert_eq!(after.items, 3);
//!     assert!(after.applied(tag));
//! }
//! ```
//!
//! ## Testing
//!
//! The [`mock`] module offers a scripted mock channel and a [`FaultProxy`](mock::FaultProxy)
//! that injects definite or ambiguous failures in front of a real actor.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod record;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{RequestKind, ResourceRequest, Response};
pub use record::{Revision, Versioned, WriteTag};
