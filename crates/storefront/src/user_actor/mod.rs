//! # User Actor
//!
//! The User resource actor. A user record holds the shopper's profile, cart, wishlist,
//! order history and the checkout lease that keeps two checkouts of the same user from
//! running at once.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](resource_actor::ActorEntity) implementation for [`User`]
//! - [`error`] - [`UserError`]
//! - [`actions`] - [`UserAction`] with one command enum per concern
//!
//! The typed clients in [`crate::clients`] ([`CartStore`](crate::clients::CartStore),
//! [`WishlistStore`](crate::clients::WishlistStore),
//! [`OrderHistory`](crate::clients::OrderHistory),
//! [`UserDirectory`](crate::clients::UserDirectory)) all share one
//! `ResourceClient<User>` and each issues only its own commands.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::config::StorefrontConfig;
use crate::model::User;
use resource_actor::{ResourceActor, ResourceClient};

/// Creates a new User actor and its client.
pub fn new(config: &StorefrontConfig) -> (ResourceActor<User>, ResourceClient<User>) {
    let (actor, client) = ResourceActor::new(config.mailbox_capacity);
    (actor, client.with_timeout(config.store_call_timeout))
}
