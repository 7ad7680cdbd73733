//! # Product Actor
//!
//! The Product resource actor: the catalog's products with per-size stock counters.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](resource_actor::ActorEntity) implementation for [`Product`]
//! - [`error`] - [`ProductError`] type for type-safe error handling
//! - [`actions`] - [`ProductAction`] and [`ProductActionResult`] for admin stock edits
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Usage
//!
//! ```rust
//! use storefront::clients::ProductCatalog;
//! use storefront::config::StorefrontConfig;
//! use storefront::model::{ProductCreate, Size, SizeStock};
//! use storefront::product_actor;
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StorefrontConfig::default();
//!     let (actor, generic_client) = product_actor::new(&config);
//!     let catalog = ProductCatalog::new(generic_client, &config);
//!     tokio::spawn(actor.run(()));
//!
//!     let id = catalog
//!         .create_product(ProductCreate {
//!             name: "Home Kit".into(),
//!             image: "home.png".into(),
//!             price: Decimal::new(4999, 2),
//!             sizes: SizeStock::from([(Size::from("M"), 3)]),
//!         })
//!         .await?;
//!     assert_eq!(catalog.check_stock(id, Size::from("M")).await?, 3);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::config::StorefrontConfig;
use crate::model::Product;
use resource_actor::{ResourceActor, ResourceClient};

/// Creates a new Product actor and its client.
pub fn new(config: &StorefrontConfig) -> (ResourceActor<Product>, ResourceClient<Product>) {
    let (actor, client) = ResourceActor::new(config.mailbox_capacity);
    (actor, client.with_timeout(config.store_call_timeout))
}
