//! # System Lifecycle
//!
//! Starts the two record actors, wires every client and the checkout coordinator to
//! them, and shuts everything down again.
//!
//! ```rust,ignore
//! let system = StorefrontSystem::new(&StorefrontConfig::from_env()?);
//! let order = system.coordinator.checkout(request).await?;
//! system.shutdown().await?;
//! ```
//!
//! The product and user actors have no context (`Context = ()`); all cross-record
//! coordination happens in [`OrderCoordinator`](crate::checkout::OrderCoordinator),
//! outside the actors. Shutdown drops every client so the actors' channels close, then
//! awaits the actor tasks.
//!
//! [`setup_tracing`] installs the `RUST_LOG`-driven subscriber used by the binary.

pub mod storefront_system;
pub mod tracing;

pub use storefront_system::*;
pub use tracing::*;
