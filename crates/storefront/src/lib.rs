//! # Storefront
//!
//! Catalog, carts, wishlists and order history for a clothing storefront, with a
//! checkout coordinator that never oversells and never leaves a half-finished order.
//!
//! ## 🏗️ Layout
//!
//! - **[`model`]**: plain data types. [`Product`](model::Product) and [`User`](model::User)
//!   are the two stored records; carts, wishlists and orders live inside a user.
//! - **[`product_actor`]**, **[`user_actor`]**: the record actors, built on
//!   [`resource_actor::ResourceActor`]. Each processes its requests one at a time.
//! - **[`clients`]**: typed wrappers per concern, with retry for transient store failures.
//! - **[`checkout`]**: the [`StockValidator`](checkout::StockValidator) pre-check and the
//!   [`OrderCoordinator`](checkout::OrderCoordinator) saga.
//! - **[`lifecycle`]**: [`StorefrontSystem`](lifecycle::StorefrontSystem) wiring and
//!   tracing setup.
//! - **[`config`]**: [`StorefrontConfig`](config::StorefrontConfig), loaded from
//!   `STOREFRONT_*` environment variables.
//!
//! ## 🔒 Stock Safety
//!
//! A product's stock can only be decremented by a compare-and-set replace of the whole
//! product record at the revision that was read. Two checkouts that read the same
//! revision cannot both write; the loser re-reads and re-checks. A write whose reply was
//! lost carries a [`WriteTag`](resource_actor::WriteTag), so the client can find out
//! whether it landed instead of writing twice.
//!
//! ## 🧪 Testing
//!
//! [`resource_actor::mock`] has channel-level mocks for the clients and a
//! [`FaultProxy`](resource_actor::mock::FaultProxy) that refuses, loses or drops replies
//! to chosen requests of a real actor.

pub mod checkout;
pub mod clients;
pub mod config;
pub mod lifecycle;
pub mod model;
pub mod product_actor;
pub mod user_actor;
