//! Type-safe wrappers around [`ResourceClient`](resource_actor::ResourceClient).
//!
//! One client per concern. The product actor has [`ProductCatalog`]. The user actor is
//! shared by [`UserDirectory`], [`CartStore`], [`WishlistStore`] and [`OrderHistory`],
//! each of which only issues its own kind of command.

pub mod cart_store;
pub mod order_history;
pub mod product_catalog;
pub mod retry;
pub mod user_directory;
pub mod wishlist_store;

pub use cart_store::*;
pub use order_history::*;
pub use product_catalog::*;
pub use retry::*;
pub use user_directory::*;
pub use wishlist_store::*;
