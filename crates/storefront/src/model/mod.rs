//! # Domain Model
//!
//! Plain data types shared by the actors, clients and the checkout coordinator.
//! `Product` and `User` are the two stored records; everything else is nested inside
//! them or passed through the API.

pub mod cart;
pub mod ids;
pub mod order;
pub mod product;
pub mod user;
pub mod wishlist;

pub use cart::*;
pub use ids::*;
pub use order::*;
pub use product::*;
pub use user::*;
pub use wishlist::*;
