//! # Checkout
//!
//! Turns a set of cart lines into an order without overselling and without leaving
//! partial effects behind.
//!
//! - [`validator`] - [`StockValidator`], the read-only availability pre-check
//! - [`coordinator`] - [`OrderCoordinator`], the reservation / commit saga
//! - [`state`] - [`CheckoutState`], the saga's state machine
//! - [`error`] - [`CheckoutError`] and [`ValidationError`]
//!
//! Stock is only ever decremented by a compare-and-set write on the product record, so
//! two checkouts racing for the last unit cannot both win. Everything a checkout did is
//! undone before it reports failure.

pub mod coordinator;
pub mod error;
pub mod state;
pub mod validator;

pub use coordinator::*;
pub use error::*;
pub use state::*;
pub use validator::*;
