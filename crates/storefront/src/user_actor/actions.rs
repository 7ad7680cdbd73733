//! Custom actions for the User actor.
//!
//! One user record carries three independent concerns (cart, wishlist, order history)
//! plus the checkout lease. Each concern gets its own command enum so that callers only
//! ever touch the part of the record they own.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{
    Cart, CartLine, CartLineKey, IdempotencyKey, Order, OrderId, OrderStatus, ProductId, Size,
    Wishlist, WishlistEntry,
};

#[derive(Debug, Clone)]
pub enum CartCommand {
    Add(CartLine),
    UpdateQuantity { key: CartLineKey, quantity: u32 },
    UpdateSize { key: CartLineKey, size: Size },
    Remove(CartLineKey),
    /// Removes the listed lines; keys not in the cart are ignored.
    Take(Vec<CartLineKey>),
    Clear,
}

#[derive(Debug, Clone)]
pub enum WishlistCommand {
    Save(WishlistEntry),
    Remove(ProductId),
    /// Removes the product from the wishlist and adds the line to the cart.
    MoveToCart(CartLine),
}

#[derive(Debug, Clone)]
pub enum HistoryCommand {
    /// Appends unless an order with the same id is already recorded.
    Append(Order),
    Retract(OrderId),
    SetStatus { order_id: OrderId, status: OrderStatus },
}

/// Custom actions for User entities.
#[derive(Debug, Clone)]
pub enum UserAction {
    Cart(CartCommand),
    Wishlist(WishlistCommand),
    History(HistoryCommand),
    /// Claims the per-user checkout lease for `holder`.
    ///
    /// Re-issuing it for the same `holder` is harmless.
    BeginCheckout {
        key: IdempotencyKey,
        holder: Uuid,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    },
    /// Releases the lease if `holder` still owns it.
    EndCheckout { holder: Uuid },
    SetBlocked(bool),
}

/// Outcome of [`UserAction::BeginCheckout`].
#[derive(Debug, Clone, PartialEq)]
pub enum LeaseOutcome {
    Acquired,
    /// An order with this idempotency key already exists.
    AlreadyCompleted(Order),
    /// Another checkout holds an unexpired lease.
    InProgress {
        key: IdempotencyKey,
        expires_at: DateTime<Utc>,
    },
}

/// Results from UserActions - variants match 1:1 with UserAction
#[derive(Debug, Clone, PartialEq)]
pub enum UserActionResult {
    /// Cart after the command, plus any lines it removed
    Cart { cart: Cart, removed: Vec<CartLine> },
    /// Wishlist after the command; `changed` is false for a no-op
    Wishlist { wishlist: Wishlist, changed: bool },
    /// The affected order, if any
    History(Option<Order>),
    BeginCheckout(LeaseOutcome),
    /// Whether the lease was released
    EndCheckout(bool),
    /// The new blocked flag
    SetBlocked(bool),
}
