use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cart::Cart;
use super::ids::{IdempotencyKey, UserId};
use super::order::OrderLog;
use super::wishlist::Wishlist;

/// A shopper account.
///
/// Cart, wishlist and order history are separate concerns that happen to share one
/// record in the store; each is written through its own logical operation.
///
/// # Actor Framework
/// This struct implements the [`ActorEntity`](resource_actor::ActorEntity) trait.
/// See [`UserAction`](crate::user_actor::UserAction) for the operations it supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub blocked: bool,
    pub cart: Cart,
    pub wishlist: Wishlist,
    pub orders: OrderLog,
    pub checkout: Option<CheckoutLease>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            blocked: false,
            cart: Cart::default(),
            wishlist: Wishlist::default(),
            orders: OrderLog::default(),
            checkout: None,
        }
    }
}

/// Marks a checkout as running for this user until `expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLease {
    pub key: IdempotencyKey,
    /// Identifies the checkout run that holds the lease.
    pub holder: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl CheckoutLease {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Payload for registering a new user.
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
}

/// Profile edits.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}
