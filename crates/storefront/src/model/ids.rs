//! Type-safe identifiers.
//!
//! `UserId` and `ProductId` wrap the `u32` the resource actors allocate. Orders are not a
//! resource of their own (they live in the owning user's record), so `OrderId` is a random
//! UUID minted by the coordinator. `IdempotencyKey` is derived deterministically from
//! what the shopper is buying.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use uuid::Uuid;

use super::cart::CartLine;

/// Type-safe identifier for Users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl From<u32> for UserId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user_{}", self.0)
    }
}

/// Type-safe identifier for Products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub u32);

impl From<u32> for ProductId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product_{}", self.0)
    }
}

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order_{}", self.0.simple())
    }
}

/// Namespace for v5 idempotency keys.
const IDEMPOTENCY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b8e_4d0a_4c53_9a7e_21d4_b5c8_e310);

/// Caller-supplied deduplication key for a checkout.
///
/// Two submissions with the same key produce at most one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(pub Uuid);

impl IdempotencyKey {
    /// Deterministic key for a line set and a client request counter.
    ///
    /// Line order does not matter; the same lines resubmitted under the same
    /// `client_request_id` always map to the same key.
    pub fn derive(lines: &[CartLine], client_request_id: u64) -> Self {
        let mut parts: Vec<String> = lines
            .iter()
            .map(|line| format!("{}:{}:{}", line.product_id().0, line.size(), line.quantity()))
            .collect();
        parts.sort();
        let canonical = format!("{}#{}", parts.join(";"), client_request_id);
        Self(Uuid::new_v5(&IDEMPOTENCY_NAMESPACE, canonical.as_bytes()))
    }
}

impl Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "idem_{}", self.0.simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Size;

    fn line(product: u32, size: &str, quantity: u32) -> CartLine {
        CartLine::new(ProductId(product), Size::from(size), quantity).unwrap()
    }

    #[test]
    fn test_key_ignores_line_order() {
        let a = IdempotencyKey::derive(&[line(1, "M", 2), line(2, "L", 1)], 7);
        let b = IdempotencyKey::derive(&[line(2, "L", 1), line(1, "M", 2)], 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_depends_on_request_and_quantities() {
        let base = IdempotencyKey::derive(&[line(1, "M", 2)], 7);
        assert_ne!(base, IdempotencyKey::derive(&[line(1, "M", 2)], 8));
        assert_ne!(base, IdempotencyKey::derive(&[line(1, "M", 3)], 7));
    }

    #[test]
    fn test_display_prefixes() {
        assert_eq!(UserId(3).to_string(), "user_3");
        assert_eq!(ProductId(9).to_string(), "product_9");
        assert!(OrderId::new().to_string().starts_with("order_"));
    }
}
