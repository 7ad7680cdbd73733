//! Custom actions for the Product actor.
//!
//! These actions are handled by [`ActorEntity::handle_action`](resource_actor::ActorEntity::handle_action)
//! on [`Product`](crate::model::Product). Checkout does not use them: it reserves stock
//! with a conditional `replace` so that it can detect and resolve lost replies.

use crate::model::Size;

/// Custom actions for Product entities.
#[derive(Debug, Clone)]
pub enum ProductAction {
    /// Reads the stock level of one size without modifying it.
    CheckStock(Size),
    /// Overwrites one size's counter, adding the size if it is new.
    SetStock { size: Size, quantity: i64 },
    /// Adds a positive quantity to an existing size.
    Restock { size: Size, quantity: i64 },
}

/// Results from ProductActions - variants match 1:1 with ProductAction
#[derive(Debug, Clone, PartialEq)]
pub enum ProductActionResult {
    /// Current stock level of the size
    CheckStock(i64),
    /// New stock level of the size
    SetStock(i64),
    /// New stock level of the size
    Restock(i64),
}
