//! Cart lines and the per-user cart.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error;

use super::ids::ProductId;
use super::product::Size;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    #[error("Invalid quantity: {0} (must be at least 1)")]
    InvalidQuantity(u32),

    #[error("Cart line not found: {0}")]
    LineNotFound(CartLineKey),

    #[error("Quantity for {0} is too large")]
    QuantityOverflow(CartLineKey),
}

/// A cart line is unique per `(product, size)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineKey {
    pub product_id: ProductId,
    pub size: Size,
}

impl CartLineKey {
    pub fn new(product_id: ProductId, size: impl Into<Size>) -> Self {
        Self {
            product_id,
            size: size.into(),
        }
    }
}

impl Display for CartLineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product_id, self.size)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartLineFields {
    product_id: ProductId,
    size: Size,
    quantity: u32,
}

/// One requested item: product, size and a quantity of at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CartLineFields")]
pub struct CartLine {
    product_id: ProductId,
    size: Size,
    quantity: u32,
}

impl TryFrom<CartLineFields> for CartLine {
    type Error = CartError;

    fn try_from(fields: CartLineFields) -> Result<Self, Self::Error> {
        Self::new(fields.product_id, fields.size, fields.quantity)
    }
}

impl CartLine {
    pub fn new(product_id: ProductId, size: Size, quantity: u32) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        Ok(Self {
            product_id,
            size,
            quantity,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn size(&self) -> &Size {
        &self.size
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn key(&self) -> CartLineKey {
        CartLineKey::new(self.product_id, self.size.clone())
    }
}

/// Ordered collection of cart lines, at most one per [`CartLineKey`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, key: &CartLineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.key() == key)
    }

    fn position(&self, key: &CartLineKey) -> Result<usize, CartError> {
        self.lines
            .iter()
            .position(|line| &line.key() == key)
            .ok_or_else(|| CartError::LineNotFound(key.clone()))
    }

    /// Appends the line, or adds its quantity to an existing line with the same key.
    ///
    /// The cart is left unchanged if the merged quantity does not fit in a `u32`.
    pub fn add(&mut self, line: CartLine) -> Result<(), CartError> {
        match self.lines.iter_mut().find(|l| l.key() == line.key()) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| CartError::QuantityOverflow(line.key()))?;
            }
            None => self.lines.push(line),
        }
        Ok(())
    }

    pub fn update_quantity(&mut self, key: &CartLineKey, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let index = self.position(key)?;
        self.lines[index].quantity = quantity;
        Ok(())
    }

    /// Moves a line to another size, merging into an existing line of that size.
    pub fn update_size(&mut self, key: &CartLineKey, size: Size) -> Result<(), CartError> {
        let index = self.position(key)?;
        if key.size == size {
            return Ok(());
        }
        let target = CartLineKey::new(key.product_id, size.clone());
        match self.lines.iter().position(|line| line.key() == target) {
            Some(other) => {
                let moved = self.lines[index].quantity;
                self.lines[other].quantity = self.lines[other]
                    .quantity
                    .checked_add(moved)
                    .ok_or(CartError::QuantityOverflow(target))?;
                self.lines.remove(index);
            }
            None => self.lines[index].size = size,
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &CartLineKey) -> Result<CartLine, CartError> {
        let index = self.position(key)?;
        Ok(self.lines.remove(index))
    }

    /// Removes and returns every line whose key is in `keys`. Absent keys are ignored.
    pub fn take(&mut self, keys: &[CartLineKey]) -> Vec<CartLine> {
        let (taken, kept): (Vec<CartLine>, Vec<CartLine>) = std::mem::take(&mut self.lines)
            .into_iter()
            .partition(|line| keys.contains(&line.key()));
        self.lines = kept;
        taken
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
