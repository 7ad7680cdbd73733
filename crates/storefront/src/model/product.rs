//! Catalog products and their per-size stock.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

use super::ids::ProductId;
use crate::product_actor::ProductError;

/// A size label such as `M` or `2XL`. Labels are trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Size(String);

impl Size {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Size {
    fn from(label: &str) -> Self {
        Self(label.trim().to_uppercase())
    }
}

impl From<String> for Size {
    fn from(label: String) -> Self {
        Self::from(label.as_str())
    }
}

impl From<Size> for String {
    fn from(size: Size) -> Self {
        size.0
    }
}

impl Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Size labels offered by the admin product form.
pub const STANDARD_SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "2XL"];

/// Per-size stock counters. Signed so that a corrupted negative value stays visible.
pub type SizeStock = BTreeMap<Size, i64>;

/// Represents a product in the catalog.
///
/// # Actor Framework
/// This struct implements the [`ActorEntity`](resource_actor::ActorEntity) trait,
/// allowing it to be managed by a [`ResourceActor`](resource_actor::ResourceActor).
///
/// See [`impl ActorEntity for Product`](#impl-ActorEntity-for-Product) for details on:
/// - Creation parameters ([`ProductCreate`])
/// - Update parameters ([`ProductUpdate`])
/// - Custom actions ([`ProductAction`](crate::product_actor::ProductAction))
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub sizes: SizeStock,
    /// Cached sum of `sizes`. Never used to decide availability.
    pub aggregate_stock: i64,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        image: impl Into<String>,
        price: Decimal,
        sizes: SizeStock,
    ) -> Self {
        let mut product = Self {
            id,
            name: name.into(),
            image: image.into(),
            price,
            sizes,
            aggregate_stock: 0,
        };
        product.reconcile();
        product
    }

    pub fn stock_for(&self, size: &Size) -> Option<i64> {
        self.sizes.get(size).copied()
    }

    /// Total stock re-derived from the per-size counters, saturating at the `i64` bounds.
    pub fn derived_stock(&self) -> i64 {
        self.sizes.values().fold(0i64, |total, &n| total.saturating_add(n))
    }

    pub fn reconcile(&mut self) {
        self.aggregate_stock = self.derived_stock();
    }

    pub fn is_reconciled(&self) -> bool {
        self.aggregate_stock == self.derived_stock()
    }

    /// Copy of this product with `delta` applied to one size and the aggregate re-derived.
    ///
    /// # Errors
    ///
    /// [`ProductError::UnknownSize`] if the size is not offered,
    /// [`ProductError::StockOverflow`] if the counter would leave the `i64` range.
    pub fn with_stock_delta(&self, size: &Size, delta: i64) -> Result<Self, ProductError> {
        let mut next = self.clone();
        let counter = next
            .sizes
            .get_mut(size)
            .ok_or_else(|| ProductError::UnknownSize {
                product_id: self.id,
                size: size.clone(),
            })?;
        *counter = counter
            .checked_add(delta)
            .ok_or_else(|| ProductError::StockOverflow {
                product_id: self.id,
                size: size.clone(),
            })?;
        next.reconcile();
        Ok(next)
    }
}

/// DTO for Product creation.
#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub sizes: SizeStock,
}

/// DTO for Product edits from the admin back office. `sizes` replaces the whole map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub image: Option<String>,
    pub price: Option<Decimal>,
    pub sizes: Option<SizeStock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tee() -> Product {
        let sizes = SizeStock::from([(Size::from("m"), 2), (Size::from("L"), 5)]);
        Product::new(ProductId(1), "Home Kit", "home.png", Decimal::new(4999, 2), sizes)
    }

    #[test]
    fn test_size_labels_are_normalized() {
        assert_eq!(Size::from(" xl "), Size::from("XL"));
        assert_eq!(Size::from("2xl").as_str(), "2XL");
    }

    #[test]
    fn test_new_reconciles_aggregate() {
        let product = tee();
        assert_eq!(product.aggregate_stock, 7);
        assert!(product.is_reconciled());
        assert_eq!(product.stock_for(&Size::from("M")), Some(2));
        assert_eq!(product.stock_for(&Size::from("S")), None);
    }

    #[test]
    fn test_stock_delta_rederives_aggregate() {
        let product = tee();
        let next = product.with_stock_delta(&Size::from("M"), -2).unwrap();
        assert_eq!(next.stock_for(&Size::from("M")), Some(0));
        assert_eq!(next.aggregate_stock, 5);
        assert!(matches!(
            product.with_stock_delta(&Size::from("XS"), 1),
            Err(ProductError::UnknownSize { .. })
        ));
    }

    #[test]
    fn test_stock_delta_refuses_to_overflow() {
        let mut product = tee();
        product.sizes.insert(Size::from("M"), i64::MAX - 1);
        product.reconcile();
        assert_eq!(product.aggregate_stock, i64::MAX);

        assert_eq!(
            product.with_stock_delta(&Size::from("M"), 2),
            Err(ProductError::StockOverflow {
                product_id: ProductId(1),
                size: Size::from("M"),
            })
        );
        let next = product.with_stock_delta(&Size::from("M"), 1).unwrap();
        assert_eq!(next.stock_for(&Size::from("M")), Some(i64::MAX));
        assert_eq!(next.aggregate_stock, i64::MAX);
    }

    #[test]
    fn test_deserialized_sizes_are_normalized() {
        let size: Size = serde_json::from_str("\" m \"").unwrap();
        assert_eq!(size, Size::from("M"));
        assert_eq!(serde_json::to_string(&size).unwrap(), "\"M\"");

        let sizes: SizeStock = serde_json::from_str(r#"{"xl": 3, "M": 1}"#).unwrap();
        assert_eq!(sizes.get(&Size::from("XL")), Some(&3));
    }

    #[test]
    fn test_drift_is_detectable() {
        let mut product = tee();
        product.aggregate_stock = 100;
        assert!(!product.is_reconciled());
        assert_eq!(product.derived_stock(), 7);
    }
}
