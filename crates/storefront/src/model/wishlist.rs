use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::ProductId;
use super::product::Product;

/// A saved product with the name, image and price it had when it was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub saved_at: DateTime<Utc>,
}

impl WishlistEntry {
    pub fn snapshot(product: &Product, saved_at: DateTime<Utc>) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            image: product.image.clone(),
            price: product.price,
            saved_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    entries: Vec<WishlistEntry>,
}

impl Wishlist {
    pub fn entries(&self) -> &[WishlistEntry] {
        &self.entries
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.entries.iter().any(|e| e.product_id == product_id)
    }

    /// Returns `false` if the product was already saved; the first snapshot is kept.
    pub fn save(&mut self, entry: WishlistEntry) -> bool {
        if self.contains(entry.product_id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn remove(&mut self, product_id: ProductId) -> Option<WishlistEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.product_id == product_id)?;
        Some(self.entries.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Size, SizeStock};

    fn product(id: u32, cents: i64) -> Product {
        Product::new(
            ProductId(id),
            format!("Kit {id}"),
            "kit.png",
            Decimal::new(cents, 2),
            SizeStock::from([(Size::from("M"), 1)]),
        )
    }

    #[test]
    fn test_save_keeps_first_snapshot() {
        let mut wishlist = Wishlist::default();
        let now = Utc::now();

        assert!(wishlist.save(WishlistEntry::snapshot(&product(1, 1000), now)));
        assert!(!wishlist.save(WishlistEntry::snapshot(&product(1, 2000), now)));
        assert_eq!(wishlist.entries().len(), 1);
        assert_eq!(wishlist.entries()[0].price, Decimal::new(1000, 2));
    }

    #[test]
    fn test_remove() {
        let mut wishlist = Wishlist::default();
        wishlist.save(WishlistEntry::snapshot(&product(1, 1000), Utc::now()));

        assert!(wishlist.remove(ProductId(1)).is_some());
        assert!(wishlist.remove(ProductId(1)).is_none());
        assert!(!wishlist.contains(ProductId(1)));
    }
}
