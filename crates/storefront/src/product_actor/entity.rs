//! [`ActorEntity`] implementation for [`Product`].
//!
//! Every committed write re-derives `aggregate_stock` and passes
//! [`ActorEntity::check_invariants`], which rejects negative prices and negative
//! per-size counters.

use async_trait::async_trait;
use resource_actor::ActorEntity;
use rust_decimal::Decimal;

use super::actions::{ProductAction, ProductActionResult};
use super::error::ProductError;
use crate::model::{Product, ProductCreate, ProductId, ProductUpdate, Size};

impl Product {
    fn offered(&self, size: &Size) -> Result<i64, ProductError> {
        self.stock_for(size).ok_or_else(|| ProductError::UnknownSize {
            product_id: self.id,
            size: size.clone(),
        })
    }
}

#[async_trait]
impl ActorEntity for Product {
    type Id = ProductId;
    type Create = ProductCreate;
    type Update = ProductUpdate;
    type Action = ProductAction;
    type ActionResult = ProductActionResult;
    type Context = ();
    type Error = ProductError;

    fn from_create_params(id: ProductId, params: ProductCreate) -> Result<Self, Self::Error> {
        if params.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        Ok(Self::new(
            id,
            params.name,
            params.image,
            params.price,
            params.sizes,
        ))
    }

    async fn on_update(
        &mut self,
        update: ProductUpdate,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ProductError::EmptyName);
            }
            self.name = name;
        }
        if let Some(image) = update.image {
            self.image = image;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(sizes) = update.sizes {
            self.sizes = sizes;
        }
        self.reconcile();
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: ProductAction,
        _ctx: &Self::Context,
    ) -> Result<ProductActionResult, Self::Error> {
        match action {
            ProductAction::CheckStock(size) => {
                Ok(ProductActionResult::CheckStock(self.offered(&size)?))
            }
            ProductAction::SetStock { size, quantity } => {
                self.sizes.insert(size, quantity);
                self.reconcile();
                Ok(ProductActionResult::SetStock(quantity))
            }
            ProductAction::Restock { size, quantity } => {
                if quantity <= 0 {
                    return Err(ProductError::InvalidQuantity(quantity));
                }
                let level = self.offered(&size)?.checked_add(quantity).ok_or_else(|| {
                    ProductError::StockOverflow {
                        product_id: self.id,
                        size: size.clone(),
                    }
                })?;
                self.sizes.insert(size, level);
                self.reconcile();
                Ok(ProductActionResult::Restock(level))
            }
        }
    }

    fn is_read_only(action: &ProductAction) -> bool {
        matches!(action, ProductAction::CheckStock(_))
    }

    fn check_invariants(&self) -> Result<(), Self::Error> {
        if self.price < Decimal::ZERO {
            return Err(ProductError::NegativePrice(self.price));
        }
        if let Some((size, &quantity)) = self.sizes.iter().find(|(_, q)| **q < 0) {
            return Err(ProductError::NegativeStock {
                product_id: self.id,
                size: size.clone(),
                quantity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SizeStock;
    use resource_actor::{FrameworkError, ResourceActor, WriteTag};

    fn kit(sizes: &[(&str, i64)]) -> ProductCreate {
        ProductCreate {
            name: "Away Kit".into(),
            image: "away.png".into(),
            price: Decimal::new(5999, 2),
            sizes: sizes.iter().map(|&(s, q)| (Size::from(s), q)).collect(),
        }
    }

    #[tokio::test]
    async fn test_actions_and_read_only_check() {
        let (actor, client) = ResourceActor::<Product>::new(10);
        tokio::spawn(actor.run(()));
        let id = client.create(kit(&[("M", 2), ("L", 1)])).await.unwrap();

        let level = client
            .perform_action(id, ProductAction::CheckStock(Size::from("M")))
            .await
            .unwrap();
        assert_eq!(level, ProductActionResult::CheckStock(2));
        assert_eq!(client.get(id).await.unwrap().unwrap().revision(), 1);

        let level = client
            .perform_action(
                id,
                ProductAction::Restock {
                    size: Size::from("M"),
                    quantity: 3,
                },
            )
            .await
            .unwrap();
        assert_eq!(level, ProductActionResult::Restock(5));

        client
            .perform_action(
                id,
                ProductAction::SetStock {
                    size: Size::from("XL"),
                    quantity: 4,
                },
            )
            .await
            .unwrap();

        let stored = client.get(id).await.unwrap().unwrap();
        assert_eq!(stored.aggregate_stock, 10);
        assert_eq!(stored.revision(), 3);
    }

    #[tokio::test]
    async fn test_negative_writes_are_rejected() {
        let (actor, client) = ResourceActor::<Product>::new(10);
        tokio::spawn(actor.run(()));

        let err = client.create(kit(&[("M", -1)])).await.unwrap_err();
        assert!(matches!(
            ProductError::from(err),
            ProductError::NegativeStock { quantity: -1, .. }
        ));

        let id = client.create(kit(&[("M", 1)])).await.unwrap();
        let err = client
            .perform_action(
                id,
                ProductAction::SetStock {
                    size: Size::from("M"),
                    quantity: -3,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            ProductError::from(err),
            ProductError::NegativeStock { .. }
        ));

        let read = client.get(id).await.unwrap().unwrap();
        let negative = read.with_stock_delta(&Size::from("M"), -2).unwrap();
        let err = client
            .replace(id, read.revision(), negative, WriteTag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FrameworkError::EntityError(_)));

        let update = ProductUpdate {
            price: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        let err = client.update(id, update).await.unwrap_err();
        assert_eq!(
            ProductError::from(err),
            ProductError::NegativePrice(Decimal::new(-1, 0))
        );

        assert_eq!(
            client.get(id).await.unwrap().unwrap().stock_for(&Size::from("M")),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_update_replaces_size_map_and_reconciles() {
        let (actor, client) = ResourceActor::<Product>::new(10);
        tokio::spawn(actor.run(()));
        let id = client.create(kit(&[("M", 2)])).await.unwrap();

        let update = ProductUpdate {
            sizes: Some(SizeStock::from([(Size::from("S"), 3), (Size::from("L"), 4)])),
            ..Default::default()
        };
        let updated = client.update(id, update).await.unwrap();
        assert_eq!(updated.aggregate_stock, 7);
        assert_eq!(updated.stock_for(&Size::from("M")), None);
    }

    #[tokio::test]
    async fn test_restock_past_counter_range_is_refused() {
        let (actor, client) = ResourceActor::<Product>::new(10);
        tokio::spawn(actor.run(()));
        let id = client.create(kit(&[("M", i64::MAX - 1)])).await.unwrap();

        let err = client
            .perform_action(
                id,
                ProductAction::Restock {
                    size: Size::from("M"),
                    quantity: 5,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            ProductError::from(err),
            ProductError::StockOverflow {
                product_id: id,
                size: Size::from("M"),
            }
        );

        let stored = client.get(id).await.unwrap().unwrap();
        assert_eq!(stored.stock_for(&Size::from("M")), Some(i64::MAX - 1));
        assert_eq!(stored.revision(), 1);
    }
}
