//! # Cart Store
//!
//! Per-user cart operations. Each call is one `UserAction::Cart` command on the user's
//! record, so every edit is atomic with respect to other edits of the same cart.
use crate::clients::retry::RetryPolicy;
use crate::clients::user_directory::{read_user, user_action};
use crate::config::StorefrontConfig;
use crate::model::{Cart, CartError, CartLine, CartLineKey, Size, User, UserId};
use crate::user_actor::{CartCommand, UserAction, UserActionResult, UserError};
use resource_actor::ResourceClient;
use tracing::{debug, instrument, warn};

/// Client for a user's cart.
#[derive(Clone)]
pub struct CartStore {
    inner: ResourceClient<User>,
    retry: RetryPolicy,
}

impl CartStore {
    pub fn new(inner: ResourceClient<User>, config: &StorefrontConfig) -> Self {
        Self {
            inner,
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Adds a line, merging into an existing line with the same product and size.
    #[instrument(skip(self))]
    pub async fn add(&self, user_id: UserId, line: CartLine) -> Result<Cart, UserError> {
        debug!("Sending request");
        let (cart, _) = self
            .retry
            .run_at_most_once(|| self.command(user_id, CartCommand::Add(line.clone())))
            .await?;
        Ok(cart)
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        key: CartLineKey,
        quantity: u32,
    ) -> Result<Cart, UserError> {
        debug!("Sending request");
        let command = CartCommand::UpdateQuantity { key, quantity };
        let (cart, _) = self
            .retry
            .run(|| self.command(user_id, command.clone()))
            .await?;
        Ok(cart)
    }

    /// Moves a line to another size; merges with an existing line of that size.
    #[instrument(skip(self))]
    pub async fn update_size(
        &self,
        user_id: UserId,
        key: CartLineKey,
        size: Size,
    ) -> Result<Cart, UserError> {
        debug!("Sending request");
        let command = CartCommand::UpdateSize { key, size };
        let (cart, _) = self
            .retry
            .run_at_most_once(|| self.command(user_id, command.clone()))
            .await?;
        Ok(cart)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: UserId, key: CartLineKey) -> Result<CartLine, UserError> {
        debug!("Sending request");
        let (_, removed) = self
            .retry
            .run_at_most_once(|| self.command(user_id, CartCommand::Remove(key.clone())))
            .await?;
        removed
            .into_iter()
            .next()
            .ok_or(UserError::Cart(CartError::LineNotFound(key)))
    }

    /// Removes the lines with the given keys and returns the ones that were present.
    ///
    /// Keys not in the cart are ignored, so the call is retried freely. If the outcome
    /// stays unknown, the cart is re-read: when none of `keys` is left the take counts as
    /// done (the removed lines are then not reported).
    #[instrument(skip(self))]
    pub async fn take(
        &self,
        user_id: UserId,
        keys: Vec<CartLineKey>,
    ) -> Result<Vec<CartLine>, UserError> {
        debug!("Sending request");
        let result = self
            .retry
            .run(|| self.command(user_id, CartCommand::Take(keys.clone())))
            .await;
        match result {
            Ok((_, removed)) => Ok(removed),
            Err(e) if e.is_ambiguous() => {
                warn!(%user_id, error = %e, "Cart take outcome unknown, re-reading");
                let user = read_user(&self.inner, &self.retry, user_id).await?;
                if keys.iter().any(|key| user.cart.get(key).is_some()) {
                    Err(e)
                } else {
                    Ok(Vec::new())
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Empties the cart and returns what was in it.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<Vec<CartLine>, UserError> {
        debug!("Sending request");
        let (_, removed) = self
            .retry
            .run(|| self.command(user_id, CartCommand::Clear))
            .await?;
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, UserError> {
        let user = read_user(&self.inner, &self.retry, user_id).await?;
        Ok(user.cart.lines().to_vec())
    }

    async fn command(
        &self,
        user_id: UserId,
        command: CartCommand,
    ) -> Result<(Cart, Vec<CartLine>), UserError> {
        match user_action(&self.inner, user_id, UserAction::Cart(command)).await? {
            UserActionResult::Cart { cart, removed } => Ok((cart, removed)),
            _ => unreachable!("Cart action must return Cart result"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProductId, UserCreate};
    use crate::user_actor;
    use resource_actor::mock::{create_mock_client, expect_action};
    use resource_actor::FrameworkError;

    fn line(product: u32, size: &str, quantity: u32) -> CartLine {
        CartLine::new(ProductId(product), Size::from(size), quantity).unwrap()
    }

    async fn store_with_user() -> (CartStore, UserId) {
        let config = StorefrontConfig::default();
        let (actor, client) = user_actor::new(&config);
        tokio::spawn(actor.run(()));
        let id = client
            .create(UserCreate {
                name: "Alice".into(),
                email: "alice@example.com".into(),
            })
            .await
            .unwrap();
        (CartStore::new(client, &config), id)
    }

    #[tokio::test]
    async fn test_add_sends_cart_command() {
        let (client, mut receiver) = create_mock_client::<User>(10);
        let carts = CartStore::new(client, &StorefrontConfig::default());

        let task = tokio::spawn(async move { carts.add(UserId(1), line(3, "M", 2)).await });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, UserId(1));
        assert!(matches!(action, UserAction::Cart(CartCommand::Add(ref l)) if l.quantity() == 2));

        let mut cart = Cart::default();
        cart.add(line(3, "M", 2)).unwrap();
        responder
            .send(Ok(UserActionResult::Cart {
                cart: cart.clone(),
                removed: Vec::new(),
            }))
            .unwrap();

        assert_eq!(task.await.unwrap().unwrap(), cart);
    }

    #[tokio::test]
    async fn test_ambiguous_add_is_not_resent() {
        let (client, mut receiver) = create_mock_client::<User>(10);
        let carts = CartStore::new(client, &StorefrontConfig::default());

        let task = tokio::spawn(async move { carts.add(UserId(1), line(3, "M", 1)).await });

        let (_, _, responder) = expect_action(&mut receiver).await.unwrap();
        drop(responder);

        assert!(task.await.unwrap().unwrap_err().is_ambiguous());
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cart_edits() {
        let (carts, user) = store_with_user().await;

        carts.add(user, line(1, "M", 1)).await.unwrap();
        carts.add(user, line(1, "M", 2)).await.unwrap();
        carts.add(user, line(2, "L", 1)).await.unwrap();
        let cart = carts
            .update_size(user, CartLineKey::new(ProductId(2), "L"), Size::from("XL"))
            .await
            .unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(
            cart.get(&CartLineKey::new(ProductId(1), "M")).map(CartLine::quantity),
            Some(3)
        );

        let err = carts
            .update_quantity(user, CartLineKey::new(ProductId(1), "M"), 0)
            .await
            .unwrap_err();
        assert_eq!(err, UserError::Cart(CartError::InvalidQuantity(0)));

        let removed = carts
            .remove(user, CartLineKey::new(ProductId(2), "XL"))
            .await
            .unwrap();
        assert_eq!(removed.size().as_str(), "XL");
        assert_eq!(carts.lines(user).await.unwrap(), vec![line(1, "M", 3)]);
    }

    #[tokio::test]
    async fn test_overflowing_add_is_rejected_and_actor_keeps_serving() {
        let config = StorefrontConfig::default();
        let (actor, client) = user_actor::new(&config);
        tokio::spawn(actor.run(()));
        let mut users = Vec::new();
        for name in ["Alice", "Bob"] {
            let id = client
                .create(UserCreate {
                    name: name.into(),
                    email: format!("{}@example.com", name.to_lowercase()),
                })
                .await
                .unwrap();
            users.push(id);
        }
        let carts = CartStore::new(client, &config);

        carts.add(users[0], line(1, "M", u32::MAX)).await.unwrap();
        let err = carts.add(users[0], line(1, "M", 1)).await.unwrap_err();
        assert_eq!(
            err,
            UserError::Cart(CartError::QuantityOverflow(CartLineKey::new(ProductId(1), "M")))
        );
        assert_eq!(carts.lines(users[0]).await.unwrap(), vec![line(1, "M", u32::MAX)]);

        carts.add(users[1], line(1, "M", 2)).await.unwrap();
        assert_eq!(carts.lines(users[1]).await.unwrap(), vec![line(1, "M", 2)]);
    }

    #[test]
    fn test_json_line_matches_normalized_key() {
        let parsed: CartLine =
            serde_json::from_str(r#"{"productId":4,"size":" m ","quantity":1}"#).unwrap();
        assert_eq!(parsed.key(), CartLineKey::new(ProductId(4), "M"));
        assert_eq!(parsed, line(4, "M", 1));
    }

    #[tokio::test]
    async fn test_take_keeps_unrelated_lines_and_is_repeatable() {
        let (carts, user) = store_with_user().await;
        carts.add(user, line(1, "M", 1)).await.unwrap();
        carts.add(user, line(2, "S", 2)).await.unwrap();

        let keys = vec![CartLineKey::new(ProductId(1), "M")];
        let taken = carts.take(user, keys.clone()).await.unwrap();
        assert_eq!(taken, vec![line(1, "M", 1)]);
        assert!(carts.take(user, keys).await.unwrap().is_empty());
        assert_eq!(carts.lines(user).await.unwrap(), vec![line(2, "S", 2)]);

        assert_eq!(carts.clear(user).await.unwrap().len(), 1);
        assert!(carts.lines(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (carts, _) = store_with_user().await;
        let err = carts.lines(UserId(99)).await.unwrap_err();
        assert_eq!(err, UserError::NotFound("user_99".into()));

        let err = carts.add(UserId(99), line(1, "M", 1)).await.unwrap_err();
        assert_eq!(
            err,
            UserError::from(FrameworkError::NotFound("user_99".into()))
        );
    }
}
