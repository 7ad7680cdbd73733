//! # Wishlist Store
//!
//! Per-user saved products. Independent of checkout: stock is never touched here.
use crate::clients::retry::RetryPolicy;
use crate::clients::user_directory::{read_user, user_action};
use crate::config::StorefrontConfig;
use crate::model::{CartLine, Product, ProductId, Size, User, UserId, Wishlist, WishlistEntry};
use crate::user_actor::{UserAction, UserActionResult, UserError, WishlistCommand};
use chrono::Utc;
use resource_actor::ResourceClient;
use tracing::{debug, instrument};

/// Client for a user's wishlist.
#[derive(Clone)]
pub struct WishlistStore {
    inner: ResourceClient<User>,
    retry: RetryPolicy,
}

impl WishlistStore {
    pub fn new(inner: ResourceClient<User>, config: &StorefrontConfig) -> Self {
        Self {
            inner,
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Saves a snapshot of `product`. Returns `false` if it was already saved.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn save(&self, user_id: UserId, product: &Product) -> Result<bool, UserError> {
        debug!("Sending request");
        let entry = WishlistEntry::snapshot(product, Utc::now());
        let (_, changed) = self
            .retry
            .run(|| self.command(user_id, WishlistCommand::Save(entry.clone())))
            .await?;
        Ok(changed)
    }

    /// Returns `false` if the product was not saved.
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<bool, UserError> {
        debug!("Sending request");
        let (_, changed) = self
            .retry
            .run(|| self.command(user_id, WishlistCommand::Remove(product_id)))
            .await?;
        Ok(changed)
    }

    #[instrument(skip(self))]
    pub async fn entries(&self, user_id: UserId) -> Result<Vec<WishlistEntry>, UserError> {
        let user = read_user(&self.inner, &self.retry, user_id).await?;
        Ok(user.wishlist.entries().to_vec())
    }

    #[instrument(skip(self))]
    pub async fn contains(&self, user_id: UserId, product_id: ProductId) -> Result<bool, UserError> {
        let user = read_user(&self.inner, &self.retry, user_id).await?;
        Ok(user.wishlist.contains(product_id))
    }

    /// Removes the entry and adds `quantity` of `size` to the cart in one write.
    #[instrument(skip(self))]
    pub async fn move_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Size,
        quantity: u32,
    ) -> Result<Wishlist, UserError> {
        debug!("Sending request");
        let line = CartLine::new(product_id, size, quantity)?;
        let (wishlist, _) = self
            .retry
            .run_at_most_once(|| self.command(user_id, WishlistCommand::MoveToCart(line.clone())))
            .await?;
        Ok(wishlist)
    }

    async fn command(
        &self,
        user_id: UserId,
        command: WishlistCommand,
    ) -> Result<(Wishlist, bool), UserError> {
        match user_action(&self.inner, user_id, UserAction::Wishlist(command)).await? {
            UserActionResult::Wishlist { wishlist, changed } => Ok((wishlist, changed)),
            _ => unreachable!("Wishlist action must return Wishlist result"),
        }
    }
}
