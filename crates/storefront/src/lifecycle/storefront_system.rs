use tracing::{error, info};

use crate::checkout::OrderCoordinator;
use crate::clients::{CartStore, OrderHistory, ProductCatalog, UserDirectory, WishlistStore};
use crate::config::StorefrontConfig;

/// The running storefront: two record actors and the clients that use them.
///
/// # Architecture
///
/// - **Product actor**: products with per-size stock, behind [`ProductCatalog`]
/// - **User actor**: profile, cart, wishlist, order history and checkout lease per user,
///   behind [`UserDirectory`], [`CartStore`], [`WishlistStore`] and [`OrderHistory`]
/// - **[`OrderCoordinator`]**: the checkout saga over both
///
/// # Example
///
/// ```ignore
/// let system = StorefrontSystem::new(&StorefrontConfig::default());
/// let user_id = system.users.register_user(user).await?;
/// let product_id = system.catalog.create_product(product).await?;
/// system.carts.add(user_id, line).await?;
/// let order = system.coordinator.checkout(request).await?;
/// system.shutdown().await?;
/// ```
pub struct StorefrontSystem {
    pub catalog: ProductCatalog,
    pub users: UserDirectory,
    pub carts: CartStore,
    pub wishlists: WishlistStore,
    pub history: OrderHistory,
    pub coordinator: OrderCoordinator,

    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl StorefrontSystem {
    /// Spawns both actors and wires the clients. Must be called inside a Tokio runtime.
    pub fn new(config: &StorefrontConfig) -> Self {
        let (product_actor, product_client) = crate::product_actor::new(config);
        let (user_actor, user_client) = crate::user_actor::new(config);

        // Neither actor depends on another (Context = ())
        let product_handle = tokio::spawn(product_actor.run(()));
        let user_handle = tokio::spawn(user_actor.run(()));

        let catalog = ProductCatalog::new(product_client, config);
        let users = UserDirectory::new(user_client.clone(), config);
        let carts = CartStore::new(user_client.clone(), config);
        let wishlists = WishlistStore::new(user_client.clone(), config);
        let history = OrderHistory::new(user_client, config);
        let coordinator = OrderCoordinator::new(
            catalog.clone(),
            users.clone(),
            carts.clone(),
            history.clone(),
            config,
        );

        info!(?config, "Storefront started");
        Self {
            catalog,
            users,
            carts,
            wishlists,
            history,
            coordinator,
            handles: vec![product_handle, user_handle],
        }
    }

    /// Drops every client, which closes the actors' channels, then waits for both
    /// actor tasks.
    ///
    /// Clones of the clients held elsewhere keep their actor alive; drop them first.
    ///
    /// # Returns
    ///
    /// `Err` if an actor task panicked.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        drop(self.coordinator);
        drop(self.catalog);
        drop(self.users);
        drop(self.carts);
        drop(self.wishlists);
        drop(self.history);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
