//! Fixtures shared by the storefront integration tests.
#![allow(dead_code)]

use resource_actor::mock::FaultProxy;
use rust_decimal::Decimal;
use std::time::Duration;
use storefront::checkout::OrderCoordinator;
use storefront::clients::{CartStore, OrderHistory, ProductCatalog, UserDirectory, WishlistStore};
use storefront::config::StorefrontConfig;
use storefront::model::{
    CartLine, ProductCreate, ProductId, ShippingInfo, Size, UserCreate, UserId,
};
use storefront::{product_actor, user_actor};

/// Clients wired through fault proxies, so tests can break chosen store requests.
pub struct FaultyShop {
    pub catalog: ProductCatalog,
    pub users: UserDirectory,
    pub carts: CartStore,
    pub wishlists: WishlistStore,
    pub history: OrderHistory,
    pub coordinator: OrderCoordinator,
    pub product_store: FaultProxy,
    pub user_store: FaultProxy,
}

/// No backoff, so failing tests stay fast.
pub fn config(store_retry_attempts: u32) -> StorefrontConfig {
    StorefrontConfig {
        store_retry_attempts,
        retry_backoff: Duration::ZERO,
        reservation_max_attempts: 3,
        ..StorefrontConfig::default()
    }
}

pub fn faulty_shop(config: &StorefrontConfig) -> FaultyShop {
    let (product_actor, product_client) = product_actor::new(config);
    let (user_actor, user_client) = user_actor::new(config);
    tokio::spawn(product_actor.run(()));
    tokio::spawn(user_actor.run(()));

    let (product_store, product_client) = FaultProxy::spawn(product_client);
    let (user_store, user_client) = FaultProxy::spawn(user_client);

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
    FaultyShop {
        catalog,
        users,
        carts,
        wishlists,
        history,
        coordinator,
        product_store,
        user_store,
    }
}

pub async fn register(users: &UserDirectory, name: &str) -> UserId {
    users
        .register_user(UserCreate {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        })
        .await
        .expect("Failed to register user")
}

/// Creates a product priced at `cents` with the given per-size stock.
pub async fn stock_product(
    catalog: &ProductCatalog,
    name: &str,
    cents: i64,
    sizes: &[(&str, i64)],
) -> ProductId {
    catalog
        .create_product(ProductCreate {
            name: name.to_string(),
            image: format!("{}.png", name.to_lowercase().replace(' ', "-")),
            price: Decimal::new(cents, 2),
            sizes: sizes.iter().map(|&(s, q)| (Size::from(s), q)).collect(),
        })
        .await
        .expect("Failed to create product")
}

pub async fn stock(catalog: &ProductCatalog, id: ProductId, size: &str) -> i64 {
    catalog
        .check_stock(id, Size::from(size))
        .await
        .expect("Failed to check stock")
}

pub fn line(product_id: ProductId, size: &str, quantity: u32) -> CartLine {
    CartLine::new(product_id, Size::from(size), quantity).expect("Invalid cart line")
}

pub fn shipping() -> ShippingInfo {
    ShippingInfo {
        full_name: "Asha Rao".to_string(),
        email: "asha@example.com".to_string(),
        phone: "555-0100".to_string(),
        address: "12 Stadium Road".to_string(),
        city: "Pune".to_string(),
        ..Default::default()
    }
}
