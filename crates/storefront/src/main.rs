//! # Storefront demo
//!
//! Starts a [`StorefrontSystem`], stocks two products, fills a cart and checks it out,
//! then replays the same checkout to show that it is idempotent.

use rust_decimal::Decimal;
use storefront::checkout::CheckoutRequest;
use storefront::config::StorefrontConfig;
use storefront::lifecycle::{setup_tracing, StorefrontSystem};
use storefront::model::{
    CartLine, OrderStatus, PaymentMethod, ProductCreate, ShippingInfo, Size, UserCreate,
    STANDARD_SIZES,
};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = StorefrontConfig::from_env().map_err(|e| e.to_string())?;
    let system = StorefrontSystem::new(&config);

    let user_id = system
        .users
        .register_user(UserCreate {
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
        })
        .await
        .map_err(|e| e.to_string())?;
    info!(%user_id, "User registered");

    let jersey = system
        .catalog
        .create_product(ProductCreate {
            name: "Home Jersey".to_string(),
            image: "jersey-home.png".to_string(),
            price: Decimal::new(5999, 2),
            sizes: STANDARD_SIZES.iter().map(|&s| (Size::from(s), 5)).collect(),
        })
        .await
        .map_err(|e| e.to_string())?;
    let socks = system
        .catalog
        .create_product(ProductCreate {
            name: "Match Socks".to_string(),
            image: "socks.png".to_string(),
            price: Decimal::new(1250, 2),
            sizes: [("S", 2), ("M", 1), ("L", 0)]
                .into_iter()
                .map(|(s, q)| (Size::from(s), q))
                .collect(),
        })
        .await
        .map_err(|e| e.to_string())?;

    let sock_entry = system
        .catalog
        .product(socks)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("socks vanished")?;
    system
        .wishlists
        .save(user_id, &sock_entry)
        .await
        .map_err(|e| e.to_string())?;
    system
        .wishlists
        .move_to_cart(user_id, socks, Size::from("M"), 1)
        .await
        .map_err(|e| e.to_string())?;
    let jersey_line = CartLine::new(jersey, Size::from("L"), 2).map_err(|e| e.to_string())?;
    system
        .carts
        .add(user_id, jersey_line)
        .await
        .map_err(|e| e.to_string())?;

    let lines = system.carts.lines(user_id).await.map_err(|e| e.to_string())?;
    let shipping = ShippingInfo {
        full_name: "Asha Rao".to_string(),
        email: "asha@example.com".to_string(),
        phone: "555-0100".to_string(),
        address: "12 Stadium Road".to_string(),
        city: "Pune".to_string(),
        country: "IN".to_string(),
        ..Default::default()
    };
    let request = CheckoutRequest::from_cart(user_id, lines, shipping, PaymentMethod::Cod, 1);

    let span = tracing::info_span!("checkout_demo");
    let result = async {
        info!("Checking out the cart");
        system.coordinator.checkout(request.clone()).await
    }
    .instrument(span)
    .await;

    match result {
        Ok(order) => {
            let json = serde_json::to_string_pretty(&order).map_err(|e| e.to_string())?;
            println!("{json}");

            let replay = system
                .coordinator
                .checkout(request)
                .await
                .map_err(|e| e.to_string())?;
            info!(same_order = replay.id() == order.id(), "Replayed checkout");

            system
                .history
                .transition_status(user_id, order.id(), OrderStatus::Processing)
                .await
                .map_err(|e| e.to_string())?;
        }
        Err(e) => error!(error = %e, retryable = e.is_retryable(), "Checkout failed"),
    }

    for product in system.catalog.products().await.map_err(|e| e.to_string())? {
        info!(product_id = %product.id, stock = product.aggregate_stock, "Remaining stock");
    }

    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}
