//! Checkout against stores that refuse, lose or drop replies to chosen requests.
//!
//! User-store actions during one cart checkout arrive in this order: 1 lease,
//! 2 order append, 3 cart removal, 4 lease release. Product-store replaces are the stock
//! writes, one per reserved line plus one per released line.

mod common;

use common::{config, faulty_shop, line, register, shipping, stock, stock_product, FaultyShop};
use resource_actor::mock::Fault;
use resource_actor::RequestKind;
use storefront::checkout::{CheckoutError, CheckoutRequest, FailureStage};
use storefront::model::{CartLine, PaymentMethod, ProductId, UserId};

struct Scenario {
    shop: FaultyShop,
    user: UserId,
    jersey: ProductId,
    socks: ProductId,
    cart: Vec<CartLine>,
}

impl Scenario {
    /// Jersey M:5 and socks S:4, with two jerseys and one pair of socks in the cart.
    async fn new(store_retry_attempts: u32) -> Self {
        let shop = faulty_shop(&config(store_retry_attempts));
        let user = register(&shop.users, "Asha").await;
        let jersey = stock_product(&shop.catalog, "Jersey", 5999, &[("M", 5)]).await;
        let socks = stock_product(&shop.catalog, "Socks", 999, &[("S", 4)]).await;
        shop.carts.add(user, line(jersey, "M", 2)).await.unwrap();
        shop.carts.add(user, line(socks, "S", 1)).await.unwrap();
        let cart = shop.carts.lines(user).await.unwrap();
        Self {
            shop,
            user,
            jersey,
            socks,
            cart,
        }
    }

    fn request(&self) -> CheckoutRequest {
        CheckoutRequest::from_cart(self.user, self.cart.clone(), shipping(), PaymentMethod::Card, 1)
    }

    async fn checkout(&self) -> Result<storefront::model::Order, CheckoutError> {
        self.shop.coordinator.checkout(self.request()).await
    }

    /// Nothing the checkout touched has changed.
    async fn assert_untouched(&self) {
        self.shop.product_store.heal();
        self.shop.user_store.heal();
        assert_eq!(stock(&self.shop.catalog, self.jersey, "M").await, 5);
        assert_eq!(stock(&self.shop.catalog, self.socks, "S").await, 4);
        assert_eq!(self.shop.carts.lines(self.user).await.unwrap(), self.cart);
        assert!(self.shop.history.orders(self.user).await.unwrap().is_empty());
        assert!(self.shop.users.user(self.user).await.unwrap().checkout.is_none());
    }

    /// The checkout went through exactly once.
    async fn assert_completed_once(&self) {
        self.shop.product_store.heal();
        self.shop.user_store.heal();
        assert_eq!(stock(&self.shop.catalog, self.jersey, "M").await, 3);
        assert_eq!(stock(&self.shop.catalog, self.socks, "S").await, 3);
        assert!(self.shop.carts.lines(self.user).await.unwrap().is_empty());
        assert_eq!(self.shop.history.orders(self.user).await.unwrap().len(), 1);
    }
}

fn assert_persistence_failure(
    result: Result<storefront::model::Order, CheckoutError>,
    expected_stage: FailureStage,
    expected_compensated: bool,
) {
    match result {
        Err(CheckoutError::PersistenceFailure {
            stage, compensated, ..
        }) => {
            assert_eq!(stage, expected_stage);
            assert_eq!(compensated, expected_compensated);
        }
        other => panic!("Expected a {expected_stage} failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reservation_failure_releases_earlier_lines() {
    let scenario = Scenario::new(2).await;
    // Every compare-and-set attempt for the second line is refused
    for n in 2..=4 {
        scenario
            .shop
            .product_store
            .fail_nth(RequestKind::Replace, n, Fault::Refuse);
    }

    let result = scenario.checkout().await;

    assert_persistence_failure(result, FailureStage::Reservation, true);
    assert_eq!(scenario.shop.product_store.seen(RequestKind::Replace), 5);
    scenario.assert_untouched().await;
}

#[tokio::test]
async fn test_refused_append_releases_stock() {
    let scenario = Scenario::new(2).await;
    scenario.shop.user_store.fail_nth(RequestKind::Action, 2, Fault::Refuse);
    scenario.shop.user_store.fail_nth(RequestKind::Action, 3, Fault::Refuse);

    let result = scenario.checkout().await;

    assert_persistence_failure(result, FailureStage::Commit, true);
    scenario.assert_untouched().await;
}

#[tokio::test]
async fn test_lost_append_is_retracted_before_release() {
    let scenario = Scenario::new(1).await;
    scenario.shop.user_store.fail_nth(RequestKind::Action, 2, Fault::Lose);

    let result = scenario.checkout().await;

    assert!(result.as_ref().is_err_and(CheckoutError::is_retryable));
    assert_persistence_failure(result, FailureStage::Commit, true);
    scenario.assert_untouched().await;
}

#[tokio::test]
async fn test_dropped_append_reply_still_completes() {
    let scenario = Scenario::new(1).await;
    scenario
        .shop
        .user_store
        .fail_nth(RequestKind::Action, 2, Fault::DropReply);

    let order = scenario.checkout().await.expect("Checkout should recover the append");

    assert_eq!(order.lines().len(), 2);
    scenario.assert_completed_once().await;
}

#[tokio::test]
async fn test_cart_removal_failure_retracts_order() {
    let scenario = Scenario::new(1).await;
    scenario.shop.user_store.fail_nth(RequestKind::Action, 3, Fault::Refuse);

    let result = scenario.checkout().await;

    assert_persistence_failure(result, FailureStage::CartRemoval, true);
    scenario.assert_untouched().await;
}

#[tokio::test]
async fn test_dropped_reservation_reply_is_not_repeated() {
    let scenario = Scenario::new(1).await;
    scenario
        .shop
        .product_store
        .fail_nth(RequestKind::Replace, 1, Fault::DropReply);

    scenario.checkout().await.expect("Checkout should recover the reservation");

    assert_eq!(scenario.shop.product_store.seen(RequestKind::Replace), 2);
    scenario.assert_completed_once().await;
}

#[tokio::test]
async fn test_lost_reservation_is_retried() {
    let scenario = Scenario::new(1).await;
    scenario
        .shop
        .product_store
        .fail_nth(RequestKind::Replace, 1, Fault::Lose);

    scenario.checkout().await.expect("Checkout should retry the reservation");

    assert_eq!(scenario.shop.product_store.seen(RequestKind::Replace), 3);
    scenario.assert_completed_once().await;
}

/// A stock write whose outcome cannot be learned is reported, not papered over.
#[tokio::test]
async fn test_unresolvable_reservation_is_reported() {
    let shop = faulty_shop(&config(1));
    let user = register(&shop.users, "Bo").await;
    let cap = stock_product(&shop.catalog, "Cap", 1500, &[("M", 2)]).await;
    // Reads: 1 validation, 2 reservation; the write lands but its reply is dropped, and
    // every read after that is refused
    shop.product_store
        .fail_nth(RequestKind::Replace, 1, Fault::DropReply);
    for n in 3..=8 {
        shop.product_store.fail_nth(RequestKind::Get, n, Fault::Refuse);
    }

    let request = CheckoutRequest::buy_now(user, line(cap, "M", 1), shipping(), PaymentMethod::Cod, 1);
    let result = shop.coordinator.checkout(request).await;

    assert_persistence_failure(result, FailureStage::Reservation, false);
    shop.product_store.heal();
    assert_eq!(stock(&shop.catalog, cap, "M").await, 1);
    assert!(shop.history.orders(user).await.unwrap().is_empty());
}

/// A stock write confirmed only after the reservation gave up is still released.
#[tokio::test]
async fn test_late_confirmed_reservation_is_released() {
    let scenario = Scenario::new(1).await;
    // Reads: 1-2 validation, 3-4 reservation. The socks write lands with its reply
    // dropped, the catalog's own check is refused, and the saga's check succeeds.
    scenario
        .shop
        .product_store
        .fail_nth(RequestKind::Replace, 2, Fault::DropReply);
    scenario
        .shop
        .product_store
        .fail_nth(RequestKind::Get, 5, Fault::Refuse);

    let result = scenario.checkout().await;

    assert_persistence_failure(result, FailureStage::Reservation, true);
    assert_eq!(scenario.shop.product_store.seen(RequestKind::Replace), 4);
    scenario.assert_untouched().await;
}

#[tokio::test]
async fn test_unreadable_catalog_fails_validation_and_can_be_resubmitted() {
    let scenario = Scenario::new(2).await;
    scenario
        .shop
        .product_store
        .fail_all(RequestKind::Get, Fault::Refuse);

    let result = scenario.checkout().await;

    assert!(result.as_ref().is_err_and(CheckoutError::is_retryable));
    assert_persistence_failure(result, FailureStage::Validation, true);
    scenario.assert_untouched().await;

    scenario.checkout().await.expect("Resubmission should succeed");
    scenario.assert_completed_once().await;
}

#[tokio::test]
async fn test_refused_lease_changes_nothing() {
    let scenario = Scenario::new(1).await;
    scenario.shop.user_store.fail_nth(RequestKind::Action, 1, Fault::Refuse);

    let result = scenario.checkout().await;

    assert_persistence_failure(result, FailureStage::Lease, true);
    assert_eq!(scenario.shop.product_store.seen(RequestKind::Replace), 0);
    scenario.assert_untouched().await;
}
