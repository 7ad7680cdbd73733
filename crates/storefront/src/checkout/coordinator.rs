//! # Order Coordinator
//!
//! Runs a checkout as a saga over independent record writes:
//!
//! 1. **Validating** - shape checks, then a [`StockValidator`] pre-check. Runs in the
//!    caller's task, so dropping the future here cancels for free.
//! 2. **Reserving** - per line, in request order, a compare-and-set decrement through
//!    [`ProductCatalog::reserve`]. On failure every reserved line is released again.
//! 3. **Committing** - the order is built from the records written during reservation
//!    and appended to the user's history. If that fails, stock is released.
//! 4. Lines that came from the cart are taken out of it. If that fails, the order is
//!    retracted and stock released.
//!
//! From step 2 on the saga runs on its own Tokio task and always reaches a terminal
//! state. A per-user checkout lease keeps two checkouts of the same user apart; the
//! lease check also replays an order that was already completed under the same
//! idempotency key.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn, Instrument, Span};
use uuid::Uuid;

use super::error::{CheckoutError, FailureStage, ValidationError};
use super::state::CheckoutState;
use super::validator::StockValidator;
use crate::clients::{CartStore, OrderHistory, ProductCatalog, UserDirectory};
use crate::config::StorefrontConfig;
use crate::model::{
    CartLine, IdempotencyKey, Order, OrderId, OrderLine, PaymentMethod, Product, ShippingInfo,
    UserId,
};
use crate::product_actor::ProductError;
use crate::user_actor::{LeaseOutcome, UserError};

/// Where the checked-out lines came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutSource {
    /// Lines are in the cart and are taken out of it on success.
    Cart,
    /// Lines came straight from a product page; the cart is not touched.
    BuyNow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub idempotency_key: IdempotencyKey,
    pub source: CheckoutSource,
}

impl CheckoutRequest {
    /// Checkout of `lines` from the user's cart, keyed by `client_request_id`.
    pub fn from_cart(
        user_id: UserId,
        lines: Vec<CartLine>,
        shipping: ShippingInfo,
        payment_method: PaymentMethod,
        client_request_id: u64,
    ) -> Self {
        Self {
            idempotency_key: IdempotencyKey::derive(&lines, client_request_id),
            user_id,
            lines,
            shipping,
            payment_method,
            source: CheckoutSource::Cart,
        }
    }

    /// Single-line "buy now" checkout that leaves the cart alone.
    pub fn buy_now(
        user_id: UserId,
        line: CartLine,
        shipping: ShippingInfo,
        payment_method: PaymentMethod,
        client_request_id: u64,
    ) -> Self {
        let lines = vec![line];
        Self {
            idempotency_key: IdempotencyKey::derive(&lines, client_request_id),
            user_id,
            lines,
            shipping,
            payment_method,
            source: CheckoutSource::BuyNow,
        }
    }

    fn check_shape(&self) -> Result<(), ValidationError> {
        if self.lines.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        let mut seen = HashSet::new();
        for line in &self.lines {
            if !seen.insert(line.key()) {
                return Err(ValidationError::DuplicateLine(line.key()));
            }
        }
        let missing = self.shipping.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingShippingField(
                missing.into_iter().map(String::from).collect(),
            ));
        }
        Ok(())
    }
}

/// Orchestrates checkouts against the catalog and the user records.
#[derive(Clone)]
pub struct OrderCoordinator {
    catalog: ProductCatalog,
    validator: StockValidator,
    users: UserDirectory,
    carts: CartStore,
    history: OrderHistory,
    lease_ttl: chrono::Duration,
}

impl OrderCoordinator {
    pub fn new(
        catalog: ProductCatalog,
        users: UserDirectory,
        carts: CartStore,
        history: OrderHistory,
        config: &StorefrontConfig,
    ) -> Self {
        Self {
            validator: StockValidator::new(catalog.clone()),
            catalog,
            users,
            carts,
            history,
            lease_ttl: config.lease_ttl(),
        }
    }

    pub fn validator(&self) -> &StockValidator {
        &self.validator
    }

    /// Places an order for `request.lines`, or fails having changed nothing.
    ///
    /// Resubmitting a request whose idempotency key already produced an order returns
    /// that order without touching stock.
    #[instrument(
        skip(self, request),
        fields(user_id = %request.user_id, key = %request.idempotency_key, lines = request.lines.len())
    )]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<Order, CheckoutError> {
        request.check_shape()?;

        let user = match self.users.user(request.user_id).await {
            Ok(user) => user,
            Err(UserError::NotFound(_)) => return Err(CheckoutError::UnknownUser(request.user_id)),
            Err(e) => {
                return Err(CheckoutError::PersistenceFailure {
                    stage: FailureStage::Validation,
                    reason: e.to_string(),
                    compensated: true,
                })
            }
        };
        if let Some(order) = user.orders.by_key(request.idempotency_key) {
            info!(order_id = %order.id(), "Replaying completed checkout");
            return Ok(order.clone());
        }
        if user.blocked {
            return Err(CheckoutError::AccountBlocked(user.id));
        }

        let state = CheckoutState::Validating;
        info!(%state, "Checkout started");
        let report = self.validator.validate(&request.lines).await?;
        if !report.is_ok() {
            let state = state.advance(CheckoutState::ValidationFailed)?;
            let rejections = report.rejections();
            info!(%state, rejected = rejections.len(), "Checkout rejected");
            return Err(ValidationError::Rejected(rejections).into());
        }

        let saga = Saga {
            coordinator: self.clone(),
            request,
            holder: Uuid::new_v4(),
            state,
            reserved: Vec::new(),
            landed: None,
        };
        tokio::spawn(saga.run().instrument(Span::current()))
            .await
            .map_err(|e| {
                error!(error = %e, "Checkout task died");
                CheckoutError::PersistenceFailure {
                    stage: FailureStage::Reservation,
                    reason: format!("checkout task failed: {e}"),
                    compensated: false,
                }
            })?
    }
}

/// A line whose stock has been taken, with the product as written.
struct Reserved {
    line: CartLine,
    snapshot: Product,
}

struct Saga {
    coordinator: OrderCoordinator,
    request: CheckoutRequest,
    holder: Uuid,
    state: CheckoutState,
    reserved: Vec<Reserved>,
    /// A failed reservation whose write was confirmed by tag. It is released, never ordered.
    landed: Option<CartLine>,
}

impl Saga {
    async fn run(mut self) -> Result<Order, CheckoutError> {
        if let Some(order) = self.acquire_lease().await? {
            return Ok(order);
        }
        let result = self.reserve_and_commit().await;
        self.release_lease().await;
        result
    }

    fn advance(&mut self, next: CheckoutState) -> Result<(), CheckoutError> {
        self.state = self.state.advance(next)?;
        info!(state = %self.state, "Checkout state changed");
        Ok(())
    }

    /// `Some(order)` if this key already completed.
    async fn acquire_lease(&self) -> Result<Option<Order>, CheckoutError> {
        let request = &self.request;
        let outcome = self
            .coordinator
            .users
            .begin_checkout(
                request.user_id,
                request.idempotency_key,
                self.holder,
                self.coordinator.lease_ttl,
            )
            .await;
        match outcome {
            Ok(LeaseOutcome::Acquired) => {
                debug!(holder = %self.holder, "Checkout lease acquired");
                Ok(None)
            }
            Ok(LeaseOutcome::AlreadyCompleted(order)) => {
                info!(order_id = %order.id(), "Replaying completed checkout");
                Ok(Some(order))
            }
            Ok(LeaseOutcome::InProgress { key, expires_at }) => {
                info!(other_key = %key, %expires_at, "Another checkout holds the lease");
                Err(CheckoutError::CheckoutInProgress(request.user_id))
            }
            Err(UserError::Blocked(id)) => Err(CheckoutError::AccountBlocked(id)),
            Err(UserError::NotFound(_)) => Err(CheckoutError::UnknownUser(request.user_id)),
            Err(e) => {
                if e.is_ambiguous() {
                    self.release_lease().await;
                }
                Err(CheckoutError::PersistenceFailure {
                    stage: FailureStage::Lease,
                    reason: e.to_string(),
                    compensated: true,
                })
            }
        }
    }

    async fn release_lease(&self) {
        match self
            .coordinator
            .users
            .end_checkout(self.request.user_id, self.holder)
            .await
        {
            Ok(true) => debug!(holder = %self.holder, "Checkout lease released"),
            Ok(false) => debug!(holder = %self.holder, "Checkout lease already gone"),
            Err(e) => warn!(error = %e, "Could not release checkout lease; it will expire"),
        }
    }

    async fn reserve_and_commit(&mut self) -> Result<Order, CheckoutError> {
        self.advance(CheckoutState::Reserving)?;
        let lines = self.request.lines.clone();
        for line in &lines {
            match self.coordinator.catalog.reserve(line).await {
                Ok(snapshot) => self.reserved.push(Reserved {
                    line: line.clone(),
                    snapshot,
                }),
                Err(e) => return Err(self.abort_reservation(line, e).await),
            }
        }

        self.advance(CheckoutState::Committing)?;
        let user_id = self.request.user_id;
        let order = self.build_order();
        let order_id = order.id();
        let order = match self.coordinator.history.append(order).await {
            Ok(order) => order,
            Err(e) => {
                // An append with an unknown outcome may have landed
                let retracted = !e.is_ambiguous() || self.retract(order_id).await;
                return Err(self
                    .abort_commit(FailureStage::Commit, e.to_string(), retracted, true)
                    .await);
            }
        };

        if self.request.source == CheckoutSource::Cart {
            let keys = lines.iter().map(CartLine::key).collect();
            if let Err(e) = self.coordinator.carts.take(user_id, keys).await {
                let retracted = self.retract(order_id).await;
                return Err(self
                    .abort_commit(
                        FailureStage::CartRemoval,
                        e.to_string(),
                        retracted,
                        !e.is_ambiguous(),
                    )
                    .await);
            }
        }

        self.advance(CheckoutState::Completed)?;
        info!(%order_id, total = %order.total_amount(), "Checkout completed");
        Ok(order)
    }

    fn build_order(&self) -> Order {
        let lines = self
            .reserved
            .iter()
            .map(|reserved| OrderLine {
                product_id: reserved.snapshot.id,
                name: reserved.snapshot.name.clone(),
                image: reserved.snapshot.image.clone(),
                size: reserved.line.size().clone(),
                quantity: reserved.line.quantity(),
                unit_price_at_purchase: reserved.snapshot.price,
            })
            .collect();
        Order::new(
            OrderId::new(),
            self.request.user_id,
            self.request.idempotency_key,
            lines,
            self.request.shipping.clone(),
            self.request.payment_method,
            Utc::now(),
        )
    }

    /// Undo the reservations made so far and describe why `line` failed.
    async fn abort_reservation(&mut self, line: &CartLine, cause: ProductError) -> CheckoutError {
        let mut resolved = true;
        if let ProductError::Unresolved { product_id, tag } = &cause {
            match self.coordinator.catalog.was_applied(*product_id, *tag).await {
                Ok(true) => self.landed = Some(line.clone()),
                Ok(false) => {}
                Err(e) => {
                    error!(%product_id, %tag, error = %e, "Reservation outcome still unknown");
                    resolved = false;
                }
            }
        }

        let partial = self.held();
        let compensated = self.compensate().await && resolved;
        if let Err(e) = self.advance(CheckoutState::ReservationFailed { partial }) {
            return e;
        }

        if !compensated {
            return CheckoutError::PersistenceFailure {
                stage: FailureStage::Reservation,
                reason: cause.to_string(),
                compensated: false,
            };
        }
        let requested = line.quantity();
        match cause {
            ProductError::InsufficientStock {
                product_id,
                size,
                requested,
                available,
            } => {
                info!(%product_id, %size, requested, available, "Lost stock race");
                CheckoutError::ReservationConflict {
                    product_id,
                    size,
                    requested,
                    available,
                }
            }
            ProductError::UnknownSize { product_id, size } => CheckoutError::ReservationConflict {
                product_id,
                size,
                requested,
                available: 0,
            },
            ProductError::NotFound(_) => CheckoutError::ReservationConflict {
                product_id: line.product_id(),
                size: line.size().clone(),
                requested,
                available: 0,
            },
            ProductError::NegativeStock {
                product_id,
                size,
                quantity,
            } => {
                error!(%product_id, %size, quantity, "Negative stock counter");
                CheckoutError::InvariantViolation {
                    product_id,
                    size,
                    quantity,
                }
            }
            other => CheckoutError::PersistenceFailure {
                stage: FailureStage::Reservation,
                reason: other.to_string(),
                compensated: true,
            },
        }
    }

    /// Undo the reservations after a failed commit. Stock is only released when the
    /// order is known not to be recorded.
    async fn abort_commit(
        &mut self,
        stage: FailureStage,
        reason: String,
        retracted: bool,
        cart_intact: bool,
    ) -> CheckoutError {
        let partial = self.held();
        let compensated = if retracted {
            self.compensate().await && cart_intact
        } else {
            error!(%stage, "Order may be recorded; keeping its stock reserved");
            false
        };
        if let Err(e) = self.advance(CheckoutState::CommitFailed { partial }) {
            return e;
        }
        if !compensated {
            error!(%stage, %reason, "Checkout failed and could not be fully undone");
        }
        CheckoutError::PersistenceFailure {
            stage,
            reason,
            compensated,
        }
    }

    async fn retract(&self, order_id: OrderId) -> bool {
        match self
            .coordinator
            .history
            .retract(self.request.user_id, order_id)
            .await
        {
            Ok(_) => {
                warn!(%order_id, "Order retracted");
                true
            }
            Err(e) => {
                error!(%order_id, error = %e, "Could not retract order");
                false
            }
        }
    }

    /// Lines whose stock is currently taken by this checkout.
    fn held(&self) -> usize {
        self.reserved.len() + usize::from(self.landed.is_some())
    }

    /// Releases every held line, newest first. Returns `false` if any release failed.
    async fn compensate(&mut self) -> bool {
        let held: Vec<CartLine> = self
            .landed
            .take()
            .into_iter()
            .chain(self.reserved.drain(..).rev().map(|reserved| reserved.line))
            .collect();
        let mut all_released = true;
        for line in &held {
            warn!(
                product_id = %line.product_id(),
                size = %line.size(),
                quantity = line.quantity(),
                "Releasing reserved stock"
            );
            if let Err(e) = self.coordinator.catalog.release(line).await {
                error!(
                    product_id = %line.product_id(),
                    size = %line.size(),
                    quantity = line.quantity(),
                    error = %e,
                    "Could not release reserved stock"
                );
                all_released = false;
            }
        }
        all_released
    }
}
