//! # Order History
//!
//! Per-user log of placed orders plus the admin order view. Orders are only ever
//! appended (or retracted by the coordinator when a checkout cannot finish) and only
//! their status changes afterwards.
use crate::clients::retry::RetryPolicy;
use crate::clients::user_directory::{read_user, user_action};
use crate::config::StorefrontConfig;
use crate::model::{IdempotencyKey, Order, OrderId, OrderStatus, User, UserId};
use crate::user_actor::{HistoryCommand, UserAction, UserActionResult, UserError};
use resource_actor::ResourceClient;
use tracing::{debug, instrument, warn};

/// Client for users' order histories.
#[derive(Clone)]
pub struct OrderHistory {
    inner: ResourceClient<User>,
    retry: RetryPolicy,
}

impl OrderHistory {
    pub fn new(inner: ResourceClient<User>, config: &StorefrontConfig) -> Self {
        Self {
            inner,
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Records `order` in its user's history.
    ///
    /// Appending an order id that is already present is a no-op, so the call is retried
    /// on any transient failure. If the outcome stays unknown the history is re-read and
    /// the order id decides.
    #[instrument(skip(self, order), fields(user_id = %order.user_id(), order_id = %order.id()))]
    pub async fn append(&self, order: Order) -> Result<Order, UserError> {
        debug!("Sending request");
        let user_id = order.user_id();
        let order_id = order.id();
        let result = self
            .retry
            .run(|| self.command(user_id, HistoryCommand::Append(order.clone())))
            .await;
        match result {
            Ok(Some(stored)) => Ok(stored),
            Ok(None) => Ok(order),
            Err(e) if e.is_ambiguous() => {
                warn!(error = %e, "Append outcome unknown, re-reading");
                let user = read_user(&self.inner, &self.retry, user_id).await?;
                user.orders.get(order_id).cloned().ok_or(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Removes an order. Returns `None` if it was not recorded.
    #[instrument(skip(self))]
    pub async fn retract(&self, user_id: UserId, order_id: OrderId) -> Result<Option<Order>, UserError> {
        debug!("Sending request");
        let result = self
            .retry
            .run(|| self.command(user_id, HistoryCommand::Retract(order_id)))
            .await;
        match result {
            Ok(retracted) => Ok(retracted),
            Err(e) if e.is_ambiguous() => {
                warn!(error = %e, "Retract outcome unknown, re-reading");
                let user = read_user(&self.inner, &self.retry, user_id).await?;
                match user.orders.get(order_id) {
                    Some(_) => Err(e),
                    None => Ok(None),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// A user's orders, newest first.
    #[instrument(skip(self))]
    pub async fn orders(&self, user_id: UserId) -> Result<Vec<Order>, UserError> {
        let user = read_user(&self.inner, &self.retry, user_id).await?;
        Ok(user.orders.newest_first().cloned().collect())
    }

    /// The order a checkout with `key` produced, if any.
    #[instrument(skip(self))]
    pub async fn find_by_key(
        &self,
        user_id: UserId,
        key: IdempotencyKey,
    ) -> Result<Option<Order>, UserError> {
        let user = read_user(&self.inner, &self.retry, user_id).await?;
        Ok(user.orders.by_key(key).cloned())
    }

    /// Every user's orders, newest first.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>, UserError> {
        debug!("Sending request");
        let users = self
            .retry
            .run(|| async { self.inner.list().await.map_err(UserError::from) })
            .await?;
        let mut orders: Vec<Order> = users
            .into_iter()
            .flat_map(|(_, user)| user.into_record().orders.orders().to_vec())
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    /// Admin status change. Moving an order to the status it already has is a no-op.
    #[instrument(skip(self))]
    pub async fn transition_status(
        &self,
        user_id: UserId,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, UserError> {
        debug!("Sending request");
        self.retry
            .run(|| self.command(user_id, HistoryCommand::SetStatus { order_id, status }))
            .await?
            .ok_or_else(|| UserError::NotFound(order_id.to_string()))
    }

    async fn command(
        &self,
        user_id: UserId,
        command: HistoryCommand,
    ) -> Result<Option<Order>, UserError> {
        match user_action(&self.inner, user_id, UserAction::History(command)).await? {
            UserActionResult::History(order) => Ok(order),
            _ => unreachable!("History action must return History result"),
        }
    }
}
