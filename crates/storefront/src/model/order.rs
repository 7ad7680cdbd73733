//! Orders: price-frozen snapshots of a completed checkout.
//!
//! An [`Order`] is immutable after construction except for its [`OrderStatus`]. Line
//! prices, names and images are copied from the product records at reservation time and
//! the total is computed once, so later catalog edits never change a placed order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

use super::ids::{IdempotencyKey, OrderId, ProductId, UserId};
use super::product::Size;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// `pending → processing → shipped → delivered`, and `cancelled` from `pending` or
    /// `processing`. Staying in the same status is always allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        self == next
            || matches!(
                (self, next),
                (Pending, Processing)
                    | (Processing, Shipped)
                    | (Shipped, Delivered)
                    | (Pending, Cancelled)
                    | (Processing, Cancelled)
            )
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Recorded as a label only; no payment is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    /// Cash on delivery.
    Cod,
    Upi,
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cod => "cod",
            Self::Upi => "upi",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "cod" => Ok(Self::Cod),
            "upi" => Ok(Self::Upi),
            other => Err(OrderError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl ShippingInfo {
    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("fullName", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub size: Size,
    pub quantity: u32,
    pub unit_price_at_purchase: Decimal,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price_at_purchase * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    idempotency_key: IdempotencyKey,
    lines: Vec<OrderLine>,
    shipping_info: ShippingInfo,
    payment_method: PaymentMethod,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    status: OrderStatus,
}

impl Order {
    /// Builds a `pending` order; `total_amount` is the sum of the line totals.
    pub fn new(
        id: OrderId,
        user_id: UserId,
        idempotency_key: IdempotencyKey,
        lines: Vec<OrderLine>,
        shipping_info: ShippingInfo,
        payment_method: PaymentMethod,
        created_at: DateTime<Utc>,
    ) -> Self {
        let total_amount = lines.iter().map(OrderLine::line_total).sum();
        Self {
            id,
            user_id,
            idempotency_key,
            lines,
            shipping_info,
            payment_method,
            total_amount,
            created_at,
            status: OrderStatus::Pending,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn idempotency_key(&self) -> IdempotencyKey {
        self.idempotency_key
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn shipping_info(&self) -> &ShippingInfo {
        &self.shipping_info
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns `true` if the status changed.
    pub fn transition(&mut self, next: OrderStatus) -> Result<bool, OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        let changed = self.status != next;
        self.status = next;
        Ok(changed)
    }
}

/// A user's orders in the order they were placed. Append-only apart from status edits
/// and the retraction of an order whose checkout could not be finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderLog {
    orders: Vec<Order>,
}

impl OrderLog {
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().rev()
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn by_key(&self, key: IdempotencyKey) -> Option<&Order> {
        self.orders.iter().find(|o| o.idempotency_key == key)
    }

    /// Appends `order` unless an order with the same id is already present.
    /// Returns the stored order either way.
    pub fn append(&mut self, order: Order) -> &Order {
        let index = match self.orders.iter().position(|o| o.id == order.id) {
            Some(index) => index,
            None => {
                self.orders.push(order);
                self.orders.len() - 1
            }
        };
        &self.orders[index]
    }

    pub fn retract(&mut self, id: OrderId) -> Option<Order> {
        let index = self.orders.iter().position(|o| o.id == id)?;
        Some(self.orders.remove(index))
    }

    pub fn set_status(&mut self, id: OrderId, status: OrderStatus) -> Result<&Order, OrderError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(OrderError::NotFound(id))?;
        order.transition(status)?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn order(cents: &[(i64, u32)]) -> Order {
        let lines = cents
            .iter()
            .enumerate()
            .map(|(i, &(price, quantity))| OrderLine {
                product_id: ProductId(i as u32 + 1),
                name: format!("Kit {i}"),
                image: "kit.png".into(),
                size: Size::from("M"),
                quantity,
                unit_price_at_purchase: Decimal::new(price, 2),
            })
            .collect();
        Order::new(
            OrderId::new(),
            UserId(1),
            IdempotencyKey(Uuid::new_v4()),
            lines,
            ShippingInfo::default(),
            PaymentMethod::Cod,
            Utc::now(),
        )
    }

    #[test]
    fn test_total_is_sum_of_line_totals() {
        let order = order(&[(1999, 2), (500, 1)]);
        assert_eq!(order.total_amount(), Decimal::new(4498, 2));
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Delivered.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Cancelled.can_transition_to(Pending));

        let mut order = order(&[(100, 1)]);
        assert_eq!(order.transition(Pending), Ok(false));
        assert_eq!(order.transition(Processing), Ok(true));
        assert_eq!(
            order.transition(Delivered),
            Err(OrderError::InvalidStatusTransition {
                from: Processing,
                to: Delivered
            })
        );
    }

    #[test]
    fn test_missing_shipping_fields() {
        let mut info = ShippingInfo {
            full_name: "Asha".into(),
            email: " ".into(),
            ..Default::default()
        };
        assert_eq!(info.missing_fields(), vec!["email", "phone", "address"]);

        info.email = "asha@example.com".into();
        info.phone = "555-0100".into();
        info.address = "1 Loop Rd".into();
        assert!(info.missing_fields().is_empty());
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!("COD".parse::<PaymentMethod>(), Ok(PaymentMethod::Cod));
        assert_eq!(PaymentMethod::Upi.label(), "upi");
        assert!("cheque".parse::<PaymentMethod>().is_err());
        assert_eq!(serde_json::to_string(&PaymentMethod::Card).unwrap(), "\"card\"");
    }

    #[test]
    fn test_log_append_is_idempotent_by_id() {
        let mut log = OrderLog::default();
        let first = order(&[(100, 1)]);
        let second = order(&[(200, 1)]);

        log.append(first.clone());
        log.append(first.clone());
        log.append(second.clone());
        assert_eq!(log.orders().len(), 2);
        assert_eq!(log.newest_first().next().map(Order::id), Some(second.id()));
        assert_eq!(log.by_key(first.idempotency_key()), Some(&first));

        assert!(log.retract(first.id()).is_some());
        assert!(log.get(first.id()).is_none());
    }
}
