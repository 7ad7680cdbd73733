//! [`ActorEntity`] implementation for [`User`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use resource_actor::ActorEntity;
use tracing::warn;
use uuid::Uuid;

use super::actions::{
    CartCommand, HistoryCommand, LeaseOutcome, UserAction, UserActionResult, WishlistCommand,
};
use super::error::UserError;
use crate::model::{CheckoutLease, IdempotencyKey, User, UserCreate, UserId, UserUpdate};

fn validate_profile(name: &str, email: &str) -> Result<(), UserError> {
    if name.trim().is_empty() {
        return Err(UserError::InvalidProfile("name must not be empty".into()));
    }
    if !email.contains('@') {
        return Err(UserError::InvalidProfile(format!("invalid email: {email}")));
    }
    Ok(())
}

impl User {
    fn ensure_active(&self) -> Result<(), UserError> {
        if self.blocked {
            return Err(UserError::Blocked(self.id));
        }
        Ok(())
    }

    fn apply_cart(&mut self, command: CartCommand) -> Result<UserActionResult, UserError> {
        self.ensure_active()?;
        let removed = match command {
            CartCommand::Add(line) => {
                self.cart.add(line)?;
                Vec::new()
            }
            CartCommand::UpdateQuantity { key, quantity } => {
                self.cart.update_quantity(&key, quantity)?;
                Vec::new()
            }
            CartCommand::UpdateSize { key, size } => {
                self.cart.update_size(&key, size)?;
                Vec::new()
            }
            CartCommand::Remove(key) => vec![self.cart.remove(&key)?],
            CartCommand::Take(keys) => self.cart.take(&keys),
            CartCommand::Clear => {
                let keys: Vec<_> = self.cart.lines().iter().map(|l| l.key()).collect();
                self.cart.take(&keys)
            }
        };
        Ok(UserActionResult::Cart {
            cart: self.cart.clone(),
            removed,
        })
    }

    fn apply_wishlist(&mut self, command: WishlistCommand) -> Result<UserActionResult, UserError> {
        self.ensure_active()?;
        let changed = match command {
            WishlistCommand::Save(entry) => self.wishlist.save(entry),
            WishlistCommand::Remove(product_id) => self.wishlist.remove(product_id).is_some(),
            WishlistCommand::MoveToCart(line) => {
                self.wishlist
                    .remove(line.product_id())
                    .ok_or(UserError::NotInWishlist(line.product_id()))?;
                self.cart.add(line)?;
                true
            }
        };
        Ok(UserActionResult::Wishlist {
            wishlist: self.wishlist.clone(),
            changed,
        })
    }

    fn apply_history(&mut self, command: HistoryCommand) -> Result<UserActionResult, UserError> {
        let affected = match command {
            HistoryCommand::Append(order) => Some(self.orders.append(order).clone()),
            HistoryCommand::Retract(order_id) => self.orders.retract(order_id),
            HistoryCommand::SetStatus { order_id, status } => {
                Some(self.orders.set_status(order_id, status)?.clone())
            }
        };
        Ok(UserActionResult::History(affected))
    }

    fn begin_checkout(
        &mut self,
        key: IdempotencyKey,
        holder: Uuid,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<LeaseOutcome, UserError> {
        if let Some(order) = self.orders.by_key(key) {
            return Ok(LeaseOutcome::AlreadyCompleted(order.clone()));
        }
        self.ensure_active()?;

        if let Some(lease) = &self.checkout {
            if lease.holder != holder {
                if lease.is_active(now) {
                    return Ok(LeaseOutcome::InProgress {
                        key: lease.key,
                        expires_at: lease.expires_at,
                    });
                }
                warn!(user_id = %self.id, key = %lease.key, expired_at = %lease.expires_at, "Taking over expired checkout lease");
            }
        }

        self.checkout = Some(CheckoutLease {
            key,
            holder,
            expires_at: now + ttl,
        });
        Ok(LeaseOutcome::Acquired)
    }

    fn end_checkout(&mut self, holder: Uuid) -> bool {
        match &self.checkout {
            Some(lease) if lease.holder == holder => {
                self.checkout = None;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl ActorEntity for User {
    type Id = UserId;
    type Create = UserCreate;
    type Update = UserUpdate;
    type Action = UserAction;
    type ActionResult = UserActionResult;
    type Context = ();
    type Error = UserError;

    fn from_create_params(id: UserId, params: UserCreate) -> Result<Self, Self::Error> {
        validate_profile(&params.name, &params.email)?;
        Ok(Self::new(id, params.name, params.email))
    }

    async fn on_update(
        &mut self,
        update: UserUpdate,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        let name = update.name.unwrap_or_else(|| self.name.clone());
        let email = update.email.unwrap_or_else(|| self.email.clone());
        validate_profile(&name, &email)?;
        self.name = name;
        self.email = email;
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: UserAction,
        _ctx: &Self::Context,
    ) -> Result<UserActionResult, Self::Error> {
        match action {
            UserAction::Cart(command) => self.apply_cart(command),
            UserAction::Wishlist(command) => self.apply_wishlist(command),
            UserAction::History(command) => self.apply_history(command),
            UserAction::BeginCheckout {
                key,
                holder,
                now,
                ttl,
            } => Ok(UserActionResult::BeginCheckout(
                self.begin_checkout(key, holder, now, ttl)?,
            )),
            UserAction::EndCheckout { holder } => {
                Ok(UserActionResult::EndCheckout(self.end_checkout(holder)))
            }
            UserAction::SetBlocked(blocked) => {
                self.blocked = blocked;
                Ok(UserActionResult::SetBlocked(blocked))
            }
        }
    }
}
