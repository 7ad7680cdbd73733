//! # User Directory
//!
//! Account-level API for the `User` actor: registration, blocking and the per-user
//! checkout lease. Also hosts the two helpers every user-side client shares.
use crate::clients::retry::RetryPolicy;
use crate::config::StorefrontConfig;
use crate::model::{IdempotencyKey, User, UserCreate, UserId};
use crate::user_actor::{LeaseOutcome, UserAction, UserActionResult, UserError};
use async_trait::async_trait;
use chrono::Utc;
use resource_actor::{ActorClient, FrameworkError, ResourceClient};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Client for interacting with the User actor.
#[derive(Clone)]
pub struct UserDirectory {
    inner: ResourceClient<User>,
    retry: RetryPolicy,
}

#[async_trait]
impl ActorClient<User> for UserDirectory {
    type Error = UserError;

    fn inner(&self) -> &ResourceClient<User> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        UserError::from(e)
    }
}

impl UserDirectory {
    pub fn new(inner: ResourceClient<User>, config: &StorefrontConfig) -> Self {
        Self {
            inner,
            retry: RetryPolicy::from_config(config),
        }
    }

    #[instrument(skip(self, params), fields(email = %params.email))]
    pub async fn register_user(&self, params: UserCreate) -> Result<UserId, UserError> {
        debug!("Sending request");
        self.retry
            .run_at_most_once(|| async {
                self.inner
                    .create(params.clone())
                    .await
                    .map_err(UserError::from)
            })
            .await
    }

    /// The user record, or [`UserError::NotFound`].
    #[instrument(skip(self))]
    pub async fn user(&self, id: UserId) -> Result<User, UserError> {
        read_user(&self.inner, &self.retry, id).await
    }

    /// Blocks or unblocks an account. Blocked accounts cannot shop or check out.
    #[instrument(skip(self))]
    pub async fn set_blocked(&self, id: UserId, blocked: bool) -> Result<bool, UserError> {
        debug!("Sending request");
        match self
            .retry
            .run(|| user_action(&self.inner, id, UserAction::SetBlocked(blocked)))
            .await?
        {
            UserActionResult::SetBlocked(now) => Ok(now),
            _ => unreachable!("SetBlocked action must return SetBlocked result"),
        }
    }

    /// Claims the checkout lease for `holder`. Re-issuing it for the same holder is
    /// harmless, so transient failures are retried.
    #[instrument(skip(self))]
    pub async fn begin_checkout(
        &self,
        id: UserId,
        key: IdempotencyKey,
        holder: Uuid,
        ttl: chrono::Duration,
    ) -> Result<LeaseOutcome, UserError> {
        debug!("Sending request");
        let result = self
            .retry
            .run(|| {
                user_action(
                    &self.inner,
                    id,
                    UserAction::BeginCheckout {
                        key,
                        holder,
                        now: Utc::now(),
                        ttl,
                    },
                )
            })
            .await?;
        match result {
            UserActionResult::BeginCheckout(outcome) => Ok(outcome),
            _ => unreachable!("BeginCheckout action must return BeginCheckout result"),
        }
    }

    /// Releases the lease if `holder` still owns it.
    #[instrument(skip(self))]
    pub async fn end_checkout(&self, id: UserId, holder: Uuid) -> Result<bool, UserError> {
        debug!("Sending request");
        match self
            .retry
            .run(|| user_action(&self.inner, id, UserAction::EndCheckout { holder }))
            .await?
        {
            UserActionResult::EndCheckout(released) => Ok(released),
            _ => unreachable!("EndCheckout action must return EndCheckout result"),
        }
    }
}

pub(crate) async fn read_user(
    inner: &ResourceClient<User>,
    retry: &RetryPolicy,
    id: UserId,
) -> Result<User, UserError> {
    retry
        .run(|| async { inner.get(id).await.map_err(UserError::from) })
        .await?
        .map(|found| found.into_record())
        .ok_or_else(|| UserError::NotFound(id.to_string()))
}

pub(crate) async fn user_action(
    inner: &ResourceClient<User>,
    id: UserId,
    action: UserAction,
) -> Result<UserActionResult, UserError> {
    inner
        .perform_action(id, action)
        .await
        .map_err(UserError::from)
}
