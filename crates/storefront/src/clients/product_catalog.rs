//! # Product Catalog
//!
//! High-level API for the `Product` actor: admin edits, stock reads and the conditional
//! stock writes the checkout coordinator relies on.
//!
//! [`reserve`](ProductCatalog::reserve) and [`release`](ProductCatalog::release) are
//! compare-and-set loops. Each attempt reads the product at revision `r`, computes the
//! new counter and replaces the record only if it is still at `r`. Every attempt carries
//! a [`WriteTag`]; when an attempt fails ambiguously the product is re-read and the tag
//! decides whether the write landed.
//!
//! A reservation gives up after `reservation_max_attempts` attempts of any kind. A
//! release only puts units back, so a lost race never counts against it; only refused
//! or lost writes do.

use crate::clients::retry::RetryPolicy;
use crate::config::StorefrontConfig;
use crate::model::{CartLine, Product, ProductCreate, ProductId, ProductUpdate, Size};
use crate::product_actor::{ProductAction, ProductActionResult, ProductError};
use async_trait::async_trait;
use resource_actor::{ActorClient, FrameworkError, ResourceClient, Versioned, WriteTag};
use tracing::{debug, error, info, instrument, warn};

/// Client for interacting with the Product actor.
#[derive(Clone)]
pub struct ProductCatalog {
    inner: ResourceClient<Product>,
    retry: RetryPolicy,
    max_cas_attempts: u32,
}

#[async_trait]
impl ActorClient<Product> for ProductCatalog {
    type Error = ProductError;

    fn inner(&self) -> &ResourceClient<Product> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        ProductError::from(e)
    }
}

impl ProductCatalog {
    pub fn new(inner: ResourceClient<Product>, config: &StorefrontConfig) -> Self {
        Self {
            inner,
            retry: RetryPolicy::from_config(config),
            max_cas_attempts: config.reservation_max_attempts.max(1),
        }
    }

    // -------------------------------------------------------------------------
    // Admin operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, params), fields(name = %params.name))]
    pub async fn create_product(&self, params: ProductCreate) -> Result<ProductId, ProductError> {
        debug!("Sending request");
        self.retry
            .run_at_most_once(|| async {
                self.inner
                    .create(params.clone())
                    .await
                    .map_err(ProductError::from)
            })
            .await
    }

    /// Edits name, image, price or the whole size map.
    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, ProductError> {
        debug!("Sending request");
        self.retry
            .run(|| async {
                self.inner
                    .update(id, update.clone())
                    .await
                    .map(Versioned::into_record)
                    .map_err(ProductError::from)
            })
            .await
    }

    /// Sets one size's counter to an absolute value.
    #[instrument(skip(self))]
    pub async fn set_stock(
        &self,
        id: ProductId,
        size: Size,
        quantity: i64,
    ) -> Result<i64, ProductError> {
        debug!("Sending request");
        let action = ProductAction::SetStock { size, quantity };
        match self.retry.run(|| self.act(id, action.clone())).await? {
            ProductActionResult::SetStock(level) => Ok(level),
            _ => unreachable!("SetStock action must return SetStock result"),
        }
    }

    /// Adds to one size's counter. Returns the new level.
    #[instrument(skip(self))]
    pub async fn restock(
        &self,
        id: ProductId,
        size: Size,
        quantity: i64,
    ) -> Result<i64, ProductError> {
        debug!("Sending request");
        let action = ProductAction::Restock { size, quantity };
        match self.retry.run_at_most_once(|| self.act(id, action.clone())).await? {
            ProductActionResult::Restock(level) => Ok(level),
            _ => unreachable!("Restock action must return Restock result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ProductError> {
        debug!("Sending request");
        self.retry
            .run(|| async { ActorClient::delete(self, id).await })
            .await
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, ProductError> {
        Ok(self.read(id).await?.map(Versioned::into_record))
    }

    /// Every product, ordered by id.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ProductError> {
        let mut products = self.retry.run(|| ActorClient::list(self)).await?;
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    /// Check the current stock level for one size of a product.
    #[instrument(skip(self))]
    pub async fn check_stock(&self, id: ProductId, size: Size) -> Result<i64, ProductError> {
        debug!("Checking stock for {} size {}", id, size);
        let action = ProductAction::CheckStock(size);
        match self.retry.run(|| self.act(id, action.clone())).await? {
            ProductActionResult::CheckStock(level) => Ok(level),
            _ => unreachable!("CheckStock action must return CheckStock result"),
        }
    }

    /// Re-reads the product and reports whether the write tagged `tag` has landed.
    #[instrument(skip(self))]
    pub async fn was_applied(&self, id: ProductId, tag: WriteTag) -> Result<bool, ProductError> {
        Ok(self
            .read(id)
            .await?
            .is_some_and(|current| current.applied(tag)))
    }

    // -------------------------------------------------------------------------
    // Conditional stock writes
    // -------------------------------------------------------------------------

    /// Takes `line.quantity()` units of `line.size()` out of stock.
    ///
    /// Returns the product as written, which is the snapshot an order line is priced
    /// from. Fails with [`ProductError::InsufficientStock`] if a fresh read shows too
    /// few units, and never writes a negative counter. [`ProductError::Unresolved`]
    /// carries the tag to check with [`was_applied`](Self::was_applied) later.
    #[instrument(skip(self, line), fields(product_id = %line.product_id(), size = %line.size(), quantity = line.quantity()))]
    pub async fn reserve(&self, line: &CartLine) -> Result<Product, ProductError> {
        let requested = i64::from(line.quantity());
        self.conditional_write(line.product_id(), "reserve", Contention::GiveUp, |current| {
            let size = line.size();
            let available = current.stock_for(size).ok_or_else(|| unknown_size(current, size))?;
            if available < 0 {
                return Err(ProductError::NegativeStock {
                    product_id: current.id,
                    size: size.clone(),
                    quantity: available,
                });
            }
            if available < requested {
                return Err(ProductError::InsufficientStock {
                    product_id: current.id,
                    size: size.clone(),
                    requested: line.quantity(),
                    available,
                });
            }
            current.with_stock_delta(size, -requested)
        })
        .await
    }

    /// Puts `line.quantity()` units of `line.size()` back into stock.
    ///
    /// Keeps retrying while other writers win the race for the record.
    #[instrument(skip(self, line), fields(product_id = %line.product_id(), size = %line.size(), quantity = line.quantity()))]
    pub async fn release(&self, line: &CartLine) -> Result<Product, ProductError> {
        let returned = i64::from(line.quantity());
        self.conditional_write(line.product_id(), "release", Contention::Persist, |current| {
            current.with_stock_delta(line.size(), returned)
        })
        .await
    }

    /// Read-compute-replace loop shared by [`reserve`](Self::reserve) and
    /// [`release`](Self::release).
    async fn conditional_write(
        &self,
        id: ProductId,
        op: &'static str,
        contention: Contention,
        next: impl Fn(&Product) -> Result<Product, ProductError>,
    ) -> Result<Product, ProductError> {
        let mut last_failure = None;
        let mut attempt = 0u32;
        let mut spent = 0u32;
        while spent < self.max_cas_attempts {
            attempt = attempt.saturating_add(1);
            let current = self
                .read(id)
                .await?
                .ok_or_else(|| ProductError::NotFound(id.to_string()))?;
            let revision = current.revision();
            let record = next(current.record())?;

            let tag = WriteTag::new();
            match self.inner.replace(id, revision, record.clone(), tag).await {
                Ok(written) => {
                    info!(%id, op, revision = written, attempt, "Stock written");
                    return Ok(record);
                }
                Err(FrameworkError::RevisionConflict { actual, .. }) => {
                    debug!(%id, op, expected = revision, actual, attempt, "Lost compare-and-set race");
                    if contention == Contention::Persist {
                        continue;
                    }
                    last_failure = None;
                }
                Err(e) if e.is_ambiguous() => {
                    warn!(%id, op, %tag, error = %e, "Stock write outcome unknown, re-reading");
                    match self.was_applied(id, tag).await {
                        Ok(true) => {
                            info!(%id, op, %tag, attempt, "Stock write had landed");
                            return Ok(record);
                        }
                        Ok(false) => last_failure = Some(ProductError::from(e)),
                        Err(read_error) => {
                            error!(%id, op, %tag, error = %read_error, "Cannot tell whether stock write landed");
                            return Err(ProductError::Unresolved { product_id: id, tag });
                        }
                    }
                }
                Err(e) if e.is_transient() => {
                    debug!(%id, op, error = %e, attempt, "Stock write refused");
                    last_failure = Some(ProductError::from(e));
                    self.retry.pause(spent + 1).await;
                }
                Err(e) => return Err(ProductError::from(e)),
            }
            spent += 1;
        }

        // Every failure above was resolved as "not applied"
        Err(match last_failure {
            Some(ProductError::ActorCommunicationError { reason, .. }) => {
                ProductError::ActorCommunicationError {
                    reason,
                    ambiguous: false,
                    transient: true,
                }
            }
            _ => ProductError::Contended {
                product_id: id,
                attempts: self.max_cas_attempts,
            },
        })
    }

    async fn read(&self, id: ProductId) -> Result<Option<Versioned<Product>>, ProductError> {
        self.retry.run(|| self.get_versioned(id)).await
    }

    async fn act(
        &self,
        id: ProductId,
        action: ProductAction,
    ) -> Result<ProductActionResult, ProductError> {
        self.inner
            .perform_action(id, action)
            .await
            .map_err(ProductError::from)
    }
}

/// How a conditional write treats lost compare-and-set races.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contention {
    /// Races count against the attempt limit.
    GiveUp,
    /// Races are retried until the write lands.
    Persist,
}

fn unknown_size(product: &Product, size: &Size) -> ProductError {
    ProductError::UnknownSize {
        product_id: product.id,
        size: size.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SizeStock;
    use resource_actor::mock::{
        create_mock_client, expect_action, expect_get, expect_replace, Fault, FaultProxy,
    };
    use resource_actor::{RequestKind, ResourceActor, ResourceRequest};
    use rust_decimal::Decimal;

    fn catalog(client: ResourceClient<Product>) -> ProductCatalog {
        let config = StorefrontConfig {
            retry_backoff: std::time::Duration::ZERO,
            ..Default::default()
        };
        ProductCatalog::new(client, &config)
    }

    fn shirt(m: i64) -> Product {
        Product::new(
            ProductId(1),
            "Shirt",
            "shirt.png",
            Decimal::new(2500, 2),
            SizeStock::from([(Size::from("M"), m)]),
        )
    }

    fn line(quantity: u32) -> CartLine {
        CartLine::new(ProductId(1), Size::from("M"), quantity).unwrap()
    }

    #[tokio::test]
    async fn test_check_stock_returns_correct_level() {
        let (client, mut receiver) = create_mock_client::<Product>(10);
        let catalog = catalog(client);

        let check_task =
            tokio::spawn(async move { catalog.check_stock(ProductId(1), Size::from("m")).await });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, ProductId(1));
        assert!(matches!(action, ProductAction::CheckStock(ref s) if s.as_str() == "M"));
        responder
            .send(Ok(ProductActionResult::CheckStock(42)))
            .unwrap();

        assert_eq!(check_task.await.unwrap().unwrap(), 42);
    }

    #[tokio::test]
    async fn test_reserve_retries_after_revision_conflict() {
        let (client, mut receiver) = create_mock_client::<Product>(10);
        let catalog = catalog(client);
        let reserve_task = tokio::spawn(async move { catalog.reserve(&line(2)).await });

        let (_, responder) = expect_get(&mut receiver).await.unwrap();
        responder.send(Ok(Some(Versioned::new(4, shirt(5))))).unwrap();
        let first = expect_replace(&mut receiver).await.unwrap();
        assert_eq!(first.expected, 4);
        first
            .respond_to
            .send(Err(FrameworkError::RevisionConflict {
                id: "product_1".into(),
                expected: 4,
                actual: 5,
            }))
            .unwrap();

        // Someone else took one unit in between
        let (_, responder) = expect_get(&mut receiver).await.unwrap();
        responder.send(Ok(Some(Versioned::new(5, shirt(4))))).unwrap();
        let second = expect_replace(&mut receiver).await.unwrap();
        assert_eq!(second.expected, 5);
        assert_eq!(second.record.stock_for(&Size::from("M")), Some(2));
        second.respond_to.send(Ok(6)).unwrap();

        let written = reserve_task.await.unwrap().unwrap();
        assert_eq!(written.aggregate_stock, 2);
    }

    /// Answers one read at `revision` and rejects the write that follows as stale.
    async fn lose_race(
        receiver: &mut tokio::sync::mpsc::Receiver<ResourceRequest<Product>>,
        revision: u64,
        record: Product,
    ) {
        let (_, responder) = expect_get(receiver).await.unwrap();
        responder.send(Ok(Some(Versioned::new(revision, record)))).unwrap();
        let replace = expect_replace(receiver).await.unwrap();
        replace
            .respond_to
            .send(Err(FrameworkError::RevisionConflict {
                id: "product_1".into(),
                expected: revision,
                actual: revision + 1,
            }))
            .unwrap();
    }

    #[tokio::test]
    async fn test_reserve_gives_up_after_max_attempts() {
        let (client, mut receiver) = create_mock_client::<Product>(10);
        let catalog = catalog(client);
        let reserve_task = tokio::spawn(async move { catalog.reserve(&line(1)).await });

        for revision in 1..=8 {
            lose_race(&mut receiver, revision, shirt(5)).await;
        }

        assert_eq!(
            reserve_task.await.unwrap(),
            Err(ProductError::Contended {
                product_id: ProductId(1),
                attempts: 8,
            })
        );
    }

    #[tokio::test]
    async fn test_release_outlasts_contention() {
        let (client, mut receiver) = create_mock_client::<Product>(10);
        let catalog = catalog(client);
        let release_task = tokio::spawn(async move { catalog.release(&line(2)).await });

        // Three times the reservation limit of lost races
        for revision in 1..=24 {
            lose_race(&mut receiver, revision, shirt(0)).await;
        }
        let (_, responder) = expect_get(&mut receiver).await.unwrap();
        responder.send(Ok(Some(Versioned::new(25, shirt(0))))).unwrap();
        let last = expect_replace(&mut receiver).await.unwrap();
        assert_eq!(last.record.stock_for(&Size::from("M")), Some(2));
        last.respond_to.send(Ok(26)).unwrap();

        let written = release_task.await.unwrap().unwrap();
        assert_eq!(written.aggregate_stock, 2);
    }

    #[tokio::test]
    async fn test_reserve_resolves_ambiguous_writes_by_tag() {
        let (actor, upstream) = ResourceActor::<Product>::new(10);
        tokio::spawn(actor.run(()));
        let (proxy, client) = FaultProxy::spawn(upstream);
        let catalog = catalog(client);
        let id = catalog
            .create_product(ProductCreate {
                name: "Shirt".into(),
                image: "shirt.png".into(),
                price: Decimal::new(2500, 2),
                sizes: SizeStock::from([(Size::from("M"), 3)]),
            })
            .await
            .unwrap();

        // Applied but unanswered: the re-read finds the tag, no second write
        proxy.fail_nth(RequestKind::Replace, 1, Fault::DropReply);
        let written = catalog.reserve(&line(1)).await.unwrap();
        assert_eq!(written.stock_for(&Size::from("M")), Some(2));
        assert_eq!(proxy.seen(RequestKind::Replace), 1);

        // Lost before reaching the actor: the re-read shows nothing, so it is retried
        proxy.fail_nth(RequestKind::Replace, 1, Fault::Lose);
        catalog.reserve(&line(1)).await.unwrap();
        assert_eq!(proxy.seen(RequestKind::Replace), 3);

        assert_eq!(catalog.check_stock(id, Size::from("M")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reserve_rejects_insufficient_stock_without_writing() {
        let (client, mut receiver) = create_mock_client::<Product>(10);
        let catalog = catalog(client);
        let reserve_task = tokio::spawn(async move { catalog.reserve(&line(3)).await });

        let (_, responder) = expect_get(&mut receiver).await.unwrap();
        responder.send(Ok(Some(Versioned::new(1, shirt(2))))).unwrap();

        assert_eq!(
            reserve_task.await.unwrap(),
            Err(ProductError::InsufficientStock {
                product_id: ProductId(1),
                size: Size::from("M"),
                requested: 3,
                available: 2,
            })
        );
        assert!(receiver.try_recv().is_err());
    }
}
