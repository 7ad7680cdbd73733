//! # ActorClient Trait
//!
//! Provides a common interface for resource-specific clients, adding default read and
//! delete methods built on top of a generic `ResourceClient`.
use crate::{ActorEntity, FrameworkError, ResourceClient, Versioned};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit standard operations.
///
/// Implementors supply the inner [`ResourceClient`] and a mapping from
/// [`FrameworkError`] into their own error type; `get`, `get_versioned`, `list` and
/// `delete` come for free.
///
/// ```text
/// #[async_trait]
/// impl ActorClient<Product> for ProductCatalog {
///     type Error = CatalogError;
///     fn inner(&self) -> &ResourceClient<Product> { &self.client }
///     fn map_error(e: FrameworkError) -> CatalogError { CatalogError::from(e) }
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch a record by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner()
            .get(id)
            .await
            .map(|found| found.map(Versioned::into_record))
            .map_err(Self::map_error)
    }

    /// Fetch a record by ID together with its revision.
    #[tracing::instrument(skip(self))]
    async fn get_versioned(&self, id: T::Id) -> Result<Option<Versioned<T>>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Fetch every record.
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner()
            .list()
            .await
            .map(|items| {
                items
                    .into_iter()
                    .map(|(_, item)| item.into_record())
                    .collect()
            })
            .map_err(Self::map_error)
    }

    /// Delete a record by ID.
    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: T::Id) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().delete(id).await.map_err(Self::map_error)
    }
}
