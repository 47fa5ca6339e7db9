//! # ResourceHandle Trait
//!
//! Shared read/delete plumbing for resource-specific clients built on a
//! [`ResourceClient`].
use crate::{FrameworkError, ResourceClient, ResourceEntity};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit the standard read and delete calls.
///
/// A wrapper supplies its inner client and an error mapping; `fetch`, `find` and
/// `remove` come for free and return the wrapper's own error type.
///
/// # Example
///
/// ```rust
/// use resource_framework::{FrameworkError, ResourceClient, ResourceEntity, ResourceHandle};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)]
/// struct Tag { id: u32 }
/// #[derive(Debug, thiserror::Error)]
/// #[error("tag error: {0}")]
/// struct TagError(String);
///
/// #[async_trait]
/// impl ResourceEntity for Tag {
///     type Id = u32; type Create = (); type Update = (); type Action = ();
///     type ActionResult = (); type Query = (); type Principal = (); type Context = ();
///     type Error = TagError;
///     fn from_create_params(id: u32, _: (), _: &()) -> Result<Self, TagError> { Ok(Self { id }) }
///     fn matches(&self, _: &(), _: &()) -> bool { true }
///     async fn on_update(&mut self, _: (), _: &(), _: &()) -> Result<(), TagError> { Ok(()) }
///     async fn handle_action(&mut self, _: (), _: &(), _: &()) -> Result<(), TagError> { Ok(()) }
/// }
///
/// struct TagClient { inner: ResourceClient<Tag> }
///
/// #[async_trait]
/// impl ResourceHandle<Tag> for TagClient {
///     type Error = TagError;
///     fn inner(&self) -> &ResourceClient<Tag> { &self.inner }
///     fn map_error(e: FrameworkError) -> TagError { TagError(e.to_string()) }
/// }
///
/// async fn usage(client: TagClient) {
///     let _ = client.fetch(1, ()).await;
///     let _ = client.remove(1, ()).await;
/// }
/// ```
#[async_trait]
pub trait ResourceHandle<T: ResourceEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic client.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by id; `None` when absent.
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, id: T::Id, principal: T::Principal) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id, principal).await.map_err(Self::map_error)
    }

    /// List the entities matching `query`.
    #[tracing::instrument(skip(self))]
    async fn find(&self, query: T::Query, principal: T::Principal) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list(query, principal).await.map_err(Self::map_error)
    }

    /// Delete an entity by id.
    #[tracing::instrument(skip(self))]
    async fn remove(&self, id: T::Id, principal: T::Principal) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().delete(id, principal).await.map_err(Self::map_error)
    }
}
