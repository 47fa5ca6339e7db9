//! # Application Lifecycle
//!
//! Starting, wiring and stopping the storefront.
//!
//! - [`config`]: flags and `STOREFRONT_*` environment variables.
//! - [`backend`]: the in-process reference backend. Its three actors are created
//!   first and wired afterwards: the Order actor gets the User and Product clients
//!   as its `run()` context, which keeps construction free of cycles.
//! - [`storefront`]: the application container. There are no globals; the stores
//!   live in a [`Storefront`] value and share one API handle and one storage.
//! - [`tracing`]: the `tracing` subscriber.
//!
//! ## Shutdown
//!
//! Actors stop when the last sender of their channel is dropped. The dependency
//! graph is acyclic (orders depend on users and products, nothing depends on
//! orders), so dropping the storefront's stores, then the backend's own clients, lets
//! the Order actor stop first and release its context, after which the User and
//! Product actors stop as well. [`Storefront::shutdown`] does this in order and
//! awaits every actor task.

pub mod backend;
pub mod config;
pub mod storefront;
pub mod tracing;

pub use self::tracing::*;
pub use backend::*;
pub use config::*;
pub use storefront::*;

use crate::api::ApiError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Actor task failed: {0}")]
    ActorTask(#[from] tokio::task::JoinError),
}
