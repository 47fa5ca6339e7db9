//! # Resource Framework
//!
//! Building blocks for hosting stateful resources (users, products, orders) behind
//! Tokio actors. Each resource type gets one [`ResourceActor`] that owns its store and
//! handles requests sequentially, so entity state never needs a lock. Callers talk to
//! it through a cheap, cloneable [`ResourceClient`].
//!
//! ## Layers
//!
//! 1. **Entity** ([`ResourceEntity`]): the resource's data plus its business rules,
//!    written as hooks (`on_create`, `on_update`, `handle_action`, ...).
//! 2. **Runtime** ([`ResourceActor`]): message loop, id allocation, atomic commits.
//! 3. **Interface** ([`ResourceClient`], [`ResourceHandle`]): typed requests.
//!
//! ## Principals
//!
//! Every request names the principal it runs as. The framework passes it through to
//! the hooks untouched; the entity decides what that principal may read, list or change.
//!
//! ```rust
//! use resource_framework::{ResourceActor, ResourceEntity};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)]
//! struct Wish { id: u32, owner: String, item: String }
//!
//! #[derive(Debug, thiserror::Error)]
//! enum WishError {
//!     #[error("not yours")]
//!     Forbidden,
//! }
//!
//! #[async_trait]
//! impl ResourceEntity for Wish {
//!     type Id = u32;
//!     type Create = String;
//!     type Update = String;
//!     type Action = ();
//!     type ActionResult = ();
//!     type Query = ();
//!     type Principal = String;
//!     type Context = ();
//!     type Error = WishError;
//!
//!     fn from_create_params(id: u32, item: String, who: &String) -> Result<Self, WishError> {
//!         Ok(Self { id, owner: who.clone(), item })
//!     }
//!     fn authorize_read(&self, who: &String) -> Result<(), WishError> {
//!         if &self.owner == who { Ok(()) } else { Err(WishError::Forbidden) }
//!     }
//!     fn matches(&self, _: &(), who: &String) -> bool { &self.owner == who }
//!     async fn on_update(&mut self, item: String, who: &String, _: &()) -> Result<(), WishError> {
//!         self.authorize_read(who)?;
//!         self.item = item;
//!         Ok(())
//!     }
//!     async fn handle_action(&mut self, _: (), _: &String, _: &()) -> Result<(), WishError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = ResourceActor::<Wish>::new(10);
//!     tokio::spawn(actor.run(()));
//!
//!     let wish = client.create("bike".into(), "ana".into()).await.unwrap();
//!     assert!(client.get(wish.id, "bo".into()).await.is_err());
//!     assert_eq!(client.list((), "ana".into()).await.unwrap().len(), 1);
//!     assert!(client.list((), "bo".into()).await.unwrap().is_empty());
//! }
//! ```
//!
//! ## Context injection
//!
//! Dependencies arrive through `run(context)`, not `new()`. Create every actor first,
//! then start each one with the clients it needs; an order actor can hold the product
//! client and reserve stock from its `on_create` hook.
//!
//! ## Testing
//!
//! [`mock::MockClient`] answers requests from scripted expectations so client-side
//! logic can be tested without an actor.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ResourceHandle;
pub use entity::ResourceEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
