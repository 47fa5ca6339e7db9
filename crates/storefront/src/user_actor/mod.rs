//! # User Actor
//!
//! Accounts of the reference backend: the public profile, a password digest and the
//! bearer tokens issued to the account.
//!
//! - [`entity`]: [`ResourceEntity`](resource_framework::ResourceEntity) for [`Account`]
//! - [`actions`]: login, token issue and promotion
//! - [`error`]: [`UserError`]
//!
//! The actor has no dependencies, so it runs with `()` as its context.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use entity::*;
pub use error::*;

use crate::clients::UserClient;
use resource_framework::ResourceActor;

/// Creates the User actor and its client.
pub fn new() -> (ResourceActor<Account>, UserClient) {
    let (actor, generic_client) = ResourceActor::new(32);
    (actor, UserClient::new(generic_client))
}
