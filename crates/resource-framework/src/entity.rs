//! # ResourceEntity Trait
//!
//! The contract every resource (user, product, order, …) implements to be hosted by a
//! [`ResourceActor`](crate::ResourceActor). Associated types pin down the id, the DTOs,
//! the custom actions, the list query, and the principal a request runs as, so a
//! product payload can never reach the order actor.
//!
//! # Principals
//!
//! Every request carries a `Principal` (who is calling). Hooks receive it so that the
//! entity itself decides what the caller may see or change. The framework never
//! interprets it.
//!
//! # Atomic hooks
//!
//! `on_update` and `handle_action` run against a clone of the stored entity. The clone
//! replaces the stored value only when the hook returns `Ok`, so a hook that fails half
//! way leaves the store untouched.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource entity must implement to be managed by a `ResourceActor`.
#[async_trait]
pub trait ResourceEntity: Clone + Send + Sync + 'static {
    /// Identifier; generated by the actor from a sequence number.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + From<u32>;

    /// Creation payload.
    type Create: Send + Sync + Debug;

    /// Update payload.
    type Update: Send + Sync + Debug;

    /// Resource-specific operations (e.g. `Ship`, `Promote`).
    type Action: Send + Sync + Debug;

    /// Result of a custom action.
    type ActionResult: Send + Sync + Debug;

    /// Filter used by `List` requests.
    type Query: Send + Sync + Debug;

    /// Who a request runs as.
    type Principal: Send + Sync + Debug + Clone;

    /// Dependencies injected at `run()` time. Use `()` when there are none.
    type Context: Send + Sync;

    /// Per-resource error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Builds the entity from its id and creation payload.
    fn from_create_params(
        id: Self::Id,
        params: Self::Create,
        principal: &Self::Principal,
    ) -> Result<Self, Self::Error>;

    /// Runs after construction and before the entity is stored.
    async fn on_create(
        &mut self,
        _principal: &Self::Principal,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Decides whether `principal` may read this entity through `Get`.
    fn authorize_read(&self, _principal: &Self::Principal) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Decides whether this entity belongs in the result of a `List` request.
    fn matches(&self, query: &Self::Query, principal: &Self::Principal) -> bool;

    /// Applies an update payload.
    async fn on_update(
        &mut self,
        update: Self::Update,
        principal: &Self::Principal,
        ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Runs before the entity is removed; an error vetoes the removal.
    async fn on_delete(
        &self,
        _principal: &Self::Principal,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles a custom action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        principal: &Self::Principal,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
