//! # Generic Client
//!
//! The sending half of a resource actor.

use crate::entity::ResourceEntity;
use crate::error::FrameworkError;
use crate::message::{ResourceRequest, Response};
use tokio::sync::{mpsc, oneshot};

/// A type-safe client for a `ResourceActor<T>`.
///
/// Holds only the channel sender, so clones are cheap and can be handed to other
/// actors as context. Every call names the principal it runs as.
pub struct ResourceClient<T: ResourceEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ResourceEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: ResourceEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(
        &self,
        params: T::Create,
        principal: T::Principal,
    ) -> Result<T, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Create {
            params,
            principal,
            respond_to,
        })
        .await
    }

    pub async fn get(
        &self,
        id: T::Id,
        principal: T::Principal,
    ) -> Result<Option<T>, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Get {
            id,
            principal,
            respond_to,
        })
        .await
    }

    pub async fn list(
        &self,
        query: T::Query,
        principal: T::Principal,
    ) -> Result<Vec<T>, FrameworkError> {
        self.call(|respond_to| ResourceRequest::List {
            query,
            principal,
            respond_to,
        })
        .await
    }

    pub async fn update(
        &self,
        id: T::Id,
        update: T::Update,
        principal: T::Principal,
    ) -> Result<T, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Update {
            id,
            update,
            principal,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: T::Id, principal: T::Principal) -> Result<(), FrameworkError> {
        self.call(|respond_to| ResourceRequest::Delete {
            id,
            principal,
            respond_to,
        })
        .await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
        principal: T::Principal,
    ) -> Result<T::ActionResult, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Action {
            id,
            action,
            principal,
            respond_to,
        })
        .await
    }
}
