//! # Generic Messages
//!
//! Requests sent from a [`ResourceClient`](crate::ResourceClient) to a
//! [`ResourceActor`](crate::ResourceActor). Each variant carries the calling principal
//! and a oneshot sender for the reply.

use crate::entity::ResourceEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Message type sent to a resource actor.
///
/// The variants are the resource lifecycle (create, read, list, update, delete) plus
/// `Action` for everything that does not fit CRUD.
#[derive(Debug)]
pub enum ResourceRequest<T: ResourceEntity> {
    Create {
        params: T::Create,
        principal: T::Principal,
        respond_to: Response<T>,
    },
    Get {
        id: T::Id,
        principal: T::Principal,
        respond_to: Response<Option<T>>,
    },
    List {
        query: T::Query,
        principal: T::Principal,
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        principal: T::Principal,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        principal: T::Principal,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        principal: T::Principal,
        respond_to: Response<T::ActionResult>,
    },
}

impl<T: ResourceEntity> ResourceRequest<T> {
    /// Short name of the request kind, used in logs and mock diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceRequest::Create { .. } => "Create",
            ResourceRequest::Get { .. } => "Get",
            ResourceRequest::List { .. } => "List",
            ResourceRequest::Update { .. } => "Update",
            ResourceRequest::Delete { .. } => "Delete",
            ResourceRequest::Action { .. } => "Action",
        }
    }
}
