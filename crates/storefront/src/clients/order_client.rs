//! # Order Client
//!
//! High-level API for the Order actor.
use super::Principal;
use crate::model::{Order, OrderDraft, OrderId};
use crate::order_actor::{OrderAction, OrderRejection};
use async_trait::async_trait;
use resource_framework::{FrameworkError, ResourceClient, ResourceHandle};
use tracing::{debug, instrument};

/// Client for interacting with the Order actor.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    /// Places an order for the principal. The actor reprices it and reserves stock.
    #[instrument(skip(self, draft))]
    pub async fn place_order(
        &self,
        draft: OrderDraft,
        principal: Principal,
    ) -> Result<Order, OrderRejection> {
        debug!(lines = draft.order_items.len(), "Sending request");
        self.inner
            .create(draft, principal)
            .await
            .map_err(Self::map_error)
    }

    /// Runs a lifecycle action and returns the updated order.
    #[instrument(skip(self))]
    pub async fn apply(
        &self,
        id: OrderId,
        action: OrderAction,
        principal: Principal,
    ) -> Result<Order, OrderRejection> {
        debug!("Sending request");
        self.inner
            .perform_action(id, action, principal)
            .await
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl ResourceHandle<Order> for OrderClient {
    type Error = OrderRejection;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> OrderRejection {
        if let Some(entity) = e.entity_error::<OrderRejection>() {
            return entity.clone();
        }
        match e {
            FrameworkError::NotFound(id) => OrderRejection::NotFound(id),
            other => OrderRejection::ActorCommunicationError(other.to_string()),
        }
    }
}
