//! # Product Client
//!
//! High-level API for the Product actor. Stock calls run as the system; they are
//! issued by the order actor while it places or cancels orders.
use super::Principal;
use crate::model::{Product, ProductDraft, ProductId, ProductUpdate, UserId};
use crate::product_actor::{ProductAction, ProductActionResult, ProductError};
use async_trait::async_trait;
use resource_framework::{FrameworkError, ResourceClient, ResourceHandle};
use tracing::{debug, instrument};

/// Client for interacting with the Product actor.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
}

impl ProductClient {
    pub fn new(inner: ResourceClient<Product>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        draft: ProductDraft,
        principal: Principal,
    ) -> Result<Product, ProductError> {
        debug!("Sending request");
        self.inner
            .create(draft, principal)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
        principal: Principal,
    ) -> Result<Product, ProductError> {
        debug!("Sending request");
        self.inner
            .update(id, update, principal)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn check_stock(&self, id: ProductId) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self.action(id, ProductAction::CheckStock, Principal::System).await? {
            ProductActionResult::CheckStock(level) => Ok(level),
            other => Err(unexpected(other)),
        }
    }

    /// Takes `quantity` out of stock and returns what is left.
    #[instrument(skip(self))]
    pub async fn reserve_stock(&self, id: ProductId, quantity: u32) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self
            .action(id, ProductAction::ReserveStock(quantity), Principal::System)
            .await?
        {
            ProductActionResult::ReserveStock(remaining) => Ok(remaining),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn release_stock(&self, id: ProductId, quantity: u32) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self
            .action(id, ProductAction::ReleaseStock(quantity), Principal::System)
            .await?
        {
            ProductActionResult::ReleaseStock(level) => Ok(level),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, comment))]
    pub async fn add_review(
        &self,
        id: ProductId,
        author: UserId,
        name: String,
        rating: u8,
        comment: String,
        principal: Principal,
    ) -> Result<Product, ProductError> {
        debug!("Sending request");
        let action = ProductAction::AddReview {
            author,
            name,
            rating,
            comment,
        };
        match self.action(id, action, principal).await? {
            ProductActionResult::AddReview(product) => Ok(product),
            other => Err(unexpected(other)),
        }
    }

    async fn action(
        &self,
        id: ProductId,
        action: ProductAction,
        principal: Principal,
    ) -> Result<ProductActionResult, ProductError> {
        self.inner
            .perform_action(id, action, principal)
            .await
            .map_err(Self::map_error)
    }
}

fn unexpected(result: ProductActionResult) -> ProductError {
    ProductError::ActorCommunicationError(format!("unexpected action result: {result:?}"))
}

#[async_trait]
impl ResourceHandle<Product> for ProductClient {
    type Error = ProductError;

    fn inner(&self) -> &ResourceClient<Product> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> ProductError {
        if let Some(entity) = e.entity_error::<ProductError>() {
            return entity.clone();
        }
        match e {
            FrameworkError::NotFound(id) => ProductError::NotFound(id),
            other => ProductError::ActorCommunicationError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::mock::{create_mock_client, expect_action, MockClient};

    #[tokio::test]
    async fn reserve_stock_returns_remaining_level() {
        let (client, mut receiver) = create_mock_client::<Product>(8);
        let client = ProductClient::new(client);

        let reserve =
            tokio::spawn(async move { client.reserve_stock(ProductId::from(1), 3).await });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, ProductId::from(1));
        assert!(matches!(action, ProductAction::ReserveStock(3)));
        responder.send(Ok(ProductActionResult::ReserveStock(7))).unwrap();

        assert_eq!(reserve.await.unwrap(), Ok(7));
    }

    #[tokio::test]
    async fn insufficient_stock_is_recovered_from_the_entity_error() {
        let mut mock = MockClient::<Product>::new();
        mock.expect_action(ProductId::from(1)).return_err(FrameworkError::EntityError(Box::new(
            ProductError::InsufficientStock {
                requested: 5,
                available: 2,
            },
        )));
        let client = ProductClient::new(mock.client());

        let result = client.reserve_stock(ProductId::from(1), 5).await;

        assert_eq!(
            result,
            Err(ProductError::InsufficientStock {
                requested: 5,
                available: 2
            })
        );
        mock.verify();
    }

    #[tokio::test]
    async fn mismatched_result_is_an_error_not_a_panic() {
        let mut mock = MockClient::<Product>::new();
        mock.expect_action(ProductId::from(1))
            .return_ok(ProductActionResult::CheckStock(4));
        let client = ProductClient::new(mock.client());

        let result = client.release_stock(ProductId::from(1), 1).await;

        assert!(matches!(result, Err(ProductError::ActorCommunicationError(_))));
        mock.verify();
    }
}
