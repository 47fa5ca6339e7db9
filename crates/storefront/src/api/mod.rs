//! # Remote Data Access Layer
//!
//! The storefront talks to its backend only through the traits in this module, one
//! per resource. Two implementations ship with the crate:
//!
//! - [`HttpApi`]: JSON over HTTP with `reqwest`.
//! - [`LocalApi`]: the in-process reference backend built on resource actors.
//!
//! Both normalize failures into [`ApiError`] and read the bearer token from a shared
//! [`Credentials`] cell that the session fills in.

mod error;
mod http;
mod local;

pub use error::*;
pub use http::HttpApi;
pub use local::LocalApi;

use crate::model::{
    AuthSession, LoginRequest, Order, OrderDraft, OrderId, PaymentResult, Product, ProductDraft,
    ProductId, ProductPage, ProductQuery, ProductUpdate, ProfileUpdate, PurchaseCheck,
    RegisterRequest, ReviewDraft, User, UserId,
};
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};

/// The bearer token in use, shared between the session and the API client.
#[derive(Debug, Clone, Default)]
pub struct Credentials(Arc<RwLock<Option<String>>>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: Option<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn bearer(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_set(&self) -> bool {
        self.0.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: LoginRequest) -> Result<AuthSession, ApiError>;
    async fn register(&self, request: RegisterRequest) -> Result<AuthSession, ApiError>;
    async fn profile(&self) -> Result<User, ApiError>;
    /// Returns the refreshed profile together with a reissued token.
    async fn update_profile(&self, update: ProfileUpdate) -> Result<AuthSession, ApiError>;
}

#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, ApiError>;
    async fn product(&self, id: &ProductId) -> Result<Product, ApiError>;
    async fn featured_products(&self) -> Result<Vec<Product>, ApiError>;
    async fn categories(&self) -> Result<Vec<String>, ApiError>;
    async fn create_product(&self, draft: ProductDraft) -> Result<Product, ApiError>;
    async fn update_product(&self, id: &ProductId, update: ProductUpdate)
        -> Result<Product, ApiError>;
    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError>;
    async fn submit_review(&self, id: &ProductId, review: ReviewDraft) -> Result<(), ApiError>;
    /// Whether the signed-in user has a paid order containing the product.
    async fn check_purchase(&self, id: &ProductId) -> Result<PurchaseCheck, ApiError>;
}

#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn place_order(&self, draft: OrderDraft) -> Result<Order, ApiError>;
    async fn my_orders(&self) -> Result<Vec<Order>, ApiError>;
    async fn order(&self, id: &OrderId) -> Result<Order, ApiError>;
    async fn all_orders(&self) -> Result<Vec<Order>, ApiError>;
    async fn pay_order(&self, id: &OrderId, payment: PaymentResult) -> Result<Order, ApiError>;
    async fn ship_order(&self, id: &OrderId) -> Result<Order, ApiError>;
    async fn receive_order(&self, id: &OrderId) -> Result<Order, ApiError>;
    async fn cancel_order(&self, id: &OrderId) -> Result<Order, ApiError>;
    async fn mark_paid(&self, id: &OrderId) -> Result<Order, ApiError>;
    async fn refund_order(&self, id: &OrderId) -> Result<Order, ApiError>;
    async fn delete_order(&self, id: &OrderId) -> Result<(), ApiError>;
}

#[async_trait]
pub trait UserApi: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn delete_user(&self, id: &UserId) -> Result<(), ApiError>;
    async fn promote_to_admin(&self, id: &UserId) -> Result<User, ApiError>;
}

/// Everything the application container needs from a backend.
pub trait RemoteApi: AuthApi + ProductApi + OrderApi + UserApi {}

impl<T: AuthApi + ProductApi + OrderApi + UserApi> RemoteApi for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_shared_between_clones() {
        let credentials = Credentials::new();
        let seen_by_api = credentials.clone();
        assert!(!seen_by_api.is_set());

        credentials.set(Some("t1".into()));
        assert_eq!(seen_by_api.bearer().as_deref(), Some("t1"));

        credentials.set(None);
        assert_eq!(seen_by_api.bearer(), None);
    }
}
