use super::{ApiError, AuthApi, Credentials, OrderApi, ProductApi, UserApi};
use crate::model::{
    AuthResponse, AuthSession, LoginRequest, Order, OrderDraft, OrderId, PaymentResult, Product,
    ProductDraft, ProductId, ProductPage, ProductQuery, ProductUpdate, ProfileUpdate,
    PurchaseCheck, RegisterRequest, ReviewDraft, User, UserId,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const LOGIN: &str = "/auth/login";
const REGISTER: &str = "/auth/register";

/// JSON-over-HTTP client for the storefront REST backend.
///
/// Every request except login and register carries the bearer token from
/// [`Credentials`]. Requests time out after the configured duration.
#[derive(Debug, Clone)]
pub struct HttpApi {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpApi {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Credentials,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::network)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.credentials.bearer() {
            Some(token) if path != LOGIN && path != REGISTER => builder.bearer_auth(token),
            _ => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let text = self.exchange(builder, path).await?;
        serde_json::from_str(&text).map_err(ApiError::decode)
    }

    /// Sends the request and returns the body of a successful response.
    async fn exchange(&self, builder: RequestBuilder, path: &str) -> Result<String, ApiError> {
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        debug!(path, status = status.as_u16(), "Response received");
        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::from_response(status.as_u16(), &body, path == LOGIN))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path), path).await
    }

    async fn with_body<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(method, path).json(body), path).await
    }

    async fn without_result<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        self.exchange(self.request(method, path).json(body), path)
            .await
            .map(drop)
    }

    async fn authenticate<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthSession, ApiError> {
        let response: AuthResponse = self.with_body(Method::POST, path, body).await?;
        response
            .into_session()
            .ok_or_else(|| ApiError::decode("auth response carries no user"))
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::timeout()
    } else if e.is_decode() {
        ApiError::decode(e)
    } else {
        ApiError::network(e)
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    async fn login(&self, request: LoginRequest) -> Result<AuthSession, ApiError> {
        self.authenticate(LOGIN, &request).await
    }

    async fn register(&self, request: RegisterRequest) -> Result<AuthSession, ApiError> {
        self.authenticate(REGISTER, &request).await
    }

    async fn profile(&self) -> Result<User, ApiError> {
        self.get("/auth/profile").await
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<AuthSession, ApiError> {
        let response: AuthResponse = self
            .with_body(Method::PUT, "/users/profile", &update)
            .await?;
        response
            .into_session()
            .ok_or_else(|| ApiError::decode("profile response carries no user"))
    }
}

#[async_trait]
impl ProductApi for HttpApi {
    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, ApiError> {
        let path = "/products";
        self.send(self.request(Method::GET, path).query(&query), path)
            .await
    }

    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.get(&format!("/products/{id}")).await
    }

    async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get("/products/featured").await
    }

    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.get("/categories").await
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, ApiError> {
        self.with_body(Method::POST, "/products", &draft).await
    }

    async fn update_product(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Product, ApiError> {
        self.with_body(Method::PUT, &format!("/products/{id}"), &update)
            .await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        self.without_result(Method::DELETE, &format!("/products/{id}"), &json!({}))
            .await
    }

    async fn submit_review(&self, id: &ProductId, review: ReviewDraft) -> Result<(), ApiError> {
        self.without_result(Method::POST, &format!("/products/{id}/reviews"), &review)
            .await
    }

    async fn check_purchase(&self, id: &ProductId) -> Result<PurchaseCheck, ApiError> {
        self.get(&format!("/orders/check-purchase/{id}")).await
    }
}

#[async_trait]
impl OrderApi for HttpApi {
    async fn place_order(&self, draft: OrderDraft) -> Result<Order, ApiError> {
        self.with_body(Method::POST, "/orders", &draft).await
    }

    async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get("/orders/myorders").await
    }

    async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.get(&format!("/orders/{id}")).await
    }

    async fn all_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get("/orders").await
    }

    async fn pay_order(&self, id: &OrderId, payment: PaymentResult) -> Result<Order, ApiError> {
        self.with_body(Method::PUT, &format!("/orders/{id}/pay"), &payment)
            .await
    }

    async fn ship_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.with_body(Method::PUT, &format!("/orders/{id}/ship"), &json!({}))
            .await
    }

    async fn receive_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.with_body(Method::PUT, &format!("/orders/{id}/receive"), &json!({}))
            .await
    }

    async fn cancel_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.with_body(Method::PUT, &format!("/orders/{id}/cancel"), &json!({}))
            .await
    }

    async fn mark_paid(&self, id: &OrderId) -> Result<Order, ApiError> {
        let note = json!({ "adminNote": "Manually marked as paid by admin" });
        self.with_body(Method::PUT, &format!("/orders/{id}/mark-paid"), &note)
            .await
    }

    async fn refund_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.with_body(Method::PUT, &format!("/orders/{id}/refund"), &json!({}))
            .await
    }

    async fn delete_order(&self, id: &OrderId) -> Result<(), ApiError> {
        self.without_result(Method::DELETE, &format!("/orders/{id}"), &json!({}))
            .await
    }
}

#[async_trait]
impl UserApi for HttpApi {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/users").await
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), ApiError> {
        self.without_result(Method::DELETE, &format!("/users/{id}"), &json!({}))
            .await
    }

    async fn promote_to_admin(&self, id: &UserId) -> Result<User, ApiError> {
        self.with_body(Method::PUT, "/users/promote-to-admin", &json!({ "id": id }))
            .await
    }
}
