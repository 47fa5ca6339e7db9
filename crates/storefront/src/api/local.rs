//! In-process implementation of the API traits on top of the reference backend
//! actors.
//!
//! Requests resolve the bearer token to a [`Principal`] and forward to the actor
//! clients. Actor errors are mapped to HTTP-like statuses and normalized through
//! [`ApiError::from_status`], so callers see exactly what they would see over HTTP.

use super::{
    ApiError, AuthApi, Credentials, ErrorBody, FieldErrorEntry, OrderApi, ProductApi,
    RawFieldErrors, UserApi,
};
use crate::clients::{OrderClient, Principal, ProductClient, UserClient};
use crate::model::{
    AuthSession, LoginRequest, Order, OrderDraft, OrderId, PaymentResult, Product, ProductDraft,
    ProductId, ProductPage, ProductQuery, ProductUpdate, ProfileUpdate, PurchaseCheck,
    RegisterRequest, ReviewDraft, User, UserId,
};
use crate::order_actor::{OrderAction, OrderQuery, OrderRejection};
use crate::orders::GuardError;
use crate::product_actor::{ProductError, ProductFilter};
use crate::user_actor::{normalize_email, AccountCreate, AccountQuery, AccountUpdate, UserError};
use async_trait::async_trait;
use resource_framework::ResourceHandle;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fmt::Display;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// A backend failure with the status the REST backend would answer with.
trait Rejection: Display {
    fn status(&self) -> u16;

    /// The form field the failure belongs to, if any.
    fn field(&self) -> Option<&'static str> {
        None
    }
}

impl Rejection for UserError {
    fn status(&self) -> u16 {
        match self {
            UserError::NotFound(_) => 404,
            UserError::Validation { .. }
            | UserError::EmailTaken
            | UserError::AlreadyAdmin
            | UserError::CannotDeleteSelf => 400,
            UserError::UnknownEmail | UserError::WrongPassword => 401,
            UserError::Forbidden => 403,
            UserError::ActorCommunicationError(_) => 500,
        }
    }

    fn field(&self) -> Option<&'static str> {
        match self {
            UserError::Validation { field, .. } => Some(field),
            UserError::EmailTaken => Some("email"),
            _ => None,
        }
    }
}

impl Rejection for ProductError {
    fn status(&self) -> u16 {
        match self {
            ProductError::NotFound(_) => 404,
            ProductError::InsufficientStock { .. }
            | ProductError::InvalidQuantity(_)
            | ProductError::Validation(_)
            | ProductError::InvalidRating(_)
            | ProductError::AlreadyReviewed => 400,
            ProductError::Forbidden => 403,
            ProductError::ActorCommunicationError(_) => 500,
        }
    }

    fn field(&self) -> Option<&'static str> {
        match self {
            ProductError::InvalidRating(_) => Some("rating"),
            _ => None,
        }
    }
}

impl Rejection for OrderRejection {
    fn status(&self) -> u16 {
        match self {
            OrderRejection::NotFound(_) => 404,
            OrderRejection::Guard(GuardError::NotPermitted { .. }) | OrderRejection::Forbidden => {
                403
            }
            OrderRejection::Unauthenticated => 401,
            OrderRejection::Guard(_)
            | OrderRejection::EmptyOrder
            | OrderRejection::InvalidQuantity(_)
            | OrderRejection::InvalidUser(_)
            | OrderRejection::InvalidProduct(_)
            | OrderRejection::InsufficientStock(_)
            | OrderRejection::Immutable => 400,
            OrderRejection::ActorCommunicationError(_) => 500,
        }
    }
}

fn rejected<E: Rejection>(e: E, is_login: bool) -> ApiError {
    let message = e.to_string();
    let errors = e.field().map(|field| {
        RawFieldErrors::List(vec![FieldErrorEntry {
            path: Some(field.to_string()),
            msg: Some(message.clone()),
            ..FieldErrorEntry::default()
        }])
    });
    debug!(status = e.status(), %message, "Backend rejected request");
    ApiError::from_status(
        e.status(),
        ErrorBody {
            message: Some(message),
            error: None,
            errors,
        },
        is_login,
    )
}

fn reject<E: Rejection>(e: E) -> ApiError {
    rejected(e, false)
}

fn status(code: u16, message: &str) -> ApiError {
    ApiError::from_status(code, ErrorBody::message(message), false)
}

fn unauthenticated() -> ApiError {
    status(401, "Not authorized, no token")
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn sort_products(products: &mut [Product], sort: Option<&str>) {
    match sort.unwrap_or("-createdAt") {
        "price" => products.sort_by(|a, b| a.price.cmp(&b.price)),
        "-price" => products.sort_by(|a, b| b.price.cmp(&a.price)),
        "name" => products.sort_by_key(|p| p.name.to_lowercase()),
        "-name" => products.sort_by_key(|p| Reverse(p.name.to_lowercase())),
        "-rating" => products.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        _ => products.sort_by_key(|p| Reverse(p.created_at)),
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by_key(|o| Reverse(o.created_at));
    orders
}

/// The reference backend behind the API traits.
#[derive(Clone)]
pub struct LocalApi {
    users: UserClient,
    products: ProductClient,
    orders: OrderClient,
    credentials: Credentials,
}

impl LocalApi {
    pub fn new(
        users: UserClient,
        products: ProductClient,
        orders: OrderClient,
        credentials: Credentials,
    ) -> Self {
        Self {
            users,
            products,
            orders,
            credentials,
        }
    }

    /// Resolves the bearer token. A missing or unknown token is a 401.
    async fn principal(&self) -> Result<Principal, ApiError> {
        let token = self.credentials.bearer().ok_or_else(unauthenticated)?;
        match self.users.find_by_token(&token).await.map_err(reject)? {
            Some(account) => Ok(Principal::for_user(&account.profile)),
            None => Err(unauthenticated()),
        }
    }

    async fn signed_in(&self) -> Result<(Principal, UserId), ApiError> {
        let principal = self.principal().await?;
        let id = principal.user_id().cloned().ok_or_else(unauthenticated)?;
        Ok((principal, id))
    }

    async fn admin(&self) -> Result<Principal, ApiError> {
        let principal = self.principal().await?;
        if principal.is_privileged() {
            Ok(principal)
        } else {
            Err(status(403, "Not authorized as an admin"))
        }
    }

    async fn session_for(&self, user: User) -> Result<AuthSession, ApiError> {
        let token = self
            .users
            .issue_token(user.id.clone(), Principal::System)
            .await
            .map_err(reject)?;
        Ok(AuthSession { user, token })
    }

    async fn transition(&self, id: &OrderId, action: OrderAction) -> Result<Order, ApiError> {
        let principal = self.principal().await?;
        self.orders
            .apply(id.clone(), action, principal)
            .await
            .map_err(reject)
    }

    async fn purchased(&self, principal: &Principal, id: &ProductId) -> Result<bool, ApiError> {
        let orders = self
            .orders
            .find(OrderQuery::PurchasedProduct(id.clone()), principal.clone())
            .await
            .map_err(reject)?;
        Ok(!orders.is_empty())
    }
}

#[async_trait]
impl AuthApi for LocalApi {
    async fn login(&self, request: LoginRequest) -> Result<AuthSession, ApiError> {
        let account = self
            .users
            .find_by_email(&request.email)
            .await
            .map_err(reject)?
            .ok_or_else(|| rejected(UserError::UnknownEmail, true))?;
        let token = self
            .users
            .authenticate(account.profile.id.clone(), request.password)
            .await
            .map_err(|e| rejected(e, true))?;
        Ok(AuthSession {
            user: account.profile,
            token,
        })
    }

    async fn register(&self, request: RegisterRequest) -> Result<AuthSession, ApiError> {
        if self
            .users
            .find_by_email(&request.email)
            .await
            .map_err(reject)?
            .is_some()
        {
            return Err(reject(UserError::EmailTaken));
        }
        let account = self
            .users
            .create_account(
                AccountCreate {
                    name: request.name,
                    email: request.email,
                    password: request.password,
                    admin: false,
                },
                Principal::Anonymous,
            )
            .await
            .map_err(reject)?;
        self.session_for(account.profile).await
    }

    async fn profile(&self) -> Result<User, ApiError> {
        let (principal, id) = self.signed_in().await?;
        self.users
            .fetch(id, principal)
            .await
            .map_err(reject)?
            .map(|account| account.profile)
            .ok_or_else(|| status(404, "User not found"))
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<AuthSession, ApiError> {
        let (principal, id) = self.signed_in().await?;
        if let Some(email) = &update.email {
            let holder = self.users.find_by_email(email).await.map_err(reject)?;
            if holder.is_some_and(|account| account.profile.id != id) {
                return Err(reject(UserError::EmailTaken));
            }
        }
        let account = self
            .users
            .update_account(
                id,
                AccountUpdate {
                    name: update.name,
                    email: update.email.map(|e| normalize_email(&e)),
                    password: update.password,
                },
                principal,
            )
            .await
            .map_err(reject)?;
        self.session_for(account.profile).await
    }
}

#[async_trait]
impl ProductApi for LocalApi {
    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, ApiError> {
        let category = non_empty(&query.category).filter(|c| c != "All");
        let filter = ProductFilter::Catalog {
            keyword: non_empty(&query.keyword),
            category,
        };
        let mut products = self
            .products
            .find(filter, Principal::Anonymous)
            .await
            .map_err(reject)?;
        sort_products(&mut products, query.sort.as_deref());

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let total = products.len() as u32;
        let pages = total.div_ceil(limit).max(1);
        let page = query.page.unwrap_or(1).clamp(1, pages);
        let products = products
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ProductPage {
            products,
            page,
            pages,
            total,
        })
    }

    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.products
            .fetch(id.clone(), Principal::Anonymous)
            .await
            .map_err(reject)?
            .ok_or_else(|| status(404, "Product not found"))
    }

    async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        let mut products = self
            .products
            .find(ProductFilter::Featured, Principal::Anonymous)
            .await
            .map_err(reject)?;
        sort_products(&mut products, None);
        Ok(products)
    }

    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let products = self
            .products
            .find(ProductFilter::All, Principal::Anonymous)
            .await
            .map_err(reject)?;
        let categories: BTreeSet<String> = products
            .into_iter()
            .map(|p| p.category)
            .filter(|c| !c.trim().is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, ApiError> {
        let principal = self.principal().await?;
        self.products
            .create_product(draft, principal)
            .await
            .map_err(reject)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Product, ApiError> {
        let principal = self.principal().await?;
        self.products
            .update_product(id.clone(), update, principal)
            .await
            .map_err(reject)
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let principal = self.principal().await?;
        self.products
            .remove(id.clone(), principal)
            .await
            .map_err(reject)
    }

    async fn submit_review(&self, id: &ProductId, review: ReviewDraft) -> Result<(), ApiError> {
        let (principal, user_id) = self.signed_in().await?;
        if !self.purchased(&principal, id).await? {
            return Err(status(
                400,
                "You can only review products you have purchased",
            ));
        }
        let name = self
            .users
            .fetch(user_id.clone(), principal.clone())
            .await
            .map_err(reject)?
            .map(|account| account.profile.name)
            .unwrap_or_default();
        self.products
            .add_review(
                id.clone(),
                user_id,
                name,
                review.rating,
                review.comment,
                principal,
            )
            .await
            .map(drop)
            .map_err(reject)
    }

    async fn check_purchase(&self, id: &ProductId) -> Result<PurchaseCheck, ApiError> {
        let principal = self.principal().await?;
        Ok(PurchaseCheck {
            is_paid: self.purchased(&principal, id).await?,
        })
    }
}

#[async_trait]
impl OrderApi for LocalApi {
    async fn place_order(&self, draft: OrderDraft) -> Result<Order, ApiError> {
        let principal = self.principal().await?;
        self.orders
            .place_order(draft, principal)
            .await
            .map_err(reject)
    }

    async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        let principal = self.principal().await?;
        let orders = self
            .orders
            .find(OrderQuery::Mine, principal)
            .await
            .map_err(reject)?;
        Ok(newest_first(orders))
    }

    async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let principal = self.principal().await?;
        self.orders
            .fetch(id.clone(), principal)
            .await
            .map_err(reject)?
            .ok_or_else(|| status(404, "Order not found"))
    }

    async fn all_orders(&self) -> Result<Vec<Order>, ApiError> {
        let principal = self.admin().await?;
        let orders = self
            .orders
            .find(OrderQuery::All, principal)
            .await
            .map_err(reject)?;
        Ok(newest_first(orders))
    }

    async fn pay_order(&self, id: &OrderId, payment: PaymentResult) -> Result<Order, ApiError> {
        self.transition(id, OrderAction::Pay(payment)).await
    }

    async fn ship_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.transition(id, OrderAction::Ship).await
    }

    async fn receive_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.transition(id, OrderAction::Receive).await
    }

    async fn cancel_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.transition(id, OrderAction::Cancel).await
    }

    async fn mark_paid(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.transition(id, OrderAction::MarkPaid).await
    }

    async fn refund_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.transition(id, OrderAction::Refund).await
    }

    async fn delete_order(&self, id: &OrderId) -> Result<(), ApiError> {
        let principal = self.principal().await?;
        self.orders
            .remove(id.clone(), principal)
            .await
            .map_err(reject)
    }
}

#[async_trait]
impl UserApi for LocalApi {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let principal = self.admin().await?;
        let mut accounts = self
            .users
            .find(AccountQuery::All, principal)
            .await
            .map_err(reject)?;
        accounts.sort_by_key(|account| account.created_at);
        Ok(accounts.into_iter().map(|account| account.profile).collect())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), ApiError> {
        let principal = self.principal().await?;
        self.users.remove(id.clone(), principal).await.map_err(reject)
    }

    async fn promote_to_admin(&self, id: &UserId) -> Result<User, ApiError> {
        let principal = self.principal().await?;
        self.users
            .promote(id.clone(), principal)
            .await
            .map_err(reject)
    }
}
