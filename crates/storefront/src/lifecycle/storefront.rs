use super::{Backend, BackendKind, LifecycleError, StorefrontConfig};
use crate::admin::UserAdmin;
use crate::api::{ApiError, Credentials, HttpApi, RemoteApi, RemoteFailure};
use crate::cart::CartStore;
use crate::catalog::Catalog;
use crate::model::{
    LoginRequest, Order, OrderId, PaymentResult, ProductId, ProfileUpdate, RegisterRequest,
    ReviewDraft, User, UserId,
};
use crate::orders::{
    checkout, CheckoutError, CheckoutForm, Optimistic, OrderError, OrderStore, Role,
};
use crate::session::{Session, SessionError};
use crate::storage::{FileStorage, MemoryStorage, SharedStorage};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// The application container: every client-side store, wired to one backend and one
/// storage.
///
/// Remote failures pass through [`Storefront::intercept`]: an authentication
/// rejection on a signed-in session expires the session (token and profile cleared,
/// cart back to the guest, [`SessionEvent::Expired`](crate::session::SessionEvent)
/// broadcast) before the error reaches the caller.
pub struct Storefront {
    api: Arc<dyn RemoteApi>,
    pub cart: CartStore,
    pub session: Session<dyn RemoteApi>,
    pub orders: OrderStore<dyn RemoteApi>,
    pub catalog: Catalog<dyn RemoteApi>,
    pub users: UserAdmin<dyn RemoteApi>,
    backend: Option<Backend>,
}

impl Storefront {
    /// Opens storage, connects (or starts) the backend and restores the session.
    pub fn start(config: &StorefrontConfig) -> Result<Self, LifecycleError> {
        let storage: SharedStorage = match &config.data_dir {
            Some(dir) => Arc::new(FileStorage::open(dir)?),
            None => Arc::new(MemoryStorage::new()),
        };
        let credentials = Credentials::new();
        let storefront = match config.backend {
            BackendKind::Local => {
                let backend = Backend::start();
                let api = Arc::new(backend.api(credentials.clone()));
                Self::with_parts(api, storage, credentials, Some(backend))
            }
            BackendKind::Http => {
                let api = HttpApi::new(&config.api_url, config.timeout(), credentials.clone())?;
                Self::with_parts(Arc::new(api), storage, credentials, None)
            }
        };
        info!(backend = ?config.backend, "Storefront started");
        Ok(storefront)
    }

    /// Assembles a storefront from its parts. `credentials` must be the cell `api`
    /// reads its bearer token from.
    pub fn with_parts(
        api: Arc<dyn RemoteApi>,
        storage: SharedStorage,
        credentials: Credentials,
        backend: Option<Backend>,
    ) -> Self {
        let mut cart = CartStore::new(storage.clone());
        let mut session = Session::new(Arc::clone(&api), storage, credentials);
        session.initialize(&mut cart);
        Self {
            orders: OrderStore::new(Arc::clone(&api)),
            catalog: Catalog::new(Arc::clone(&api)),
            users: UserAdmin::new(Arc::clone(&api)),
            api,
            cart,
            session,
            backend,
        }
    }

    /// The reference backend, when running against it.
    pub fn backend(&self) -> Option<&Backend> {
        self.backend.as_ref()
    }

    pub fn api(&self) -> &Arc<dyn RemoteApi> {
        &self.api
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    /// Acting role for order transitions; anonymous callers act as customers and are
    /// turned away by the backend.
    pub fn role(&self) -> Role {
        self.session.role().unwrap_or(Role::Customer)
    }

    pub async fn login(&mut self, request: LoginRequest) -> Result<User, SessionError> {
        let user = self.session.login(request, &mut self.cart).await?.clone();
        self.reset_user_state();
        Ok(user)
    }

    pub async fn register(&mut self, request: RegisterRequest) -> Result<User, SessionError> {
        let user = self.session.register(request, &mut self.cart).await?.clone();
        self.reset_user_state();
        Ok(user)
    }

    pub fn logout(&mut self) {
        self.session.logout(&mut self.cart);
        self.reset_user_state();
    }

    pub async fn fetch_profile(&mut self) -> Result<User, SessionError> {
        let result = self.session.fetch_profile().await.cloned();
        self.intercept(result)
    }

    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<User, SessionError> {
        let result = self.session.update_profile(update).await.cloned();
        self.intercept(result)
    }

    /// Places an order from the cart; the cart is cleared only when the order is
    /// accepted.
    pub async fn checkout(&mut self, form: &CheckoutForm) -> Result<Order, CheckoutError> {
        let result = checkout(&mut self.cart, &mut self.orders, form).await;
        self.intercept(result)
    }

    pub async fn fetch_my_orders(&mut self) -> Result<Vec<Order>, OrderError> {
        let result = self.orders.fetch_my_orders().await.map(<[Order]>::to_vec);
        self.intercept(result)
    }

    pub async fn fetch_all_orders(&mut self) -> Result<Vec<Order>, OrderError> {
        let result = self.orders.fetch_all().await.map(<[Order]>::to_vec);
        self.intercept(result)
    }

    /// Loads an order by id, e.g. for the order confirmation page.
    pub async fn fetch_order(&mut self, id: &OrderId) -> Result<Order, OrderError> {
        let result = self.orders.fetch_order(id).await;
        self.intercept(result)
    }

    pub async fn pay_order(
        &mut self,
        id: &OrderId,
        payment: PaymentResult,
    ) -> Result<Order, OrderError> {
        let result = self.orders.pay(id, payment, Utc::now()).await;
        self.intercept(result)
    }

    pub async fn cancel_order(&mut self, id: &OrderId) -> Result<Order, OrderError> {
        let role = self.role();
        let result = self.orders.cancel(id, role, Utc::now()).await;
        self.intercept(result)
    }

    pub async fn mark_delivered(&mut self, id: &OrderId) -> Result<Order, OrderError> {
        let role = self.role();
        let result = self.orders.mark_delivered(id, role, Utc::now()).await;
        self.intercept(result)
    }

    pub async fn ship_order(&mut self, id: &OrderId) -> Result<Order, OrderError> {
        let result = self.orders.ship(id, Utc::now()).await;
        self.intercept(result)
    }

    pub async fn delete_order(&mut self, id: &OrderId) -> Result<(), OrderError> {
        let result = self.orders.delete(id, Utc::now()).await;
        self.intercept(result)
    }

    pub async fn mark_paid(
        &mut self,
        id: &OrderId,
    ) -> Result<Optimistic<Order, ApiError>, OrderError> {
        let result = self.orders.mark_paid(id, Utc::now()).await;
        let outcome = self.intercept(result)?;
        self.expire_on_rollback(&outcome);
        Ok(outcome)
    }

    pub async fn refund_order(
        &mut self,
        id: &OrderId,
    ) -> Result<Optimistic<Order, ApiError>, OrderError> {
        let result = self.orders.refund(id, Utc::now()).await;
        let outcome = self.intercept(result)?;
        self.expire_on_rollback(&outcome);
        Ok(outcome)
    }

    /// Submits a review; the current product is reloaded with the new rating.
    pub async fn submit_review(
        &mut self,
        id: &ProductId,
        review: ReviewDraft,
    ) -> Result<(), ApiError> {
        let result = self.catalog.submit_review(id, review).await.map(drop);
        self.intercept(result)
    }

    pub async fn refresh_users(&mut self) -> Result<Vec<User>, ApiError> {
        let result = self.users.refresh().await.map(<[User]>::to_vec);
        self.intercept(result)
    }

    pub async fn promote_user(&mut self, id: &UserId) -> Result<User, ApiError> {
        let result = self.users.promote(id).await;
        self.intercept(result)
    }

    pub async fn delete_user(&mut self, id: &UserId) -> Result<(), ApiError> {
        let result = self.users.delete(id).await;
        self.intercept(result)
    }

    /// Expires the session when `result` is an authentication rejection and a user
    /// is signed in. The result is passed through unchanged.
    pub fn intercept<T, E: RemoteFailure>(&mut self, result: Result<T, E>) -> Result<T, E> {
        if let Err(e) = &result {
            if let Some(api_error) = e.api_error() {
                self.expire_if_rejected(api_error);
            }
        }
        result
    }

    fn expire_on_rollback(&mut self, outcome: &Optimistic<Order, ApiError>) {
        if let Some(e) = outcome.error() {
            self.expire_if_rejected(e);
        }
    }

    fn expire_if_rejected(&mut self, error: &ApiError) {
        if error.is_unauthorized() && self.session.is_authenticated() {
            self.session.expire(error.message.clone(), &mut self.cart);
            self.reset_user_state();
        }
    }

    fn reset_user_state(&mut self) {
        self.orders.reset();
        self.users.reset();
    }

    /// Stops the storefront. With the reference backend, its actors are drained
    /// after every store has released its API handle.
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        let Storefront {
            api,
            cart,
            session,
            orders,
            catalog,
            users,
            backend,
        } = self;
        drop((session, orders, catalog, users, cart));
        drop(api);
        if let Some(backend) = backend {
            backend.shutdown().await?;
        }
        info!("Storefront stopped");
        Ok(())
    }
}
