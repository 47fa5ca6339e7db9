use super::LifecycleError;
use crate::api::{Credentials, LocalApi};
use crate::clients::{OrderClient, Principal, ProductClient, UserClient};
use crate::model::{Product, ProductDraft, User};
use crate::product_actor::ProductError;
use crate::user_actor::{AccountCreate, UserError};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The in-process reference backend: one actor per resource.
///
/// The User and Product actors have no dependencies; the Order actor receives their
/// clients as its context when it starts.
///
/// ```ignore
/// let backend = Backend::start();
/// backend.seed(sample_catalog()).await?;
/// let api = backend.api(Credentials::new());
/// // ... use the api ...
/// drop(api);
/// backend.shutdown().await?;
/// ```
pub struct Backend {
    pub users: UserClient,
    pub products: ProductClient,
    pub orders: OrderClient,
    handles: Vec<JoinHandle<()>>,
}

impl Backend {
    /// Spawns the actors. Must be called inside a Tokio runtime.
    pub fn start() -> Self {
        let (user_actor, users) = crate::user_actor::new();
        let (product_actor, products) = crate::product_actor::new();
        let (order_actor, orders) = crate::order_actor::new();

        let user_handle = tokio::spawn(user_actor.run(()));
        let product_handle = tokio::spawn(product_actor.run(()));
        let order_handle = tokio::spawn(order_actor.run((users.clone(), products.clone())));
        info!("Reference backend started");

        Self {
            users,
            products,
            orders,
            handles: vec![user_handle, product_handle, order_handle],
        }
    }

    /// An API over this backend that authenticates with `credentials`.
    pub fn api(&self, credentials: Credentials) -> LocalApi {
        LocalApi::new(
            self.users.clone(),
            self.products.clone(),
            self.orders.clone(),
            credentials,
        )
    }

    /// Creates an admin account directly, bypassing registration.
    pub async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserError> {
        let account = self
            .users
            .create_account(
                AccountCreate {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    admin: true,
                },
                Principal::System,
            )
            .await?;
        info!(user_id = %account.profile.id, "Admin account created");
        Ok(account.profile)
    }

    /// Adds products to the catalog as the system.
    pub async fn seed(&self, drafts: Vec<ProductDraft>) -> Result<Vec<Product>, ProductError> {
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(
                self.products
                    .create_product(draft, Principal::System)
                    .await?,
            );
        }
        info!(count = created.len(), "Catalog seeded");
        Ok(created)
    }

    /// Drops the clients and waits for every actor to stop.
    ///
    /// Actors stop when the last client of their channel is gone, so every
    /// [`LocalApi`] built from this backend must be dropped first.
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down reference backend...");
        drop(self.orders);
        drop(self.users);
        drop(self.products);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Actor task failed");
                return Err(LifecycleError::ActorTask(e));
            }
        }
        info!("Reference backend stopped");
        Ok(())
    }
}

/// A small catalog for demos and tests.
pub fn sample_catalog() -> Vec<ProductDraft> {
    let product = |name: &str, brand: &str, category: &str, cents: i64, stock: u32| ProductDraft {
        name: name.to_string(),
        description: format!("{brand} {name}"),
        price: Decimal::new(cents, 2),
        count_in_stock: stock,
        category: category.to_string(),
        brand: brand.to_string(),
        image: format!("/images/{}.jpg", name.to_lowercase().replace(' ', "-")),
        featured: false,
    };
    let mut catalog = vec![
        product("Desk Lamp", "Lumen", "Lighting", 2999, 25),
        product("Floor Lamp", "Lumen", "Lighting", 8950, 8),
        product("Wireless Mouse", "Clicko", "Electronics", 1999, 40),
        product("Mechanical Keyboard", "Clicko", "Electronics", 10000, 5),
        product("Notebook", "Paperly", "Stationery", 450, 200),
    ];
    catalog[0].featured = true;
    catalog[3].featured = true;
    catalog
}
