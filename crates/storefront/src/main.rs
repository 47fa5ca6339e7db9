//! # Storefront Demo
//!
//! Walks through a shopping session against the configured backend:
//!
//! 1. Browse the catalog and fill a guest cart.
//! 2. Register; the cart switches to the new user's (empty) cart.
//! 3. Fill the user cart and check out.
//! 4. Sign in as the admin, mark the order paid (optimistically) and ship it.
//! 5. Sign back in as the customer and confirm delivery.
//!
//! With the default `local` backend the reference backend is started in-process and
//! seeded first. Set `RUST_LOG=info` (or `debug`) to follow along.

use rust_decimal::Decimal;
use std::error::Error;
use storefront::cart::CartProduct;
use storefront::lifecycle::{sample_catalog, setup_tracing, Storefront, StorefrontConfig};
use storefront::model::{LoginRequest, RegisterRequest, ShippingAddress};
use storefront::orders::{CheckoutForm, Optimistic, PriceBreakdown, CREDIT_CARD};
use tracing::{info, warn, Instrument};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin123";
const CUSTOMER_EMAIL: &str = "alice@example.com";
const CUSTOMER_PASSWORD: &str = "alice123";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_tracing();
    let config = StorefrontConfig::load()?;
    info!(backend = ?config.backend, "Starting storefront demo");

    let mut shop = Storefront::start(&config)?;

    if let Some(backend) = shop.backend() {
        backend
            .create_admin("Admin", ADMIN_EMAIL, ADMIN_PASSWORD)
            .await?;
        backend.seed(sample_catalog()).await?;
    }

    // Browse as a guest.
    let span = tracing::info_span!("browsing");
    async {
        shop.catalog.load_categories().await?;
        shop.catalog.filter_mut().set_category("Lighting");
        let page = shop.catalog.refresh().await?.clone();
        info!(
            categories = ?shop.catalog.categories(),
            hits = page.total,
            "Catalog loaded"
        );
        if let Some(lamp) = page.products.first() {
            shop.cart.add_item(CartProduct::from(lamp), 1);
        }
        info!(items = shop.cart.item_count(), total = %shop.cart.total(), "Guest cart");
        Ok::<_, Box<dyn Error>>(())
    }
    .instrument(span)
    .await?;

    // Register and buy.
    let span = tracing::info_span!("checkout");
    let order = async {
        let user = shop
            .register(RegisterRequest {
                name: "Alice".to_string(),
                email: CUSTOMER_EMAIL.to_string(),
                password: CUSTOMER_PASSWORD.to_string(),
            })
            .await?;
        info!(user_id = %user.id, items = shop.cart.item_count(), "Registered");

        shop.catalog.filter_mut().set_category("All");
        let page = shop.catalog.refresh().await?.clone();
        for product in page.products.iter().take(2) {
            shop.cart.add_item(CartProduct::from(product), 2);
        }
        let quote = PriceBreakdown::for_items(shop.cart.total());
        info!(items = %quote.items, tax = %quote.tax, total = %quote.total, "Quote");

        let form = CheckoutForm {
            shipping: ShippingAddress {
                address: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                postal_code: "12345".to_string(),
                country: "US".to_string(),
            },
            payment_method: CREDIT_CARD.to_string(),
            card_number: "4242424242424242".to_string(),
            expiry: "12/30".to_string(),
            cvc: "123".to_string(),
        };
        let order = shop.checkout(&form).await?;
        info!(
            order_id = %order.id,
            total = %order.total_price,
            cart_items = shop.cart.item_count(),
            "Order placed"
        );
        Ok::<_, Box<dyn Error>>(order)
    }
    .instrument(span)
    .await?;

    // Fulfil as the admin.
    let span = tracing::info_span!("fulfilment");
    async {
        shop.login(LoginRequest {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        })
        .await?;
        shop.fetch_all_orders().await?;
        match shop.mark_paid(&order.id).await? {
            Optimistic::Committed(paid) => {
                info!(order_id = %paid.id, stage = %paid.stage(), "Marked paid")
            }
            other => warn!(error = ?other.error(), "Mark paid did not commit"),
        }
        let shipped = shop.ship_order(&order.id).await?;
        info!(order_id = %shipped.id, stage = %shipped.stage(), "Shipped");
        shop.logout();
        Ok::<_, Box<dyn Error>>(())
    }
    .instrument(span)
    .await?;

    // Confirm delivery as the customer.
    shop.login(LoginRequest {
        email: CUSTOMER_EMAIL.to_string(),
        password: CUSTOMER_PASSWORD.to_string(),
    })
    .await?;
    let delivered = shop.mark_delivered(&order.id).await?;
    let spent: Decimal = shop
        .fetch_my_orders()
        .await?
        .iter()
        .map(|o| o.total_price)
        .sum();
    info!(order_id = %delivered.id, stage = %delivered.stage(), %spent, "Delivered");

    shop.shutdown().await?;
    info!("Demo completed successfully");
    Ok(())
}
