//! Turning the active cart into an order.

use super::error::OrderError;
use super::store::OrderStore;
use crate::api::{ApiError, OrderApi, RemoteFailure};
use crate::cart::CartStore;
use crate::model::{Order, OrderDraft, OrderItem, ShippingAddress};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

/// The payment method whose card fields must be filled in.
pub const CREDIT_CARD: &str = "Credit Card";

/// Tax rate applied to the items subtotal.
pub fn tax_rate() -> Decimal {
    Decimal::new(10, 2)
}

/// Order totals. `total = items + tax + shipping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub items: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    /// Tax is rounded to cents; shipping is free.
    pub fn for_items(items: Decimal) -> Self {
        let tax = (items * tax_rate()).round_dp(2);
        let shipping = Decimal::ZERO;
        Self {
            items,
            tax,
            shipping,
            total: items + tax + shipping,
        }
    }

    pub fn of(lines: &[OrderItem]) -> Self {
        Self::for_items(lines.iter().map(OrderItem::line_total).sum())
    }
}

/// What the shopper typed on the checkout page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutForm {
    pub shipping: ShippingAddress,
    pub payment_method: String,
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}

impl CheckoutForm {
    /// Field → message for every missing field; empty when the form is complete.
    pub fn validate(&self) -> BTreeMap<&'static str, &'static str> {
        let mut errors = BTreeMap::new();
        let mut require = |value: &str, field, message| {
            if value.trim().is_empty() {
                errors.insert(field, message);
            }
        };
        require(&self.shipping.address, "address", "Address is required");
        require(&self.shipping.city, "city", "City is required");
        require(&self.shipping.postal_code, "postalCode", "Postal code is required");
        require(&self.shipping.country, "country", "Country is required");
        require(&self.payment_method, "paymentMethod", "Please select a payment method");
        if self.payment_method == CREDIT_CARD {
            require(&self.card_number, "cardNumber", "Card number is required");
            require(&self.expiry, "expiry", "Expiry date is required");
            require(&self.cvc, "cvc", "CVC is required");
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Please fix the highlighted fields")]
    Invalid(BTreeMap<&'static str, &'static str>),
    #[error(transparent)]
    Order(#[from] OrderError),
}

impl RemoteFailure for CheckoutError {
    fn api_error(&self) -> Option<&ApiError> {
        match self {
            CheckoutError::Order(e) => e.api_error(),
            _ => None,
        }
    }
}

/// Places an order for the active cart. The cart is cleared only once the order
/// exists.
pub async fn checkout<A: OrderApi + ?Sized>(
    cart: &mut CartStore,
    orders: &mut OrderStore<A>,
    form: &CheckoutForm,
) -> Result<Order, CheckoutError> {
    let snapshot = cart.checkout_snapshot().ok_or(CheckoutError::EmptyCart)?;
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(CheckoutError::Invalid(errors));
    }

    let prices = PriceBreakdown::for_items(snapshot.items_price);
    let draft = OrderDraft {
        order_items: snapshot.items,
        shipping_address: form.shipping.clone(),
        payment_method: form.payment_method.clone(),
        items_price: prices.items,
        tax_price: prices.tax,
        shipping_price: prices.shipping,
        total_price: prices.total,
    };
    let order = orders.place_order(draft).await?;
    cart.clear();
    info!(order_id = %order.id, identity = %cart.identity(), "Checkout complete");
    Ok(order)
}
