use crate::model::{OrderItem, Product, ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::num::NonZeroU32;
use uuid::Uuid;

/// Whose cart is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CartIdentity {
    #[default]
    Guest,
    User(UserId),
}

impl Display for CartIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartIdentity::Guest => f.write_str("guest"),
            CartIdentity::User(id) => write!(f, "user-{id}"),
        }
    }
}

/// Cart-scoped line identifier, distinct from the product id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(String);

impl LineId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the cart needs to know about a product to add it.
#[derive(Debug, Clone, PartialEq)]
pub struct CartProduct {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: (!product.image.is_empty()).then(|| product.image.clone()),
        }
    }
}

/// One line of a cart. The quantity can never be zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    #[serde(rename = "_id")]
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: NonZeroU32,
    pub cart_item_id: LineId,
}

impl CartLineItem {
    /// `None` when price × quantity does not fit a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity.get()))
    }

    pub fn to_order_item(&self) -> OrderItem {
        OrderItem {
            name: self.name.clone(),
            image: self.image.clone().unwrap_or_default(),
            price: self.price,
            product: self.product_id.clone(),
            qty: self.quantity.get(),
        }
    }
}

/// The lines of one identity's cart, in insertion order.
///
/// Total and item count are derived on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    pub(crate) items: Vec<CartLineItem>,
}

impl Cart {
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Σ price × quantity.
    ///
    /// The store never holds a cart whose total overflows; see [`Cart::checked_total`].
    pub fn total(&self) -> Decimal {
        self.checked_total().unwrap_or(Decimal::MAX)
    }

    /// Σ price × quantity, or `None` if any step overflows.
    pub fn checked_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.line_total()?))
    }

    /// Σ quantity.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity.get())).sum()
    }

    pub fn line(&self, line: &LineId) -> Option<&CartLineItem> {
        self.items.iter().find(|i| &i.cart_item_id == line)
    }

    pub fn line_for_product(&self, product: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|i| &i.product_id == product)
    }

    pub(crate) fn to_record(&self) -> CartRecord {
        CartRecord {
            items: self.items.clone(),
            total: self.total(),
            item_count: self.item_count(),
        }
    }
}

/// Persisted form of a cart. `total` and `itemCount` are written for readers of the
/// raw record and ignored on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRecord {
    #[serde(default)]
    pub items: Vec<CartLineItem>,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub item_count: u64,
}

impl From<CartRecord> for Cart {
    fn from(record: CartRecord) -> Self {
        Cart {
            items: record.items,
        }
    }
}

/// What checkout needs from the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    pub items: Vec<OrderItem>,
    pub items_price: Decimal,
}
