use crate::model::{PaymentResult, ProductId};
use crate::orders::Transition;

/// Lifecycle actions. Every action answers with the updated order.
#[derive(Debug, Clone)]
pub enum OrderAction {
    Pay(PaymentResult),
    Ship,
    Receive,
    Cancel,
    MarkPaid,
    Refund,
}

impl OrderAction {
    pub fn transition(&self) -> Transition {
        match self {
            OrderAction::Pay(_) => Transition::Pay,
            OrderAction::Ship => Transition::Ship,
            OrderAction::Receive => Transition::Deliver,
            OrderAction::Cancel => Transition::Cancel,
            OrderAction::MarkPaid => Transition::MarkPaid,
            OrderAction::Refund => Transition::Refund,
        }
    }
}

/// Filter for listing orders.
#[derive(Debug, Clone)]
pub enum OrderQuery {
    /// The caller's own orders.
    Mine,
    /// Every order; admins only.
    All,
    /// The caller's paid orders containing the product.
    PurchasedProduct(ProductId),
}
