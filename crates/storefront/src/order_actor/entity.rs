//! [`ResourceEntity`] implementation for [`Order`].
//!
//! `on_create` is where the cross-actor work happens: it validates the owner with the
//! User actor and reserves stock with the Product actor. Lifecycle actions run the
//! shared transition table as the authority.

use super::actions::{OrderAction, OrderQuery};
use super::error::OrderRejection;
use crate::clients::{Principal, ProductClient, UserClient};
use crate::model::{Order, OrderDraft, OrderId, ProductId};
use crate::orders::{PriceBreakdown, Role, Transition};
use crate::product_actor::ProductError;
use async_trait::async_trait;
use chrono::Utc;
use resource_framework::{ResourceEntity, ResourceHandle};
use tracing::{debug, warn};

async fn release_all(products: &ProductClient, reserved: &[(ProductId, u32)]) {
    for (id, quantity) in reserved {
        if let Err(e) = products.release_stock(id.clone(), *quantity).await {
            warn!(product_id = %id, quantity, error = %e, "Failed to release stock");
        }
    }
}

fn acting_role(principal: &Principal) -> Result<Role, OrderRejection> {
    principal.role().ok_or(OrderRejection::Unauthenticated)
}

impl Order {
    fn reserved_lines(&self) -> Vec<(ProductId, u32)> {
        self.order_items
            .iter()
            .map(|item| (item.product.clone(), item.qty))
            .collect()
    }

    fn readable_by(&self, principal: &Principal) -> bool {
        principal.is_privileged() || principal.is(self.owner())
    }

    /// Reprices the lines from the catalog and reserves their stock, all or nothing.
    async fn reserve_lines(&mut self, products: &ProductClient) -> Result<(), OrderRejection> {
        let mut reserved: Vec<(ProductId, u32)> = Vec::new();
        for item in &mut self.order_items {
            let product = match products.fetch(item.product.clone(), Principal::System).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    release_all(products, &reserved).await;
                    return Err(OrderRejection::InvalidProduct(item.product.to_string()));
                }
                Err(e) => {
                    release_all(products, &reserved).await;
                    return Err(OrderRejection::ActorCommunicationError(e.to_string()));
                }
            };

            if let Err(e) = products.reserve_stock(item.product.clone(), item.qty).await {
                release_all(products, &reserved).await;
                return Err(match e {
                    ProductError::InsufficientStock { available, .. } => {
                        OrderRejection::InsufficientStock(format!(
                            "{} has only {available} left",
                            product.name
                        ))
                    }
                    other => OrderRejection::ActorCommunicationError(other.to_string()),
                });
            }
            reserved.push((item.product.clone(), item.qty));

            item.name = product.name;
            item.price = product.price;
            if item.image.is_empty() {
                item.image = product.image;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceEntity for Order {
    type Id = OrderId;
    type Create = OrderDraft;
    type Update = ();
    type Action = OrderAction;
    type ActionResult = Order;
    type Query = OrderQuery;
    type Principal = Principal;
    type Context = (UserClient, ProductClient);
    type Error = OrderRejection;

    fn from_create_params(
        id: OrderId,
        draft: OrderDraft,
        principal: &Principal,
    ) -> Result<Self, OrderRejection> {
        let owner = principal
            .user_id()
            .cloned()
            .ok_or(OrderRejection::Unauthenticated)?;
        if draft.order_items.is_empty() {
            return Err(OrderRejection::EmptyOrder);
        }
        if let Some(item) = draft.order_items.iter().find(|i| i.qty == 0) {
            return Err(OrderRejection::InvalidQuantity(item.name.clone()));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            user: owner.into(),
            order_items: draft.order_items,
            shipping_address: draft.shipping_address,
            payment_method: draft.payment_method,
            payment_result: None,
            items_price: draft.items_price,
            tax_price: draft.tax_price,
            shipping_price: draft.shipping_price,
            total_price: draft.total_price,
            is_paid: false,
            paid_at: None,
            is_shipped: false,
            shipped_at: None,
            is_delivered: false,
            delivered_at: None,
            is_cancelled: false,
            cancelled_at: None,
            is_refunded: false,
            refunded_at: None,
            refund_amount: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validates the owner, reserves stock and recomputes the totals from catalog
    /// prices. Client-side totals are not trusted.
    async fn on_create(
        &mut self,
        _principal: &Principal,
        ctx: &(UserClient, ProductClient),
    ) -> Result<(), OrderRejection> {
        let (users, products) = ctx;
        debug!(user_id = %self.owner(), "Validating order owner");
        match users.fetch(self.owner().clone(), Principal::System).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(OrderRejection::InvalidUser(self.owner().to_string())),
            Err(e) => return Err(OrderRejection::ActorCommunicationError(e.to_string())),
        }

        self.reserve_lines(products).await?;

        let prices = PriceBreakdown::of(&self.order_items);
        self.items_price = prices.items;
        self.tax_price = prices.tax;
        self.shipping_price = prices.shipping;
        self.total_price = prices.total;
        Ok(())
    }

    fn authorize_read(&self, principal: &Principal) -> Result<(), OrderRejection> {
        acting_role(principal)?;
        if self.readable_by(principal) {
            Ok(())
        } else {
            Err(OrderRejection::Forbidden)
        }
    }

    fn matches(&self, query: &OrderQuery, principal: &Principal) -> bool {
        match query {
            OrderQuery::Mine => principal.is(self.owner()),
            OrderQuery::All => principal.is_privileged(),
            OrderQuery::PurchasedProduct(product) => {
                principal.is(self.owner()) && self.is_paid && self.contains_product(product)
            }
        }
    }

    async fn on_update(
        &mut self,
        _update: (),
        _principal: &Principal,
        _ctx: &(UserClient, ProductClient),
    ) -> Result<(), OrderRejection> {
        Err(OrderRejection::Immutable)
    }

    /// Stock still held by the order goes back to the catalog; a cancelled order
    /// already returned it.
    async fn on_delete(
        &self,
        principal: &Principal,
        ctx: &(UserClient, ProductClient),
    ) -> Result<(), OrderRejection> {
        let role = acting_role(principal)?;
        Transition::Delete.check(self, role, Utc::now())?;
        if !self.is_cancelled {
            release_all(&ctx.1, &self.reserved_lines()).await;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: OrderAction,
        principal: &Principal,
        ctx: &(UserClient, ProductClient),
    ) -> Result<Order, OrderRejection> {
        let role = acting_role(principal)?;
        if role == Role::Customer && !principal.is(self.owner()) {
            return Err(OrderRejection::Forbidden);
        }

        let transition = action.transition();
        let now = Utc::now();
        transition.check(self, role, now)?;
        if let OrderAction::Pay(payment) = action {
            self.payment_result = Some(payment);
        }
        transition.apply(self, now);

        if transition == Transition::Cancel {
            release_all(&ctx.1, &self.reserved_lines()).await;
        }
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderItem, ShippingAddress, UserId};
    use rust_decimal::Decimal;

    fn line(product: u32, qty: u32) -> OrderItem {
        OrderItem {
            name: format!("Item {product}"),
            image: String::new(),
            price: Decimal::new(1000, 2),
            product: ProductId::from(product),
            qty,
        }
    }

    fn draft(items: Vec<OrderItem>) -> OrderDraft {
        OrderDraft {
            order_items: items,
            shipping_address: ShippingAddress::default(),
            payment_method: "PayPal".into(),
            items_price: Decimal::ZERO,
            tax_price: Decimal::ZERO,
            shipping_price: Decimal::ZERO,
            total_price: Decimal::ZERO,
        }
    }

    fn owner() -> Principal {
        Principal::Customer(UserId::from(1))
    }

    fn order() -> Order {
        Order::from_create_params(OrderId::from(1), draft(vec![line(7, 2)]), &owner()).unwrap()
    }

    #[test]
    fn creation_needs_a_signed_in_owner_and_real_lines() {
        let err = Order::from_create_params(
            OrderId::from(1),
            draft(vec![line(7, 1)]),
            &Principal::Anonymous,
        )
        .unwrap_err();
        assert_eq!(err, OrderRejection::Unauthenticated);

        let err =
            Order::from_create_params(OrderId::from(1), draft(vec![]), &owner()).unwrap_err();
        assert_eq!(err, OrderRejection::EmptyOrder);

        let err = Order::from_create_params(
            OrderId::from(1),
            draft(vec![line(7, 1), line(8, 0)]),
            &owner(),
        )
        .unwrap_err();
        assert_eq!(err, OrderRejection::InvalidQuantity("Item 8".into()));

        let order = order();
        assert_eq!(order.owner(), &UserId::from(1));
        assert!(!order.is_paid && !order.is_cancelled);
    }

    #[test]
    fn only_the_owner_and_admins_read_an_order() {
        let order = order();
        assert!(order.authorize_read(&owner()).is_ok());
        assert!(order
            .authorize_read(&Principal::Admin(UserId::from(9)))
            .is_ok());
        assert_eq!(
            order.authorize_read(&Principal::Customer(UserId::from(2))),
            Err(OrderRejection::Forbidden)
        );
        assert_eq!(
            order.authorize_read(&Principal::Anonymous),
            Err(OrderRejection::Unauthenticated)
        );
    }

    #[test]
    fn queries_scope_by_caller() {
        let mut order = order();
        let admin = Principal::Admin(UserId::from(9));
        let stranger = Principal::Customer(UserId::from(2));

        assert!(order.matches(&OrderQuery::Mine, &owner()));
        assert!(!order.matches(&OrderQuery::Mine, &stranger));
        assert!(order.matches(&OrderQuery::All, &admin));
        assert!(!order.matches(&OrderQuery::All, &owner()));

        let bought = OrderQuery::PurchasedProduct(ProductId::from(7));
        assert!(!order.matches(&bought, &owner()));
        order.is_paid = true;
        assert!(order.matches(&bought, &owner()));
        assert!(!order.matches(&bought, &stranger));
        assert!(!order.matches(&OrderQuery::PurchasedProduct(ProductId::from(8)), &owner()));
    }
}
