//! # Persisted Cart Store
//!
//! One cart per identity (the guest plus one per signed-in user), kept in durable
//! storage and written through on every mutation.
//!
//! None of the operations return errors. Invalid input is a silent no-op, storage
//! failures are logged and swallowed, and a record that does not parse (or whose total
//! overflows) loads as an empty cart for that identity. A change that would overflow
//! the total is refused the same way.

mod model;

pub use model::*;

use crate::storage::{SharedStorage, StorageKey};
use std::num::NonZeroU32;
use tracing::{debug, info, warn};

/// The active cart plus the storage it is persisted to.
pub struct CartStore {
    storage: SharedStorage,
    identity: CartIdentity,
    cart: Cart,
}

impl CartStore {
    /// Opens the guest cart.
    pub fn new(storage: SharedStorage) -> Self {
        Self::open(storage, CartIdentity::Guest)
    }

    /// Opens the cart of `identity`, loading its record if there is one.
    pub fn open(storage: SharedStorage, identity: CartIdentity) -> Self {
        let cart = load(&storage, &identity);
        Self {
            storage,
            identity,
            cart,
        }
    }

    pub fn identity(&self) -> &CartIdentity {
        &self.identity
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn items(&self) -> &[CartLineItem] {
        self.cart.items()
    }

    pub fn total(&self) -> rust_decimal::Decimal {
        self.cart.total()
    }

    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// Persists the outgoing cart, then loads the incoming identity's cart.
    pub fn set_identity(&mut self, identity: CartIdentity) {
        if identity == self.identity {
            return;
        }
        self.persist();
        info!(from = %self.identity, to = %identity, "Switching cart identity");
        self.cart = load(&self.storage, &identity);
        self.identity = identity;
    }

    /// Adds `quantity` of `product`, merging into an existing line for the same product.
    pub fn add_item(&mut self, product: CartProduct, quantity: u32) {
        let Some(quantity) = NonZeroU32::new(quantity) else {
            debug!(product = %product.product_id, "Ignoring add with zero quantity");
            return;
        };
        if product.product_id.is_empty() || product.price.is_sign_negative() {
            debug!(product = %product.product_id, "Ignoring add of invalid product");
            return;
        }

        let mut next = self.cart.clone();
        match next
            .items
            .iter_mut()
            .find(|line| line.product_id == product.product_id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity.get()),
            None => next.items.push(CartLineItem {
                product_id: product.product_id,
                name: product.name,
                price: product.price,
                image: product.image,
                quantity,
                cart_item_id: LineId::generate(),
            }),
        }
        self.commit(next);
    }

    pub fn remove_item(&mut self, line: &LineId) {
        let before = self.cart.items.len();
        self.cart.items.retain(|item| &item.cart_item_id != line);
        if self.cart.items.len() != before {
            self.persist();
        }
    }

    pub fn increase_quantity(&mut self, line: &LineId) {
        let Some(index) = self.position(line) else {
            return;
        };
        let mut next = self.cart.clone();
        next.items[index].quantity = next.items[index].quantity.saturating_add(1);
        self.commit(next);
    }

    /// Decreasing a line with quantity 1 removes it.
    pub fn decrease_quantity(&mut self, line: &LineId) {
        let Some(index) = self.position(line) else {
            return;
        };
        match NonZeroU32::new(self.cart.items[index].quantity.get() - 1) {
            Some(quantity) => self.cart.items[index].quantity = quantity,
            None => {
                self.cart.items.remove(index);
            }
        }
        self.persist();
    }

    /// Empties the active cart and removes its record. Other identities are untouched.
    pub fn clear(&mut self) {
        self.cart = Cart::default();
        if let Err(e) = self.storage.remove(&StorageKey::Cart(self.identity.clone())) {
            warn!(identity = %self.identity, error = %e, "Failed to remove cart record");
        }
        info!(identity = %self.identity, "Cart cleared");
    }

    /// Removes every cart record of every identity and empties the active cart.
    pub fn force_clear_all(&mut self) {
        self.cart = Cart::default();
        match self.storage.clear_carts() {
            Ok(removed) => info!(removed, "All cart data cleared"),
            Err(e) => warn!(error = %e, "Failed to clear cart records"),
        }
    }

    pub fn contains_product(&self, product: &crate::model::ProductId) -> bool {
        self.cart.line_for_product(product).is_some()
    }

    /// Re-reads the active identity's record; whatever was last written wins.
    pub fn refresh(&mut self) {
        self.cart = load(&self.storage, &self.identity);
    }

    /// Order lines and subtotal for checkout; `None` when the cart is empty.
    pub fn checkout_snapshot(&self) -> Option<CartSnapshot> {
        if self.cart.is_empty() {
            return None;
        }
        Some(CartSnapshot {
            items: self.cart.items.iter().map(CartLineItem::to_order_item).collect(),
            items_price: self.cart.total(),
        })
    }

    fn position(&self, line: &LineId) -> Option<usize> {
        self.cart.items.iter().position(|i| &i.cart_item_id == line)
    }

    /// Replaces the cart unless its total would overflow.
    fn commit(&mut self, next: Cart) {
        if next.checked_total().is_none() {
            debug!(identity = %self.identity, "Ignoring change that overflows the cart total");
            return;
        }
        self.cart = next;
        self.persist();
    }

    /// An empty cart has no record.
    fn persist(&self) {
        let key = StorageKey::Cart(self.identity.clone());
        if self.cart.is_empty() {
            if let Err(e) = self.storage.remove(&key) {
                warn!(%key, error = %e, "Failed to remove cart record");
            }
            return;
        }
        let record = match serde_json::to_string(&self.cart.to_record()) {
            Ok(record) => record,
            Err(e) => {
                warn!(%key, error = %e, "Failed to encode cart");
                return;
            }
        };
        if let Err(e) = self.storage.write(&key, &record) {
            warn!(%key, error = %e, "Failed to persist cart");
        }
    }
}

fn load(storage: &SharedStorage, identity: &CartIdentity) -> Cart {
    let key = StorageKey::Cart(identity.clone());
    let raw = match storage.read(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Cart::default(),
        Err(e) => {
            warn!(%key, error = %e, "Failed to read cart");
            return Cart::default();
        }
    };
    match serde_json::from_str::<CartRecord>(&raw) {
        Ok(record) => {
            let cart = Cart::from(record);
            if cart.checked_total().is_none() {
                warn!(%key, "Discarding cart record whose total overflows");
                return Cart::default();
            }
            cart
        }
        Err(e) => {
            warn!(%key, error = %e, "Discarding malformed cart record");
            Cart::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProductId, UserId};
    use crate::storage::{MemoryStorage, Storage};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn product(id: &str, cents: i64) -> CartProduct {
        CartProduct {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Decimal::new(cents, 2),
            image: None,
        }
    }

    fn store() -> (CartStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (CartStore::new(storage.clone()), storage)
    }

    fn user(id: &str) -> CartIdentity {
        CartIdentity::User(UserId::new(id))
    }

    #[test]
    fn quantity_walkthrough_keeps_totals_in_step() {
        let (mut cart, _) = store();
        cart.add_item(product("p1", 1000), 2);
        assert_eq!(cart.total(), Decimal::new(2000, 2));
        assert_eq!(cart.item_count(), 2);

        let line = cart.items()[0].cart_item_id.clone();
        cart.increase_quantity(&line);
        assert_eq!(cart.total(), Decimal::new(3000, 2));

        cart.decrease_quantity(&line);
        cart.decrease_quantity(&line);
        assert_eq!(cart.total(), Decimal::new(1000, 2));
        assert_eq!(cart.item_count(), 1);

        cart.decrease_quantity(&line);
        assert!(cart.items().is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn repeat_add_merges_into_one_line() {
        let (mut cart, _) = store();
        cart.add_item(product("p1", 500), 1);
        cart.add_item(product("p1", 500), 3);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity.get(), 4);
    }

    #[test]
    fn invalid_adds_are_ignored() {
        let (mut cart, storage) = store();
        cart.add_item(product("", 500), 1);
        cart.add_item(product("p1", 500), 0);
        cart.add_item(product("p2", -1), 1);

        assert!(cart.items().is_empty());
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn line_ids_are_distinct_from_product_ids() {
        let (mut cart, _) = store();
        cart.add_item(product("p1", 100), 1);
        cart.add_item(product("p2", 100), 1);

        let lines: Vec<_> = cart.items().iter().map(|i| i.cart_item_id.clone()).collect();
        assert_ne!(lines[0], lines[1]);
        assert_ne!(lines[0].as_str(), "p1");
        assert!(cart.contains_product(&ProductId::new("p2")));
        assert!(!cart.contains_product(&ProductId::new("p3")));
    }

    #[test]
    fn unknown_lines_are_no_ops() {
        let (mut cart, _) = store();
        cart.add_item(product("p1", 100), 1);
        let before = cart.cart().clone();

        let ghost = LineId::generate();
        cart.remove_item(&ghost);
        cart.increase_quantity(&ghost);
        cart.decrease_quantity(&ghost);

        assert_eq!(cart.cart(), &before);
    }

    #[test]
    fn switching_identity_restores_each_cart() {
        let (mut cart, _) = store();
        cart.set_identity(user("a"));
        cart.add_item(product("p1", 100), 2);
        let cart_a = cart.cart().clone();

        cart.set_identity(user("b"));
        assert!(cart.items().is_empty());
        cart.add_item(product("p2", 300), 1);

        cart.set_identity(user("a"));
        assert_eq!(cart.cart(), &cart_a);
    }

    #[test]
    fn writes_are_visible_to_a_second_store() {
        let (mut cart, storage) = store();
        cart.add_item(product("p1", 250), 2);

        let other = CartStore::new(storage);
        assert_eq!(other.cart(), cart.cart());
        assert_eq!(other.total(), Decimal::new(500, 2));
    }

    #[test]
    fn persisted_record_carries_totals() {
        let (mut cart, storage) = store();
        cart.add_item(product("p1", 250), 2);

        let raw = storage
            .read(&StorageKey::Cart(CartIdentity::Guest))
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["itemCount"], 2);
        assert_eq!(json["total"].as_f64(), Some(5.0));
        assert_eq!(json["items"][0]["_id"], "p1");
        assert!(json["items"][0]["cartItemId"].is_string());
    }

    #[test]
    fn malformed_record_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let key = StorageKey::Cart(user("u1"));
        storage.write(&key, "{not json").unwrap();
        assert!(CartStore::open(storage.clone(), user("u1")).items().is_empty());

        // A zero quantity cannot be represented and invalidates the record.
        storage
            .write(
                &key,
                r#"{"items":[{"_id":"p1","name":"x","price":1,"quantity":0,"cartItemId":"l1"}]}"#,
            )
            .unwrap();
        assert!(CartStore::open(storage, user("u1")).items().is_empty());
    }

    #[test]
    fn clear_only_touches_the_active_identity() {
        let (mut cart, storage) = store();
        cart.add_item(product("p1", 100), 1);
        cart.set_identity(user("a"));
        cart.add_item(product("p2", 100), 1);

        cart.clear();
        assert!(cart.items().is_empty());
        assert!(storage.read(&StorageKey::Cart(user("a"))).unwrap().is_none());
        assert!(storage
            .read(&StorageKey::Cart(CartIdentity::Guest))
            .unwrap()
            .is_some());
    }

    #[test]
    fn force_clear_removes_every_cart_record() {
        let (mut cart, storage) = store();
        storage.write(&StorageKey::Token, "keep-me").unwrap();
        cart.add_item(product("p1", 100), 1);
        cart.set_identity(user("a"));
        cart.add_item(product("p2", 100), 1);
        cart.set_identity(user("b"));
        cart.add_item(product("p3", 100), 1);

        cart.force_clear_all();

        assert!(cart.items().is_empty());
        let remaining = storage.keys().unwrap();
        assert_eq!(remaining, vec![StorageKey::Token]);
    }

    #[test]
    fn checkout_snapshot_mirrors_lines() {
        let (mut cart, _) = store();
        assert!(cart.checkout_snapshot().is_none());

        cart.add_item(product("p1", 1999), 2);
        cart.add_item(product("p2", 500), 1);
        let snapshot = cart.checkout_snapshot().unwrap();

        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].qty, 2);
        assert_eq!(snapshot.items[1].product, ProductId::new("p2"));
        assert_eq!(snapshot.items_price, Decimal::new(4498, 2));
    }

    #[test]
    fn refresh_picks_up_external_writes() {
        let (mut cart, storage) = store();
        cart.add_item(product("p1", 100), 1);

        let mut other = CartStore::new(storage);
        other.add_item(product("p2", 100), 5);

        cart.refresh();
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn changes_that_overflow_the_total_are_refused() {
        let (mut cart, storage) = store();
        let huge = CartProduct {
            price: Decimal::from_i128_with_scale(10i128.pow(20), 0),
            ..product("p1", 0)
        };
        cart.add_item(huge.clone(), u32::MAX);
        assert!(cart.items().is_empty());
        assert!(storage.keys().unwrap().is_empty());

        cart.add_item(huge, 1);
        cart.add_item(product("p2", 100), 1);
        let before = cart.cart().clone();
        cart.add_item(
            CartProduct {
                price: Decimal::MAX,
                ..product("p3", 0)
            },
            1,
        );
        assert_eq!(cart.cart(), &before);

        let line = cart.items()[0].cart_item_id.clone();
        for _ in 0..3 {
            cart.increase_quantity(&line);
        }
        assert_eq!(cart.items()[0].quantity.get(), 4);
        let expected = Decimal::from_i128_with_scale(4 * 10i128.pow(20), 0) + Decimal::ONE;
        assert_eq!(cart.total(), expected);
    }

    #[test]
    fn record_whose_total_overflows_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let key = StorageKey::Cart(CartIdentity::Guest);
        let record = |quantity: u32| {
            format!(
                concat!(
                    r#"{{"items":[{{"_id":"p1","name":"x","price":1e28,"#,
                    r#""quantity":{quantity},"cartItemId":"l1"}}]}}"#
                ),
                quantity = quantity
            )
        };
        storage.write(&key, &record(1)).unwrap();
        assert_eq!(CartStore::new(storage.clone()).item_count(), 1);

        storage.write(&key, &record(u32::MAX)).unwrap();
        let cart = CartStore::new(storage);
        assert!(cart.items().is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn emptied_carts_leave_no_record_behind() {
        let (mut cart, storage) = store();
        cart.add_item(product("p1", 100), 1);
        cart.set_identity(user("a"));
        cart.add_item(product("p2", 100), 1);

        cart.force_clear_all();
        cart.set_identity(CartIdentity::Guest);
        cart.set_identity(user("a"));
        assert!(storage.keys().unwrap().is_empty());

        cart.add_item(product("p3", 100), 1);
        cart.clear();
        cart.set_identity(CartIdentity::Guest);
        assert!(storage.keys().unwrap().is_empty());

        let line = {
            cart.add_item(product("p4", 100), 1);
            cart.items()[0].cart_item_id.clone()
        };
        cart.decrease_quantity(&line);
        assert!(storage.keys().unwrap().is_empty());
    }
}
