use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use storefront::cart::{CartIdentity, CartProduct, CartStore};
use storefront::model::ProductId;
use storefront::storage::{MemoryStorage, SharedStorage};

const PRICES: [i64; 4] = [1999, 450, 10000, 1];

#[derive(Debug, Clone)]
enum Op {
    Add { product: usize, quantity: u32 },
    Increase(usize),
    Decrease(usize),
    Remove(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..PRICES.len(), 0u32..5)
            .prop_map(|(product, quantity)| Op::Add { product, quantity }),
        1 => (0usize..6).prop_map(Op::Increase),
        1 => (0usize..6).prop_map(Op::Decrease),
        1 => (0usize..6).prop_map(Op::Remove),
    ]
}

fn catalog_product(index: usize) -> CartProduct {
    CartProduct {
        product_id: ProductId::from(index as u32 + 1),
        name: format!("Product {index}"),
        price: Decimal::new(PRICES[index], 2),
        image: None,
    }
}

proptest! {
    /// Whatever the shopper does, the cart holds one line per product, its totals
    /// are derived from the lines, and the stored record matches what is shown.
    #[test]
    fn cart_totals_follow_lines(ops in prop::collection::vec(op(), 0..40)) {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let mut cart = CartStore::new(storage.clone());
        let mut expected: BTreeMap<ProductId, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Add { product, quantity } => {
                    let item = catalog_product(product);
                    if quantity > 0 {
                        *expected.entry(item.product_id.clone()).or_default() += quantity;
                    }
                    cart.add_item(item, quantity);
                }
                Op::Increase(index) => {
                    if let Some(line) = cart.items().get(index).cloned() {
                        *expected.entry(line.product_id).or_default() += 1;
                        cart.increase_quantity(&line.cart_item_id);
                    }
                }
                Op::Decrease(index) => {
                    if let Some(line) = cart.items().get(index).cloned() {
                        let left = expected.get(&line.product_id).copied().unwrap_or(0) - 1;
                        if left == 0 {
                            expected.remove(&line.product_id);
                        } else {
                            expected.insert(line.product_id.clone(), left);
                        }
                        cart.decrease_quantity(&line.cart_item_id);
                    }
                }
                Op::Remove(index) => {
                    if let Some(line) = cart.items().get(index).cloned() {
                        expected.remove(&line.product_id);
                        cart.remove_item(&line.cart_item_id);
                    }
                }
            }

            let shown: BTreeMap<ProductId, u32> = cart
                .items()
                .iter()
                .map(|line| (line.product_id.clone(), line.quantity.get()))
                .collect();
            prop_assert_eq!(shown.len(), cart.items().len());
            prop_assert_eq!(&shown, &expected);

            let total: Decimal = cart
                .items()
                .iter()
                .map(|line| line.price * Decimal::from(line.quantity.get()))
                .sum();
            prop_assert_eq!(cart.total(), total);
            let count: u64 = expected.values().map(|&q| u64::from(q)).sum();
            prop_assert_eq!(cart.item_count(), count);
        }

        let reopened = CartStore::open(storage, CartIdentity::Guest);
        prop_assert_eq!(reopened.items(), cart.items());
    }
}
