use crate::model::{Order, OrderId};

/// Cached order lists: the customer's orders, the admin list, and the order on
/// screen. The same order may sit in all three.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBook {
    pub my_orders: Vec<Order>,
    pub all_orders: Vec<Order>,
    pub current: Option<Order>,
}

impl OrderBook {
    /// Any cached copy of the order.
    pub fn find(&self, id: &OrderId) -> Option<&Order> {
        self.current
            .iter()
            .chain(&self.my_orders)
            .chain(&self.all_orders)
            .find(|o| &o.id == id)
    }

    /// Replaces every cached copy of `order` with it.
    pub fn replace(&mut self, order: &Order) {
        for slot in self
            .my_orders
            .iter_mut()
            .chain(self.all_orders.iter_mut())
            .chain(self.current.iter_mut())
            .filter(|o| o.id == order.id)
        {
            *slot = order.clone();
        }
    }

    /// Applies `change` to every cached copy of the order.
    pub fn update(&mut self, id: &OrderId, change: impl Fn(&mut Order)) {
        for slot in self
            .my_orders
            .iter_mut()
            .chain(self.all_orders.iter_mut())
            .chain(self.current.iter_mut())
            .filter(|o| &o.id == id)
        {
            change(slot);
        }
    }

    pub fn remove(&mut self, id: &OrderId) {
        self.my_orders.retain(|o| &o.id != id);
        self.all_orders.retain(|o| &o.id != id);
        if self.current.as_ref().is_some_and(|o| &o.id == id) {
            self.current = None;
        }
    }

    /// Records a freshly placed order as the newest of mine and as current.
    pub fn push_front(&mut self, order: Order) {
        self.my_orders.insert(0, order.clone());
        self.current = Some(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::lifecycle::tests::placed_at;
    use chrono::Utc;

    #[test]
    fn replace_touches_every_copy() {
        let order = placed_at(Utc::now());
        let mut book = OrderBook {
            my_orders: vec![order.clone()],
            all_orders: vec![order.clone()],
            current: Some(order.clone()),
        };
        let mut paid = order.clone();
        paid.is_paid = true;

        book.replace(&paid);
        assert!(book.my_orders[0].is_paid);
        assert!(book.all_orders[0].is_paid);
        assert_eq!(book.current.as_ref(), Some(&paid));
    }

    #[test]
    fn remove_clears_current_only_when_it_matches() {
        let order = placed_at(Utc::now());
        let mut other = order.clone();
        other.id = OrderId::from(2);
        let mut book = OrderBook {
            my_orders: vec![order.clone(), other.clone()],
            all_orders: Vec::new(),
            current: Some(other.clone()),
        };

        book.remove(&order.id);
        assert_eq!(book.my_orders, vec![other.clone()]);
        assert_eq!(book.current, Some(other.clone()));

        book.remove(&other.id);
        assert!(book.current.is_none());
        assert!(book.find(&other.id).is_none());
    }
}
