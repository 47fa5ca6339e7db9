use super::book::OrderBook;
use super::error::OrderError;
use super::lifecycle::{GuardError, Role, Transition};
use super::optimistic::Optimistic;
use crate::api::{ApiError, OrderApi};
use crate::model::{Order, OrderDraft, OrderId, PaymentResult};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Client-side order state: cached lists, the order on screen, and the last failure
/// message for the UI.
///
/// Transitions are checked against the cached copy first; a transition whose guard is
/// known to fail is refused without a request. The server's answer then replaces every
/// cached copy.
pub struct OrderStore<A: OrderApi + ?Sized> {
    api: Arc<A>,
    book: OrderBook,
    last_error: Option<String>,
}

impl<A: OrderApi + ?Sized> OrderStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            book: OrderBook::default(),
            last_error: None,
        }
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn my_orders(&self) -> &[Order] {
        &self.book.my_orders
    }

    pub fn all_orders(&self) -> &[Order] {
        &self.book.all_orders
    }

    pub fn current(&self) -> Option<&Order> {
        self.book.current.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Drops every cached order, e.g. when the user changes.
    pub fn reset(&mut self) {
        self.book = OrderBook::default();
        self.last_error = None;
    }

    pub async fn place_order(&mut self, draft: OrderDraft) -> Result<Order, OrderError> {
        let api = Arc::clone(&self.api);
        let order = self.settle(api.place_order(draft).await)?;
        info!(order_id = %order.id, total = %order.total_price, "Order placed");
        self.book.push_front(order.clone());
        Ok(order)
    }

    pub async fn fetch_my_orders(&mut self) -> Result<&[Order], OrderError> {
        let api = Arc::clone(&self.api);
        self.book.my_orders = self.settle(api.my_orders().await)?;
        Ok(&self.book.my_orders)
    }

    /// Admin list of every order.
    pub async fn fetch_all(&mut self) -> Result<&[Order], OrderError> {
        let api = Arc::clone(&self.api);
        self.book.all_orders = self.settle(api.all_orders().await)?;
        Ok(&self.book.all_orders)
    }

    /// Loads an order and makes it current.
    pub async fn fetch_order(&mut self, id: &OrderId) -> Result<Order, OrderError> {
        let api = Arc::clone(&self.api);
        let order = self.settle(api.order(id).await)?;
        self.book.current = Some(order.clone());
        self.book.replace(&order);
        Ok(order)
    }

    /// The owner pays.
    pub async fn pay(
        &mut self,
        id: &OrderId,
        payment: PaymentResult,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        let api = Arc::clone(&self.api);
        self.transition(id, Transition::Pay, Role::Customer, now, api.pay_order(id, payment))
            .await
    }

    pub async fn cancel(
        &mut self,
        id: &OrderId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        let api = Arc::clone(&self.api);
        self.transition(id, Transition::Cancel, role, now, api.cancel_order(id))
            .await
    }

    pub async fn ship(&mut self, id: &OrderId, now: DateTime<Utc>) -> Result<Order, OrderError> {
        let api = Arc::clone(&self.api);
        self.transition(id, Transition::Ship, Role::Admin, now, api.ship_order(id))
            .await
    }

    pub async fn mark_delivered(
        &mut self,
        id: &OrderId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        let api = Arc::clone(&self.api);
        self.transition(id, Transition::Deliver, role, now, api.receive_order(id))
            .await
    }

    /// Admin delete. The order disappears from every cached list.
    pub async fn delete(&mut self, id: &OrderId, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.guard(id, Transition::Delete, Role::Admin, now)?;
        let api = Arc::clone(&self.api);
        self.settle(api.delete_order(id).await)?;
        self.book.remove(id);
        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    /// Admin mark-paid, shown optimistically.
    pub async fn mark_paid(
        &mut self,
        id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<Optimistic<Order, ApiError>, OrderError> {
        let api = Arc::clone(&self.api);
        self.optimistic(id, Transition::MarkPaid, now, api.mark_paid(id))
            .await
    }

    /// Admin refund of a cancelled paid order, shown optimistically.
    pub async fn refund(
        &mut self,
        id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<Optimistic<Order, ApiError>, OrderError> {
        let api = Arc::clone(&self.api);
        self.optimistic(id, Transition::Refund, now, api.refund_order(id))
            .await
    }

    async fn transition(
        &mut self,
        id: &OrderId,
        transition: Transition,
        role: Role,
        now: DateTime<Utc>,
        request: impl Future<Output = Result<Order, ApiError>>,
    ) -> Result<Order, OrderError> {
        self.guard(id, transition, role, now)?;
        let order = self.settle(request.await)?;
        info!(order_id = %order.id, %transition, stage = %order.stage(), "Order updated");
        self.book.replace(&order);
        Ok(order)
    }

    /// Applies the effect locally, then commits the server's snapshot or restores the
    /// book exactly as it was.
    async fn optimistic(
        &mut self,
        id: &OrderId,
        transition: Transition,
        now: DateTime<Utc>,
        request: impl Future<Output = Result<Order, ApiError>>,
    ) -> Result<Optimistic<Order, ApiError>, OrderError> {
        let prior = match self.book.find(id) {
            Some(order) => order.clone(),
            None => self.fetch_order(id).await?,
        };
        if let Err(e) = transition.check(&prior, Role::Admin, now) {
            return Err(self.refuse(e));
        }

        let snapshot = self.book.clone();
        let pending = Optimistic::begin(prior, |order| transition.apply(order, now));
        self.book.replace(pending.current());

        match request.await {
            Ok(confirmed) => {
                info!(order_id = %id, %transition, "Optimistic update committed");
                self.book.replace(&confirmed);
                self.last_error = None;
                Ok(pending.commit(confirmed))
            }
            Err(e) => {
                warn!(order_id = %id, %transition, error = %e, "Optimistic update rolled back");
                self.book = snapshot;
                self.last_error = Some(e.message.clone());
                Ok(pending.roll_back(e))
            }
        }
    }

    /// Checks the transition against the cached copy, if any. Uncached orders are left
    /// to the server.
    fn guard(
        &mut self,
        id: &OrderId,
        transition: Transition,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        let verdict = match self.book.find(id) {
            Some(order) => transition.check(order, role, now),
            None => Ok(()),
        };
        verdict.map_err(|e| self.refuse(e))
    }

    fn refuse(&mut self, error: GuardError) -> OrderError {
        warn!(%error, "Transition refused locally");
        self.last_error = Some(error.to_string());
        OrderError::Guard(error)
    }

    fn settle<T>(&mut self, result: Result<T, ApiError>) -> Result<T, OrderError> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind, "Order request failed");
                self.last_error = Some(e.message.clone());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::ApiErrorKind;
    use crate::orders::lifecycle::tests::placed_at;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory stand-in for the remote order endpoints. It applies transitions
    /// without guards so tests can tell local refusals from remote ones.
    #[derive(Default)]
    pub(crate) struct FakeOrders {
        pub orders: Mutex<Vec<Order>>,
        pub failure: Mutex<Option<ApiError>>,
        pub calls: AtomicUsize,
    }

    impl FakeOrders {
        pub fn with(orders: Vec<Order>) -> Self {
            Self {
                orders: Mutex::new(orders),
                ..Self::default()
            }
        }

        pub fn fail_with(&self, status: u16) {
            *self.failure.lock().unwrap() = Some(ApiError::from_response(status, "", false));
        }

        fn call(&self) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.failure.lock().unwrap().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        fn change(&self, id: &OrderId, transition: Transition) -> Result<Order, ApiError> {
            self.call()?;
            let mut orders = self.orders.lock().unwrap();
            let order = orders
                .iter_mut()
                .find(|o| &o.id == id)
                .ok_or_else(|| ApiError::from_response(404, "", false))?;
            transition.apply(order, Utc::now());
            Ok(order.clone())
        }
    }

    #[async_trait]
    impl OrderApi for FakeOrders {
        async fn place_order(&self, draft: OrderDraft) -> Result<Order, ApiError> {
            self.call()?;
            let mut orders = self.orders.lock().unwrap();
            let mut order = placed_at(Utc::now());
            order.id = OrderId::from(orders.len() as u32 + 1);
            order.order_items = draft.order_items;
            order.items_price = draft.items_price;
            order.tax_price = draft.tax_price;
            order.total_price = draft.total_price;
            orders.push(order.clone());
            Ok(order)
        }
        async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
            self.call()?;
            Ok(self.orders.lock().unwrap().clone())
        }
        async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
            self.call()?;
            let orders = self.orders.lock().unwrap();
            orders
                .iter()
                .find(|o| &o.id == id)
                .cloned()
                .ok_or_else(|| ApiError::from_response(404, "", false))
        }
        async fn all_orders(&self) -> Result<Vec<Order>, ApiError> {
            self.my_orders().await
        }
        async fn pay_order(&self, id: &OrderId, _: PaymentResult) -> Result<Order, ApiError> {
            self.change(id, Transition::Pay)
        }
        async fn ship_order(&self, id: &OrderId) -> Result<Order, ApiError> {
            self.change(id, Transition::Ship)
        }
        async fn receive_order(&self, id: &OrderId) -> Result<Order, ApiError> {
            self.change(id, Transition::Deliver)
        }
        async fn cancel_order(&self, id: &OrderId) -> Result<Order, ApiError> {
            self.change(id, Transition::Cancel)
        }
        async fn mark_paid(&self, id: &OrderId) -> Result<Order, ApiError> {
            self.change(id, Transition::MarkPaid)
        }
        async fn refund_order(&self, id: &OrderId) -> Result<Order, ApiError> {
            self.change(id, Transition::Refund)
        }
        async fn delete_order(&self, id: &OrderId) -> Result<(), ApiError> {
            self.call()?;
            self.orders.lock().unwrap().retain(|o| &o.id != id);
            Ok(())
        }
    }

    fn store_with(order: Order) -> (Arc<FakeOrders>, OrderStore<FakeOrders>) {
        let api = Arc::new(FakeOrders::with(vec![order]));
        (api.clone(), OrderStore::new(api))
    }

    #[tokio::test]
    async fn transitions_replace_every_cached_copy() {
        let (_, mut store) = store_with(placed_at(Utc::now()));
        let id = OrderId::from(1);
        store.fetch_my_orders().await.unwrap();
        store.fetch_all().await.unwrap();
        store.fetch_order(&id).await.unwrap();

        let paid = store
            .pay(&id, PaymentResult::default(), Utc::now())
            .await
            .unwrap();
        assert!(paid.is_paid);
        assert!(store.my_orders()[0].is_paid);
        assert!(store.all_orders()[0].is_paid);
        assert!(store.current().unwrap().is_paid);
    }

    #[tokio::test]
    async fn known_guard_failures_never_reach_the_server() {
        let created = Utc::now() - Duration::hours(25);
        let mut order = placed_at(created);
        order.is_paid = true;
        let (api, mut store) = store_with(order);
        let id = OrderId::from(1);
        store.fetch_my_orders().await.unwrap();
        let calls = api.calls.load(Ordering::SeqCst);

        let refused = store.cancel(&id, Role::Customer, Utc::now()).await;
        assert_eq!(
            refused,
            Err(OrderError::Guard(GuardError::CancelWindowElapsed))
        );
        assert_eq!(api.calls.load(Ordering::SeqCst), calls);
        assert!(!store.my_orders()[0].is_cancelled);
        assert!(store.last_error().unwrap().contains("24 hours"));
    }

    #[tokio::test]
    async fn mark_paid_commits_the_server_snapshot() {
        let (_, mut store) = store_with(placed_at(Utc::now()));
        let id = OrderId::from(1);
        store.fetch_all().await.unwrap();

        let outcome = store.mark_paid(&id, Utc::now()).await.unwrap();
        assert!(outcome.is_committed());
        assert!(outcome.current().is_paid);
        assert_eq!(store.all_orders()[0], *outcome.current());
    }

    #[tokio::test]
    async fn mark_paid_rolls_back_to_the_exact_prior_book() {
        let (api, mut store) = store_with(placed_at(Utc::now()));
        let id = OrderId::from(1);
        store.fetch_all().await.unwrap();
        store.fetch_order(&id).await.unwrap();
        let before = store.book().clone();

        api.fail_with(500);
        let outcome = store.mark_paid(&id, Utc::now()).await.unwrap();

        let Optimistic::RolledBack { restored, error } = outcome else {
            panic!("expected a rollback");
        };
        assert!(!restored.is_paid);
        assert_eq!(error.kind, ApiErrorKind::Server);
        assert_eq!(store.book(), &before);
        assert_eq!(store.last_error(), Some(error.message.as_str()));
    }

    #[tokio::test]
    async fn refund_of_an_uncached_order_fetches_it_first() {
        let mut order = placed_at(Utc::now());
        order.is_paid = true;
        order.is_cancelled = true;
        let (_, mut store) = store_with(order);

        let outcome = store.refund(&OrderId::from(1), Utc::now()).await.unwrap();
        assert!(outcome.is_committed());
        assert!(store.current().unwrap().is_refunded);
    }

    #[tokio::test]
    async fn refund_is_refused_unless_cancelled() {
        let (api, mut store) = store_with(placed_at(Utc::now()));
        store.fetch_all().await.unwrap();
        let calls = api.calls.load(Ordering::SeqCst);

        let refused = store.refund(&OrderId::from(1), Utc::now()).await;
        assert_eq!(refused, Err(OrderError::Guard(GuardError::NotCancelled)));
        assert_eq!(api.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn failed_refund_restores_the_prior_book() {
        let mut order = placed_at(Utc::now());
        order.is_paid = true;
        order.is_cancelled = true;
        let (api, mut store) = store_with(order);
        let id = OrderId::from(1);
        store.fetch_all().await.unwrap();
        store.fetch_order(&id).await.unwrap();
        let before = store.book().clone();

        api.fail_with(500);
        let outcome = store.refund(&id, Utc::now()).await.unwrap();

        let Optimistic::RolledBack { restored, error } = outcome else {
            panic!("expected a rollback");
        };
        assert!(!restored.is_refunded);
        assert_eq!(restored.refund_amount, None);
        assert_eq!(error.kind, ApiErrorKind::Server);
        assert_eq!(store.book(), &before);
        assert!(!store.current().unwrap().is_refunded);
        assert!(!store.all_orders()[0].is_refunded);
    }

    #[tokio::test]
    async fn remote_failures_set_the_ui_message() {
        let (api, mut store) = store_with(placed_at(Utc::now()));
        api.fail_with(403);

        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, OrderError::Api(ref e) if e.kind == ApiErrorKind::Forbidden));
        assert_eq!(
            store.last_error(),
            Some("You don't have permission to perform this action.")
        );
    }

    #[tokio::test]
    async fn delete_removes_the_order_everywhere() {
        let (_, mut store) = store_with(placed_at(Utc::now()));
        let id = OrderId::from(1);
        store.fetch_all().await.unwrap();
        store.fetch_order(&id).await.unwrap();

        store.delete(&id, Utc::now()).await.unwrap();
        assert!(store.all_orders().is_empty());
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn placed_orders_become_current_and_newest() {
        let (_, mut store) = store_with(placed_at(Utc::now()));
        store.fetch_my_orders().await.unwrap();

        let draft = OrderDraft {
            order_items: Vec::new(),
            shipping_address: Default::default(),
            payment_method: "PayPal".into(),
            items_price: Default::default(),
            tax_price: Default::default(),
            shipping_price: Default::default(),
            total_price: Default::default(),
        };
        let placed = store.place_order(draft).await.unwrap();
        assert_eq!(store.my_orders()[0].id, placed.id);
        assert_eq!(store.current().map(|o| &o.id), Some(&placed.id));
    }
}
