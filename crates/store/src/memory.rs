use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, Money, OrderId, OrderItemId, ProductId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::records::{Customer, Order, OrderItem, OrderStatus, PaymentMethod, Product};
use crate::store::{Store, StoreTx};
use crate::{Result, StoreError};

#[derive(Debug, Clone, Default)]
struct StoreState {
    products: HashMap<ProductId, Product>,
    customers: HashMap<CustomerId, Customer>,
    orders: Vec<Order>,
}

/// In-memory store implementation for tests and local runs.
///
/// Provides the same interface as the PostgreSQL implementation. A
/// transaction holds the state lock for its whole lifetime and stages its
/// writes, committing by writing the staged state back. Transactions
/// therefore serialize against each other, which preserves the atomicity
/// and conditional-decrement guarantees of the real store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product. Seeding helper, not part of [`Store`].
    pub async fn insert_product(&self, product: Product) {
        let mut state = self.state.lock().await;
        state.products.insert(product.id.clone(), product);
    }

    /// Adds or replaces a customer. Seeding helper, not part of [`Store`].
    pub async fn insert_customer(&self, customer: Customer) {
        let mut state = self.state.lock().await;
        state.customers.insert(customer.id, customer);
    }

    /// Returns the current stock of a product.
    pub async fn product_stock(&self, id: &ProductId) -> Option<u32> {
        let state = self.state.lock().await;
        state.products.get(id).map(|p| p.stock_quantity)
    }

    /// Returns the total number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTx { guard, staged }))
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state.products.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let state = self.state.lock().await;
        Ok(state.customers.get(&id).cloned())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// An in-progress transaction over the in-memory state.
///
/// Writes go to the staged copy; commit publishes it under the held lock,
/// dropping without commit discards it.
struct InMemoryTx {
    guard: OwnedMutexGuard<StoreState>,
    staged: StoreState,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn get_product(&mut self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.staged.products.get(id).cloned())
    }

    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        total: Money,
        status: OrderStatus,
        payment_method: PaymentMethod,
    ) -> Result<Order> {
        let order = Order {
            id: OrderId::new(),
            customer_id,
            created_at: Utc::now(),
            total,
            status,
            payment_method,
            items: Vec::new(),
        };
        self.staged.orders.push(order.clone());
        Ok(order)
    }

    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product_id: &ProductId,
        product_name: &str,
        quantity: u32,
        price_at_purchase: Money,
    ) -> Result<OrderItem> {
        let item = OrderItem {
            id: OrderItemId::new(),
            order_id,
            product_id: product_id.clone(),
            product_name: product_name.to_string(),
            quantity,
            price_at_purchase,
        };

        let order = self
            .staged
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.items.push(item.clone());
        Ok(item)
    }

    async fn decrement_stock_if_available(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<bool> {
        match self.staged.products.get_mut(product_id) {
            Some(product) if product.stock_quantity >= quantity => {
                product.stock_quantity -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        let mut guard = this.guard;
        *guard = this.staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        // Staged writes are discarded with the transaction.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(stock: u32) -> Product {
        Product {
            id: ProductId::new("SKU-001"),
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            price: Money::from_cents(999),
            stock_quantity: stock,
        }
    }

    #[tokio::test]
    async fn decrement_succeeds_when_stock_suffices() {
        let store = InMemoryStore::new();
        store.insert_product(widget(5)).await;

        let mut tx = store.begin().await.unwrap();
        let ok = tx
            .decrement_stock_if_available(&ProductId::new("SKU-001"), 3)
            .await
            .unwrap();
        assert!(ok);
        tx.commit().await.unwrap();

        assert_eq!(store.product_stock(&ProductId::new("SKU-001")).await, Some(2));
    }

    #[tokio::test]
    async fn decrement_refuses_and_leaves_stock_unchanged_when_short() {
        let store = InMemoryStore::new();
        store.insert_product(widget(2)).await;

        let mut tx = store.begin().await.unwrap();
        let ok = tx
            .decrement_stock_if_available(&ProductId::new("SKU-001"), 3)
            .await
            .unwrap();
        assert!(!ok);
        tx.commit().await.unwrap();

        assert_eq!(store.product_stock(&ProductId::new("SKU-001")).await, Some(2));
    }

    #[tokio::test]
    async fn rollback_discards_order_and_decrement() {
        let store = InMemoryStore::new();
        store.insert_product(widget(5)).await;
        let customer_id = CustomerId::new();

        let mut tx = store.begin().await.unwrap();
        let order = tx
            .insert_order(
                customer_id,
                Money::from_cents(999),
                OrderStatus::Pending,
                PaymentMethod::CashOnDelivery,
            )
            .await
            .unwrap();
        tx.insert_order_item(
            order.id,
            &ProductId::new("SKU-001"),
            "Widget",
            1,
            Money::from_cents(999),
        )
        .await
        .unwrap();
        tx.decrement_stock_if_available(&ProductId::new("SKU-001"), 1)
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.product_stock(&ProductId::new("SKU-001")).await, Some(5));
    }

    #[tokio::test]
    async fn dropping_uncommitted_tx_rolls_back() {
        let store = InMemoryStore::new();
        store.insert_product(widget(5)).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.decrement_stock_if_available(&ProductId::new("SKU-001"), 5)
                .await
                .unwrap();
            // tx dropped without commit
        }

        assert_eq!(store.product_stock(&ProductId::new("SKU-001")).await, Some(5));
    }

    #[tokio::test]
    async fn commit_publishes_order_with_items() {
        let store = InMemoryStore::new();
        store.insert_product(widget(5)).await;
        let customer_id = CustomerId::new();

        let mut tx = store.begin().await.unwrap();
        let order = tx
            .insert_order(
                customer_id,
                Money::from_cents(1998),
                OrderStatus::Pending,
                PaymentMethod::Card,
            )
            .await
            .unwrap();
        tx.insert_order_item(
            order.id,
            &ProductId::new("SKU-001"),
            "Widget",
            2,
            Money::from_cents(999),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.item_count(), 1);
        assert_eq!(stored.items[0].quantity, 2);
        assert_eq!(stored.total.cents(), 1998);
    }

    #[tokio::test]
    async fn insert_item_for_unknown_order_fails() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let result = tx
            .insert_order_item(
                OrderId::new(),
                &ProductId::new("SKU-001"),
                "Widget",
                1,
                Money::from_cents(999),
            )
            .await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn update_order_status_transitions() {
        let store = InMemoryStore::new();
        let customer_id = CustomerId::new();

        let mut tx = store.begin().await.unwrap();
        let order = tx
            .insert_order(
                customer_id,
                Money::zero(),
                OrderStatus::Pending,
                PaymentMethod::CashOnDelivery,
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(store
            .update_order_status(order.id, OrderStatus::Completed)
            .await
            .unwrap());
        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);

        assert!(!store
            .update_order_status(OrderId::new(), OrderStatus::Cancelled)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn orders_for_customer_newest_first() {
        let store = InMemoryStore::new();
        let customer_id = CustomerId::new();
        let other = CustomerId::new();

        for customer in [customer_id, other, customer_id] {
            let mut tx = store.begin().await.unwrap();
            tx.insert_order(
                customer,
                Money::zero(),
                OrderStatus::Pending,
                PaymentMethod::CashOnDelivery,
            )
            .await
            .unwrap();
            tx.commit().await.unwrap();
        }

        let orders = store.orders_for_customer(customer_id).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders[0].created_at >= orders[1].created_at);
    }
}
