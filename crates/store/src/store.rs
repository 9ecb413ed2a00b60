use async_trait::async_trait;
use common::{CustomerId, Money, OrderId, ProductId};

use crate::records::{Customer, Order, OrderItem, OrderStatus, PaymentMethod, Product};
use crate::Result;

/// Core trait for storefront persistence backends.
///
/// All implementations must be thread-safe (Send + Sync). Read operations
/// run outside any transaction; writes that must be atomic go through a
/// [`StoreTx`] obtained from [`begin`](Store::begin).
#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a new atomic unit of work.
    ///
    /// Everything performed through the returned transaction either
    /// commits as a whole or leaves no trace. Dropping an uncommitted
    /// transaction rolls it back.
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;

    /// Looks up a product by id.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Lists all catalog products.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Looks up a customer by id.
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// Loads an order with its line items.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Loads a customer's orders with their line items, newest first.
    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>>;

    /// Updates the status of an existing order.
    ///
    /// Returns false if no such order exists. This is the only mutation
    /// allowed on a committed order.
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<bool>;
}

/// One atomic unit of work against the store.
///
/// The checkout transaction performs its authoritative product reads,
/// order/item inserts, and conditional stock decrements through this
/// trait, then resolves the whole attempt with [`commit`](StoreTx::commit)
/// or [`rollback`](StoreTx::rollback).
#[async_trait]
pub trait StoreTx: Send {
    /// Reads the authoritative product row inside this transaction.
    async fn get_product(&mut self, id: &ProductId) -> Result<Option<Product>>;

    /// Inserts a new order row and returns it (id and timestamp assigned,
    /// items empty).
    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        total: Money,
        status: OrderStatus,
        payment_method: PaymentMethod,
    ) -> Result<Order>;

    /// Inserts a line item for an order created in this transaction.
    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product_id: &ProductId,
        product_name: &str,
        quantity: u32,
        price_at_purchase: Money,
    ) -> Result<OrderItem>;

    /// Atomically decrements stock by `quantity` if at least that much is
    /// available.
    ///
    /// The read-check-write is a single indivisible operation: false means
    /// the stock was insufficient and nothing was mutated. This is the
    /// optimistic-concurrency guard that makes overlapping checkouts for
    /// the last unit mutually exclusive.
    async fn decrement_stock_if_available(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<bool>;

    /// Commits the unit of work.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rolls the unit of work back, undoing every write made through it.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
