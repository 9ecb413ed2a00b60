//! Persistence layer for the storefront.
//!
//! Owns the durable records (products, customers, orders, order items) and
//! the [`Store`]/[`StoreTx`] traits that the checkout service is written
//! against. Two implementations are provided: [`PostgresStore`] for real
//! deployments and [`InMemoryStore`] for tests and local runs.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use common::{CustomerId, Money, OrderId, OrderItemId, ProductId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{Customer, Order, OrderItem, OrderStatus, PaymentMethod, Product};
pub use store::{Store, StoreTx};
