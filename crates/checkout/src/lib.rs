//! Cart aggregation and the order placement transaction.
//!
//! [`Cart`] is the per-session, in-memory aggregation of desired purchase
//! lines. [`OrderService`] turns a cart into a durable order inside one
//! atomic unit of work, validating and conditionally decrementing shared
//! stock so that concurrent checkouts for the last unit of a product
//! cannot both succeed.

pub mod cart;
pub mod error;
pub mod service;

pub use cart::{Cart, CartLine, CheckoutLine};
pub use common::{CustomerId, Money, OrderId, ProductId};
pub use error::CheckoutError;
pub use service::OrderService;
