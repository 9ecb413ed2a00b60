//! Shared types used across the storefront crates.

pub mod ids;
pub mod money;

pub use ids::{CustomerId, OrderId, OrderItemId, ProductId};
pub use money::Money;
