//! Checkout error taxonomy.

use common::ProductId;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while placing an order.
///
/// Validation errors never open a transaction. All other variants abort
/// the whole attempt: the order row, its items, and any stock decrements
/// are rolled back together, and the caller's cart is left untouched.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart had no lines; nothing to order.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line carried a non-positive quantity.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// A cart line referenced a product that no longer exists.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The authoritative stock check failed for a product.
    #[error(
        "Insufficient stock for {product_name} ({product_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: u32,
        available: u32,
    },

    /// The conditional stock decrement lost a race with a concurrent
    /// order between the stock check and the write.
    #[error("Concurrent order consumed the stock of product {0}")]
    ConcurrencyConflict(ProductId),

    /// The underlying store failed for reasons unrelated to stock.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Returns true if the caller may retry after re-fetching stock.
    ///
    /// Stock-related aborts are recoverable; validation errors need a
    /// different cart, and store errors are not auto-retried here.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::InsufficientStock { .. } | CheckoutError::ConcurrencyConflict(_)
        )
    }
}
