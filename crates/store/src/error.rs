use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored column held a value that does not map to a domain type.
    #[error("Invalid value in column {column}: {value}")]
    Decode {
        column: &'static str,
        value: String,
    },

    /// An order item referenced an order that does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
