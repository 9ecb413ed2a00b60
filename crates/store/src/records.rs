//! Durable records owned by the store.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, OrderItemId, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog product.
///
/// `stock_quantity` is the one piece of shared mutable state in the whole
/// system; it is only ever written through
/// [`StoreTx::decrement_stock_if_available`](crate::StoreTx::decrement_stock_if_available).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price in cents.
    pub price: Money,
    /// Units currently available for sale.
    pub stock_quantity: u32,
}

/// A customer record. Maintained by an external system; the storefront
/// only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}

/// The lifecycle status of an order.
///
/// New orders are created `Pending` inside the checkout transaction.
/// The status update operation moves them to one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Completed" => Ok(OrderStatus::Completed),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    CashOnDelivery,
    Card,
}

impl PaymentMethod {
    /// Returns the payment method name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "CashOnDelivery",
            PaymentMethod::Card => "Card",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "CashOnDelivery" => Ok(PaymentMethod::CashOnDelivery),
            "Card" => Ok(PaymentMethod::Card),
            _ => Err(()),
        }
    }
}

/// A placed order with its line items.
///
/// Created exactly once inside the checkout transaction. After commit,
/// only `status` is ever mutated (by the status update operation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub created_at: DateTime<Utc>,
    /// Sum of `quantity x price_at_purchase` across `items`.
    pub total: Money,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Returns the number of line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Recomputes the total from the line items.
    ///
    /// Equals `self.total` for any order the checkout transaction wrote.
    pub fn computed_total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// A line item on an order.
///
/// `price_at_purchase` and `quantity` are the historical record of what
/// was sold; they are immutable once the order is committed, regardless
/// of later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    /// Product name denormalized at creation time.
    pub product_name: String,
    pub quantity: u32,
    /// Unit price copied from the product at the moment of the transaction.
    pub price_at_purchase: Money,
}

impl OrderItem {
    /// Returns `quantity x price_at_purchase` for this line.
    pub fn line_total(&self) -> Money {
        self.price_at_purchase.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_roundtrips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn payment_method_roundtrips_through_str() {
        for method in [PaymentMethod::CashOnDelivery, PaymentMethod::Card] {
            assert_eq!(method.as_str().parse::<PaymentMethod>(), Ok(method));
        }
        assert!("Cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn order_item_line_total() {
        let item = OrderItem {
            id: OrderItemId::new(),
            order_id: OrderId::new(),
            product_id: ProductId::new("SKU-001"),
            product_name: "Widget".to_string(),
            quantity: 3,
            price_at_purchase: Money::from_cents(999),
        };
        assert_eq!(item.line_total().cents(), 2997);
    }

    #[test]
    fn computed_total_matches_items() {
        let order_id = OrderId::new();
        let order = Order {
            id: order_id,
            customer_id: CustomerId::new(),
            created_at: Utc::now(),
            total: Money::from_cents(2498),
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::CashOnDelivery,
            items: vec![
                OrderItem {
                    id: OrderItemId::new(),
                    order_id,
                    product_id: ProductId::new("SKU-A"),
                    product_name: "A".to_string(),
                    quantity: 2,
                    price_at_purchase: Money::from_cents(999),
                },
                OrderItem {
                    id: OrderItemId::new(),
                    order_id,
                    product_id: ProductId::new("SKU-B"),
                    product_name: "B".to_string(),
                    quantity: 1,
                    price_at_purchase: Money::from_cents(500),
                },
            ],
        };
        assert_eq!(order.computed_total(), order.total);
    }
}
