//! Order placement: the checkout transaction.

use std::time::Instant;

use common::{CustomerId, Money, OrderId};
use store::{Order, OrderStatus, PaymentMethod, Product, Store, StoreTx};

use crate::cart::{Cart, CheckoutLine};
use crate::error::CheckoutError;

/// Service orchestrating checkout against an injected store.
///
/// `place_order` is the one operation with real concurrency content: it
/// runs the whole cart inside a single store transaction and relies on
/// the store's atomic conditional decrement to serialize contention on
/// individual stock rows. Everything else is a thin wrapper over simple
/// store reads and writes.
pub struct OrderService<S> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for the contents of a cart.
    ///
    /// On success the returned [`Order`] is fully populated with its
    /// items; the caller clears the cart and hands the order to receipt
    /// generation. On any failure nothing is persisted and the cart is
    /// untouched, so the customer may retry.
    #[tracing::instrument(skip(self, cart), fields(lines = cart.line_count()))]
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        cart: &Cart,
        payment_method: PaymentMethod,
    ) -> Result<Order, CheckoutError> {
        self.place_order_lines(customer_id, cart.checkout_lines(), payment_method)
            .await
    }

    /// Places an order for explicit `(product, quantity)` lines.
    ///
    /// Validation failures return before any transaction is opened. The
    /// lines are processed in ascending product-id order so overlapping
    /// concurrent orders touch stock rows in the same order.
    pub async fn place_order_lines(
        &self,
        customer_id: CustomerId,
        mut lines: Vec<CheckoutLine>,
        payment_method: PaymentMethod,
    ) -> Result<Order, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        for line in &lines {
            if line.quantity == 0 {
                return Err(CheckoutError::InvalidQuantity {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                });
            }
        }
        lines.sort_by(|a, b| a.product_id.cmp(&b.product_id));

        let start = Instant::now();
        let mut tx = self.store.begin().await?;
        let result = Self::checkout_in_tx(tx.as_mut(), customer_id, &lines, payment_method).await;

        match result {
            Ok(order) => {
                tx.commit().await?;
                metrics::counter!("orders_placed_total").increment(1);
                metrics::histogram!("checkout_duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = %order.id,
                    %customer_id,
                    total = %order.total,
                    items = order.item_count(),
                    "order placed"
                );
                Ok(order)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed after aborted checkout");
                }
                metrics::counter!("orders_rejected_total").increment(1);
                tracing::warn!(%customer_id, error = %err, "checkout aborted");
                Err(err)
            }
        }
    }

    /// Runs steps 2-5 of the checkout inside an open transaction.
    ///
    /// A pricing pass re-reads every product first so the order total is
    /// computed from the same authoritative prices that become each
    /// item's price-at-purchase; the cart's cached snapshots are never
    /// trusted here.
    async fn checkout_in_tx(
        tx: &mut dyn StoreTx,
        customer_id: CustomerId,
        lines: &[CheckoutLine],
        payment_method: PaymentMethod,
    ) -> Result<Order, CheckoutError> {
        let mut priced: Vec<(Product, u32)> = Vec::with_capacity(lines.len());
        let mut total = Money::zero();

        for line in lines {
            let product = tx
                .get_product(&line.product_id)
                .await?
                .ok_or_else(|| CheckoutError::ProductNotFound(line.product_id.clone()))?;

            if product.stock_quantity < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name,
                    requested: line.quantity,
                    available: product.stock_quantity,
                });
            }

            total += product.price.multiply(line.quantity);
            priced.push((product, line.quantity));
        }

        let mut order = tx
            .insert_order(customer_id, total, OrderStatus::Pending, payment_method)
            .await?;

        for (product, quantity) in priced {
            let item = tx
                .insert_order_item(order.id, &product.id, &product.name, quantity, product.price)
                .await?;

            // The stock check above passed, so a failed conditional
            // decrement means a concurrent order got there first.
            if !tx.decrement_stock_if_available(&product.id, quantity).await? {
                return Err(CheckoutError::ConcurrencyConflict(product.id));
            }

            order.items.push(item);
        }

        Ok(order)
    }

    /// Loads an order with its items.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, CheckoutError> {
        Ok(self.store.get_order(order_id).await?)
    }

    /// Loads a customer's order history, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, CheckoutError> {
        Ok(self.store.orders_for_customer(customer_id).await?)
    }

    /// Moves an order to a new status (`Pending` to `Completed` or
    /// `Cancelled`). Returns false if the order does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, CheckoutError> {
        Ok(self.store.update_order_status(order_id, status).await?)
    }
}
