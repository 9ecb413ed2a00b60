//! Per-session shopping cart.

use std::collections::HashMap;

use common::{Money, ProductId};
use store::Product;

/// One line in a cart: a desired quantity plus the product snapshot
/// cached when the line was first added.
///
/// The snapshot is used for display pricing only; checkout re-reads the
/// authoritative product, so a stale snapshot never affects what is
/// charged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub quantity: u32,
    pub product: Product,
}

/// A `(product, quantity)` pair extracted from a cart for checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// In-memory aggregation of a customer's desired purchases.
///
/// Owned by a single session and accessed from one task at a time; there
/// is no interior locking. A product id present in the cart always has a
/// quantity > 0 and a cached snapshot — removal deletes the whole line
/// rather than leaving a zero entry.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: HashMap<ProductId, CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of a product, accumulating onto an existing
    /// line if present.
    ///
    /// A zero quantity is a usage error and leaves the cart unchanged.
    /// The product snapshot is cached only when the line is first
    /// created; the first-seen price wins for display purposes.
    pub fn add_item(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            tracing::warn!(product_id = %product.id, "ignoring add of zero quantity");
            return;
        }

        self.lines
            .entry(product.id.clone())
            .and_modify(|line| line.quantity += quantity)
            .or_insert_with(|| CartLine {
                quantity,
                product: product.clone(),
            });
    }

    /// Removes a product's line entirely. Idempotent.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.lines.remove(product_id);
    }

    /// Sets the quantity of an existing line.
    ///
    /// A quantity of zero removes the line. Setting a product that is not
    /// in the cart is a usage error and leaves the cart unchanged.
    pub fn set_item_quantity(&mut self, product_id: &ProductId, new_quantity: u32) {
        if new_quantity == 0 {
            self.remove_item(product_id);
            return;
        }
        match self.lines.get_mut(product_id) {
            Some(line) => line.quantity = new_quantity,
            None => {
                tracing::warn!(%product_id, "cannot set quantity for product not in cart");
            }
        }
    }

    /// Returns a read-only view of the cart's product quantities.
    pub fn items(&self) -> impl Iterator<Item = (&ProductId, u32)> {
        self.lines.iter().map(|(id, line)| (id, line.quantity))
    }

    /// Returns the cached product snapshot for a line, if present.
    pub fn product_details(&self, product_id: &ProductId) -> Option<&Product> {
        self.lines.get(product_id).map(|line| &line.product)
    }

    /// Returns the display total: the sum over lines of cached price
    /// times quantity.
    ///
    /// Line subtotals are exact in cents, so the total is the exact sum
    /// of what a receipt itemization would show.
    pub fn total(&self) -> Money {
        self.lines
            .values()
            .map(|line| line.product.price.multiply(line.quantity))
            .sum()
    }

    /// Empties the cart. Used on logout and after a successful checkout.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Returns true iff the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of lines in the cart.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Extracts the cart's lines for checkout, sorted by ascending
    /// product id so concurrent orders over overlapping product sets
    /// touch stock rows in the same order.
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        let mut lines: Vec<_> = self
            .lines
            .iter()
            .map(|(id, line)| CheckoutLine {
                product_id: id.clone(),
                quantity: line.quantity,
            })
            .collect();
        lines.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        lines
    }
}
