//! End-to-end checkout tests over the in-memory store, including the
//! contended last-unit scenario.

use std::sync::Arc;

use checkout::{Cart, CheckoutError, CheckoutLine, CustomerId, Money, OrderService, ProductId};
use store::{InMemoryStore, PaymentMethod, Product};

fn product(id: &str, price_cents: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        description: String::new(),
        price: Money::from_cents(price_cents),
        stock_quantity: stock,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_for_last_unit_are_mutually_exclusive() {
    let store = InMemoryStore::new();
    store.insert_product(product("SKU-LAST", 2500, 1)).await;
    let service = Arc::new(OrderService::new(store.clone()));

    let mut handles = Vec::new();
    for _ in 0..2 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            let lines = vec![CheckoutLine {
                product_id: ProductId::new("SKU-LAST"),
                quantity: 1,
            }];
            service
                .place_order_lines(CustomerId::new(), lines, PaymentMethod::Card)
                .await
        }));
    }

    let mut successes = 0;
    let mut retryable_failures = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) if err.is_retryable() => retryable_failures += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(retryable_failures, 1);
    assert_eq!(store.product_stock(&ProductId::new("SKU-LAST")).await, Some(0));
    assert_eq!(store.order_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_orders_over_disjoint_products_all_succeed() {
    let store = InMemoryStore::new();
    for i in 0..4 {
        store.insert_product(product(&format!("SKU-{i:03}"), 100, 5)).await;
    }
    let service = Arc::new(OrderService::new(store.clone()));

    let mut handles = Vec::new();
    for i in 0..4 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            let lines = vec![CheckoutLine {
                product_id: ProductId::new(format!("SKU-{i:03}")),
                quantity: 2,
            }];
            service
                .place_order_lines(CustomerId::new(), lines, PaymentMethod::CashOnDelivery)
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.order_count().await, 4);
    for i in 0..4 {
        let stock = store
            .product_stock(&ProductId::new(format!("SKU-{i:03}")))
            .await;
        assert_eq!(stock, Some(3));
    }
}

#[tokio::test]
async fn checkout_is_all_or_nothing() {
    let store = InMemoryStore::new();
    store.insert_product(product("SKU-A", 999, 5)).await;
    store.insert_product(product("SKU-B", 500, 1)).await;
    let service = OrderService::new(store.clone());

    let mut cart = Cart::new();
    cart.add_item(&product("SKU-A", 999, 5), 2);
    cart.add_item(&product("SKU-B", 500, 1), 3);

    let result = service
        .place_order(CustomerId::new(), &cart, PaymentMethod::CashOnDelivery)
        .await;
    assert!(matches!(
        result,
        Err(CheckoutError::InsufficientStock { .. })
    ));

    // Failed attempt left no trace
    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.product_stock(&ProductId::new("SKU-A")).await, Some(5));
    assert_eq!(store.product_stock(&ProductId::new("SKU-B")).await, Some(1));

    // The cart is untouched, so the customer can adjust and retry
    assert_eq!(cart.line_count(), 2);
    cart.set_item_quantity(&ProductId::new("SKU-B"), 1);
    let order = service
        .place_order(CustomerId::new(), &cart, PaymentMethod::CashOnDelivery)
        .await
        .unwrap();
    assert_eq!(order.item_count(), 2);
    assert_eq!(order.total.cents(), 999 * 2 + 500);
}

#[tokio::test]
async fn scenario_two_line_cart_receipt_totals() {
    let store = InMemoryStore::new();
    store.insert_product(product("SKU-A", 999, 5)).await;
    store.insert_product(product("SKU-B", 500, 3)).await;
    let service = OrderService::new(store.clone());
    let customer_id = CustomerId::new();

    let mut cart = Cart::new();
    cart.add_item(&product("SKU-A", 999, 5), 2);
    cart.add_item(&product("SKU-B", 500, 3), 1);
    assert_eq!(cart.total().to_string(), "$24.98");

    let order = service
        .place_order(customer_id, &cart, PaymentMethod::CashOnDelivery)
        .await
        .unwrap();

    assert_eq!(order.total.to_string(), "$24.98");
    assert_eq!(order.item_count(), 2);
    assert_eq!(store.product_stock(&ProductId::new("SKU-A")).await, Some(3));
    assert_eq!(store.product_stock(&ProductId::new("SKU-B")).await, Some(2));
}

#[tokio::test]
async fn scenario_oversized_order_is_rejected_and_stock_kept() {
    let store = InMemoryStore::new();
    store.insert_product(product("SKU-A", 999, 2)).await;
    let service = OrderService::new(store.clone());

    let mut cart = Cart::new();
    cart.add_item(&product("SKU-A", 999, 2), 10);

    let result = service
        .place_order(CustomerId::new(), &cart, PaymentMethod::Card)
        .await;
    assert!(matches!(
        result,
        Err(CheckoutError::InsufficientStock { .. })
    ));
    assert_eq!(store.product_stock(&ProductId::new("SKU-A")).await, Some(2));
    assert_eq!(store.order_count().await, 0);
}
