use checkout::{Cart, CheckoutLine, CustomerId, Money, OrderService, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
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

fn bench_cart_total(c: &mut Criterion) {
    let mut cart = Cart::new();
    for i in 0..50 {
        cart.add_item(&product(&format!("SKU-{i:03}"), 999, 100), 3);
    }

    c.bench_function("checkout/cart_total_50_lines", |b| {
        b.iter(|| cart.total());
    });
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("checkout/place_order_3_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                for i in 0..3 {
                    store
                        .insert_product(product(&format!("SKU-{i:03}"), 999, 10))
                        .await;
                }
                let service = OrderService::new(store);

                let lines = (0..3)
                    .map(|i| CheckoutLine {
                        product_id: ProductId::new(format!("SKU-{i:03}")),
                        quantity: 2,
                    })
                    .collect();
                service
                    .place_order_lines(CustomerId::new(), lines, PaymentMethod::Card)
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_cart_total, bench_place_order);
criterion_main!(benches);
