//! API server entry point.

use axum::Router;
use common::{CustomerId, Money, ProductId};
use store::{Customer, InMemoryStore, PostgresStore, Product};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Seeds the in-memory store with a small demo catalog so the server is
/// usable out of the box when no database is configured.
async fn seed_demo_data(store: &InMemoryStore) -> CustomerId {
    let customer = Customer {
        id: CustomerId::new(),
        name: "Demo Customer".to_string(),
        email: "demo@example.com".to_string(),
    };
    let customer_id = customer.id;
    store.insert_customer(customer).await;

    let catalog = [
        ("SKU-001", "Wireless Mouse", "2.4GHz optical mouse", 1999, 25),
        ("SKU-002", "Mechanical Keyboard", "87-key, brown switches", 7499, 10),
        ("SKU-003", "USB-C Hub", "7-port hub with HDMI", 3499, 40),
    ];
    for (id, name, description, price_cents, stock) in catalog {
        store
            .insert_product(Product {
                id: ProductId::new(id),
                name: name.to_string(),
                description: description.to_string(),
                price: Money::from_cents(price_cents),
                stock_quantity: stock,
            })
            .await;
    }

    customer_id
}

#[tokio::main]
async fn main() {
    let config = api::config::Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let app: Router = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url)
                .await
                .expect("failed to connect to database");
            store.run_migrations().await.expect("migrations failed");
            tracing::info!("using PostgreSQL store");
            api::create_app(api::create_state(store), metrics_handle)
        }
        None => {
            let store = InMemoryStore::new();
            let demo_customer = seed_demo_data(&store).await;
            tracing::info!(%demo_customer, "no DATABASE_URL set, using in-memory store with demo data");
            api::create_app(api::create_state(store), metrics_handle)
        }
    };

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
