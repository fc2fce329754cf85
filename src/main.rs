use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jpashop_orders::api::{self, AppState};
use jpashop_orders::config::{AppConfig, StoreBackend};
use jpashop_orders::metrics::Metrics;
use jpashop_orders::query::OrderQueryService;
use jpashop_orders::store::seed::seed_demo_data;
use jpashop_orders::store::{InMemoryOrderStore, OrderSearch, OrderStore, OrderWriter, Page, PgOrderStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Default to INFO, DEBUG for this crate; override with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,jpashop_orders=debug"))
        )
        .init();

    tracing::info!("🚀 Starting jpashop order retrieval service");

    // === 1. Configuration ===
    let config = AppConfig::from_env()?;
    tracing::info!(
        backend = ?config.store.backend,
        batch_size = config.batch_size.get(),
        "Configuration loaded"
    );

    // === 2. Store ===
    let store: Arc<dyn OrderStore> = match config.store.backend {
        StoreBackend::Memory => {
            let store = Arc::new(InMemoryOrderStore::new());
            seed_if_empty(store.as_ref(), config.seed_demo_data).await?;
            store
        }
        StoreBackend::Postgres => {
            let store = Arc::new(PgOrderStore::connect(&config.store).await?);
            store.ensure_schema().await?;
            seed_if_empty(store.as_ref(), config.seed_demo_data).await?;
            store
        }
    };

    // === 3. Metrics + retrieval core ===
    let metrics = Arc::new(Metrics::new()?);
    let service = OrderQueryService::new(store, config.batch_size).with_metrics(metrics.clone());
    let state = web::Data::new(AppState { service, metrics });

    // === 4. HTTP ===
    let bind = (config.server.host.clone(), config.server.port);
    tracing::info!("📡 Listening on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::routes)
    })
    .bind(bind)?
    .run()
    .await?;

    tracing::info!("👋 Shut down");
    Ok(())
}

async fn seed_if_empty<S>(store: &S, enabled: bool) -> anyhow::Result<()>
where
    S: OrderStore + OrderWriter,
{
    if !enabled {
        return Ok(());
    }

    let existing = store.find_orders(&OrderSearch::all(), Some(Page::new(0, 1))).await?;
    if !existing.is_empty() {
        tracing::info!("Orders already present, skipping demo seed");
        return Ok(());
    }

    seed_demo_data(store).await?;
    Ok(())
}
