use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::metrics::Metrics;
use crate::query::{OrderQueryService, RetrievalStrategy, SummaryStrategy};

mod error;
mod params;

pub use error::ApiError;
pub use params::OrderQueryParams;

// ============================================================================
// API - thin request layer over the retrieval core
// ============================================================================
//
// GET /api/{version}/orders         v1 v2 v3 v3.1 v4 v5 v6
// GET /api/{version}/simple-orders  v1 v2 v3 v4
// GET /metrics
// GET /health
//
// Malformed query strings answer 400 `invalid_query` with the same JSON body
// as every other error.
// v1 answers with the entity graph, everything else with views.
// v3.1 always pages (offset=0, limit=100 unless given); the other pageable
// versions page only when offset or limit is present.
// ============================================================================

pub struct AppState {
    pub service: OrderQueryService,
    pub metrics: Arc<Metrics>,
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::InvalidQuery(err.to_string()).into());

    cfg.app_data(query_config)
        .route("/health", web::get().to(health_handler))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/api/{version}/orders", web::get().to(orders_handler))
        .route("/api/{version}/simple-orders", web::get().to(simple_orders_handler));
}

async fn orders_handler(
    state: web::Data<AppState>,
    version: web::Path<String>,
    params: web::Query<OrderQueryParams>,
) -> Result<HttpResponse, ApiError> {
    let strategy: RetrievalStrategy = version
        .parse()
        .map_err(|_| ApiError::UnknownVersion(version.to_string()))?;
    let search = params.search()?;

    if strategy == RetrievalStrategy::EntityGraph {
        let entities = state.service.order_entities(&search, params.page()).await?;
        return Ok(HttpResponse::Ok().json(entities));
    }

    let page = match strategy {
        RetrievalStrategy::BatchFetch => Some(params.page_or_default()),
        _ => params.page(),
    };
    let views = state.service.list_orders(strategy, &search, page).await?;
    Ok(HttpResponse::Ok().json(views))
}

async fn simple_orders_handler(
    state: web::Data<AppState>,
    version: web::Path<String>,
    params: web::Query<OrderQueryParams>,
) -> Result<HttpResponse, ApiError> {
    let strategy: SummaryStrategy = version
        .parse()
        .map_err(|_| ApiError::UnknownVersion(version.to_string()))?;
    let search = params.search()?;

    let summaries = state.service.summaries(strategy, &search, params.page()).await?;
    Ok(HttpResponse::Ok().json(summaries))
}

async fn metrics_handler(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let buffer = state.metrics.encode()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer))
}

async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "jpashop-orders"
    }))
}
