use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

// ============================================================================
// Metrics Module - Prometheus metrics for the retrieval core
// ============================================================================
//
// - retrieval_requests_total{strategy,outcome}
// - retrieval_duration_seconds{strategy}
// - store_queries_total{strategy,query}
// - pagination_rejections_total{strategy}
//
// Scraped via GET /metrics on the API server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub retrieval_requests: IntCounterVec,
    pub retrieval_duration: HistogramVec,
    pub store_queries: IntCounterVec,
    pub pagination_rejections: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let retrieval_requests = IntCounterVec::new(
            Opts::new("retrieval_requests_total", "Order retrievals by strategy and outcome"),
            &["strategy", "outcome"],
        )?;
        registry.register(Box::new(retrieval_requests.clone()))?;

        let retrieval_duration = HistogramVec::new(
            HistogramOpts::new("retrieval_duration_seconds", "Order retrieval duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["strategy"],
        )?;
        registry.register(Box::new(retrieval_duration.clone()))?;

        let store_queries = IntCounterVec::new(
            Opts::new("store_queries_total", "Store round trips issued per strategy"),
            &["strategy", "query"],
        )?;
        registry.register(Box::new(store_queries.clone()))?;

        let pagination_rejections = IntCounterVec::new(
            Opts::new("pagination_rejections_total", "Paged requests rejected before any query"),
            &["strategy"],
        )?;
        registry.register(Box::new(pagination_rejections.clone()))?;

        Ok(Self {
            registry,
            retrieval_requests,
            retrieval_duration,
            store_queries,
            pagination_rejections,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Outcome is the error kind, or "ok".
    pub fn record_retrieval(&self, strategy: &str, duration_secs: f64, outcome: &str) {
        self.retrieval_requests.with_label_values(&[strategy, outcome]).inc();
        self.retrieval_duration.with_label_values(&[strategy]).observe(duration_secs);
    }

    pub fn record_store_query(&self, strategy: &str, query: &str) {
        self.store_queries.with_label_values(&[strategy, query]).inc();
    }

    pub fn record_pagination_rejection(&self, strategy: &str) {
        self.pagination_rejections.with_label_values(&[strategy]).inc();
    }

    /// Text exposition format for the scrape endpoint.
    pub fn encode(&self) -> prometheus::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}
