use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use super::graph::OrderEntity;
use super::projection::{OrderSummaryView, OrderView};
use super::strategies::{batch_fetch, dto_projection, entity_graph, fetch_join, flat_group};
use super::summaries::{self, SummaryStrategy};
use super::{check_bounds, check_page, QueryError, QueryResult, ReadScope, RetrievalStrategy};
use crate::config::BatchSize;
use crate::metrics::Metrics;
use crate::store::{OrderSearch, OrderStore, Page};

// ============================================================================
// Order Query Service - entry point of the retrieval core
// ============================================================================
//
// 1. guard validates pagination (no scope, no query on rejection)
// 2. one ReadScope per call, closed when the call returns or is dropped
// 3. the selected plan runs inside the scope
// 4. outcome, duration and issued queries go to logs + metrics
//
// The core never retries; store errors pass through as QueryError::Store.
//
// ============================================================================

#[derive(Clone)]
pub struct OrderQueryService {
    store: Arc<dyn OrderStore>,
    batch_size: BatchSize,
    metrics: Option<Arc<Metrics>>,
}

impl OrderQueryService {
    pub fn new(store: Arc<dyn OrderStore>, batch_size: BatchSize) -> Self {
        Self {
            store,
            batch_size,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn batch_size(&self) -> BatchSize {
        self.batch_size
    }

    pub fn open_scope(&self) -> ReadScope {
        ReadScope::begin(self.store.clone())
    }

    /// Orders with their lines, as views, under the chosen strategy.
    pub async fn list_orders(
        &self,
        strategy: RetrievalStrategy,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> QueryResult<Vec<OrderView>> {
        let page = self.guard(strategy, page)?;
        let scope = self.open_scope();
        self.run_orders(&scope, strategy, search, page).await
    }

    /// Same as `list_orders`, inside a caller-owned scope.
    pub async fn list_orders_in(
        &self,
        scope: &ReadScope,
        strategy: RetrievalStrategy,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> QueryResult<Vec<OrderView>> {
        let page = self.guard(strategy, page)?;
        self.run_orders(scope, strategy, search, page).await
    }

    /// v1 as materialized entity graphs rather than views.
    pub async fn order_entities(&self, search: &OrderSearch, page: Option<Page>) -> QueryResult<Vec<OrderEntity>> {
        let strategy = RetrievalStrategy::EntityGraph;
        let page = self.guard(strategy, page)?;
        let scope = self.open_scope();
        self.instrumented(strategy.version(), &scope, entity_graph::entities(&scope, search, page))
            .await
    }

    /// Order-level listings without lines.
    pub async fn summaries(
        &self,
        strategy: SummaryStrategy,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> QueryResult<Vec<OrderSummaryView>> {
        let page = match page.map(check_bounds).transpose() {
            Ok(page) => page,
            Err(err) => {
                self.record_rejection(strategy.version(), &err);
                return Err(err);
            }
        };

        let scope = self.open_scope();
        self.instrumented(
            strategy.version(),
            &scope,
            summaries::summaries(&scope, strategy, search, page),
        )
        .await
    }

    async fn run_orders(
        &self,
        scope: &ReadScope,
        strategy: RetrievalStrategy,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> QueryResult<Vec<OrderView>> {
        let plan = async {
            match strategy {
                RetrievalStrategy::EntityGraph | RetrievalStrategy::EntityDto => {
                    entity_graph::views(scope, search, page).await
                }
                RetrievalStrategy::CollectionFetchJoin => fetch_join::views(scope, search).await,
                RetrievalStrategy::BatchFetch => batch_fetch::views(scope, search, page, self.batch_size).await,
                RetrievalStrategy::DtoPerOrder => dto_projection::per_order(scope, search, page).await,
                RetrievalStrategy::DtoTwoQuery => dto_projection::two_query(scope, search, page).await,
                RetrievalStrategy::FlatGroup => flat_group::views(scope, search).await,
            }
        };
        self.instrumented(strategy.version(), scope, plan).await
    }

    fn guard(&self, strategy: RetrievalStrategy, page: Option<Page>) -> QueryResult<Option<Page>> {
        check_page(strategy, page).map_err(|err| {
            self.record_rejection(strategy.version(), &err);
            err
        })
    }

    fn record_rejection(&self, label: &str, err: &QueryError) {
        tracing::warn!(strategy = label, error = %err, "Retrieval rejected before any query");
        if let Some(metrics) = &self.metrics {
            if matches!(err, QueryError::UnsupportedPagination { .. }) {
                metrics.record_pagination_rejection(label);
            }
            metrics.record_retrieval(label, 0.0, err.kind());
        }
    }

    async fn instrumented<T, F>(&self, label: &'static str, scope: &ReadScope, plan: F) -> QueryResult<Vec<T>>
    where
        F: Future<Output = QueryResult<Vec<T>>>,
    {
        let started = Instant::now();
        let issued_before = scope.total_queries();

        let result = plan.await;

        let elapsed = started.elapsed();
        let issued: Vec<_> = scope.queries().into_iter().skip(issued_before).collect();

        if let Some(metrics) = &self.metrics {
            for query in &issued {
                metrics.record_store_query(label, query.as_str());
            }
            let outcome = result.as_ref().map_or_else(QueryError::kind, |_| "ok");
            metrics.record_retrieval(label, elapsed.as_secs_f64(), outcome);
        }

        match &result {
            Ok(rows) => tracing::info!(
                strategy = label,
                scope_id = %scope.id(),
                rows = rows.len(),
                queries = issued.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "✅ Orders retrieved"
            ),
            Err(err) => tracing::error!(
                strategy = label,
                scope_id = %scope.id(),
                queries = issued.len(),
                error = %err,
                "❌ Order retrieval failed"
            ),
        }

        result
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{Delivery, OrderStatus};
    use crate::query::QueryKind;
    use crate::store::seed::{seed_demo_data, SeededOrders};
    use crate::store::{InMemoryOrderStore, StoreError};
    use std::collections::HashSet;
    use std::time::Duration;

    async fn seeded(batch: i64) -> (Arc<InMemoryOrderStore>, OrderQueryService, SeededOrders) {
        let store = Arc::new(InMemoryOrderStore::new());
        let seeded = seed_demo_data(store.as_ref()).await.unwrap();
        let service = OrderQueryService::new(store.clone(), BatchSize::new(batch).unwrap());
        (store, service, seeded)
    }

    fn line_names(view: &OrderView) -> Vec<&str> {
        view.order_items.iter().map(|line| line.item_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_every_strategy_returns_the_same_orders() {
        let (_, service, _) = seeded(100).await;

        let baseline = service
            .list_orders(RetrievalStrategy::EntityGraph, &OrderSearch::all(), None)
            .await
            .unwrap();
        assert_eq!(baseline.len(), 2);

        for strategy in RetrievalStrategy::ALL {
            let views = service.list_orders(strategy, &OrderSearch::all(), None).await.unwrap();
            assert_eq!(views, baseline, "strategy {strategy} diverged");
        }
    }

    #[tokio::test]
    async fn test_filters_agree_across_strategies() {
        let (_, service, seeded) = seeded(100).await;

        for strategy in RetrievalStrategy::ALL {
            let views = service
                .list_orders(strategy, &OrderSearch::by_member("userB"), None)
                .await
                .unwrap();
            assert_eq!(views.len(), 1, "strategy {strategy}");
            assert_eq!(views[0].order_id, seeded.order_ids[1]);
            assert_eq!(views[0].name, "userB");

            let cancelled = service
                .list_orders(strategy, &OrderSearch::by_status(OrderStatus::Cancel), None)
                .await
                .unwrap();
            assert!(cancelled.is_empty(), "strategy {strategy}");
        }
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let (_, service, _) = seeded(100).await;

        for strategy in RetrievalStrategy::ALL {
            let first = service.list_orders(strategy, &OrderSearch::all(), None).await.unwrap();
            let second = service.list_orders(strategy, &OrderSearch::all(), None).await.unwrap();
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn test_repeated_paged_calls_are_identical() {
        let (_, service, _) = seeded(1).await;

        for strategy in RetrievalStrategy::ALL.into_iter().filter(|s| s.supports_pagination()) {
            for page in [Page::new(0, 1), Page::new(1, 1), Page::new(0, 2)] {
                let first = service.list_orders(strategy, &OrderSearch::all(), Some(page)).await.unwrap();
                let second = service.list_orders(strategy, &OrderSearch::all(), Some(page)).await.unwrap();
                assert!(!first.is_empty(), "strategy {strategy}");
                assert_eq!(first, second, "strategy {strategy}");
            }
        }
    }

    #[tokio::test]
    async fn test_collection_joins_never_duplicate_orders() {
        let (_, service, _) = seeded(100).await;

        for strategy in [RetrievalStrategy::CollectionFetchJoin, RetrievalStrategy::FlatGroup] {
            let views = service.list_orders(strategy, &OrderSearch::all(), None).await.unwrap();
            let ids: HashSet<i64> = views.iter().map(|view| view.order_id).collect();
            assert_eq!(ids.len(), views.len());
            assert_eq!(views.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_scenario_totals_and_line_order() {
        let (_, service, seeded) = seeded(100).await;

        let views = service
            .list_orders(RetrievalStrategy::DtoTwoQuery, &OrderSearch::all(), None)
            .await
            .unwrap();

        assert_eq!(views[0].order_id, seeded.order_ids[0]);
        assert_eq!(views[0].name, "userA");
        assert_eq!(line_names(&views[0]), vec!["JPA1 Book", "JPA2 Book"]);
        assert_eq!(views[0].total_price(), 50000);

        assert_eq!(views[1].name, "userB");
        assert_eq!(line_names(&views[1]), vec!["Spring1 Book"]);
        assert_eq!(views[1].total_price(), 20000);
        assert_eq!(views[1].address.city, "Gyeonggi");
    }

    #[tokio::test]
    async fn test_paging_over_orders_for_pageable_strategies() {
        let (_, service, seeded) = seeded(100).await;

        for strategy in RetrievalStrategy::ALL.into_iter().filter(|s| s.supports_pagination()) {
            let first = service
                .list_orders(strategy, &OrderSearch::all(), Some(Page::new(0, 1)))
                .await
                .unwrap();
            let second = service
                .list_orders(strategy, &OrderSearch::all(), Some(Page::new(1, 1)))
                .await
                .unwrap();

            assert_eq!(first.len(), 1, "strategy {strategy}");
            assert_eq!(second.len(), 1, "strategy {strategy}");
            assert_eq!(first[0].order_id, seeded.order_ids[0]);
            assert_eq!(second[0].order_id, seeded.order_ids[1]);
            // the page is over orders, so every line of order 1 is present
            assert_eq!(first[0].order_items.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_paging_collection_joins_is_rejected_before_any_query() {
        let (store, service, _) = seeded(100).await;
        let executed = store.executed_queries();

        for strategy in [RetrievalStrategy::CollectionFetchJoin, RetrievalStrategy::FlatGroup] {
            let scope = service.open_scope();
            let err = service
                .list_orders_in(&scope, strategy, &OrderSearch::all(), Some(Page::new(0, 100)))
                .await
                .unwrap_err();

            assert!(matches!(err, QueryError::UnsupportedPagination { strategy: s } if s == strategy));
            assert_eq!(scope.total_queries(), 0);
        }
        assert_eq!(store.executed_queries(), executed);
    }

    #[tokio::test]
    async fn test_invalid_page_is_rejected() {
        let (_, service, _) = seeded(100).await;

        let err = service
            .list_orders(RetrievalStrategy::BatchFetch, &OrderSearch::all(), Some(Page::new(0, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidPage { offset: 0, limit: 0 }));

        let err = service
            .summaries(SummaryStrategy::DirectProjection, &OrderSearch::all(), Some(Page::new(-1, 5)))
            .await
            .unwrap_err();
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_round_trips_per_strategy() {
        let (_, service, _) = seeded(100).await;

        let expected = [
            // orders + (member + delivery + lines) per order + one item per line
            (RetrievalStrategy::EntityGraph, 1 + 2 * 3 + 3),
            (RetrievalStrategy::EntityDto, 1 + 2 * 3 + 3),
            (RetrievalStrategy::CollectionFetchJoin, 1),
            // to-one join + one line batch + one item batch
            (RetrievalStrategy::BatchFetch, 3),
            (RetrievalStrategy::DtoPerOrder, 1 + 2),
            (RetrievalStrategy::DtoTwoQuery, 2),
            (RetrievalStrategy::FlatGroup, 1),
        ];

        for (strategy, queries) in expected {
            let scope = service.open_scope();
            service
                .list_orders_in(&scope, strategy, &OrderSearch::all(), None)
                .await
                .unwrap();
            assert_eq!(scope.total_queries(), queries, "strategy {strategy}");
        }
    }

    #[tokio::test]
    async fn test_batch_size_one_issues_one_line_batch_per_order() {
        let (_, service, _) = seeded(1).await;
        let scope = service.open_scope();

        let views = service
            .list_orders_in(&scope, RetrievalStrategy::BatchFetch, &OrderSearch::all(), None)
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(scope.query_count(QueryKind::OrderItemsByOrderIds), 2);
        assert_eq!(scope.query_count(QueryKind::OrdersWithMemberDelivery), 1);
        // three distinct items, one per batch
        assert_eq!(scope.query_count(QueryKind::ItemsById), 3);
    }

    #[tokio::test]
    async fn test_order_without_lines_is_returned_by_every_strategy() {
        let (store, service, seeded) = seeded(100).await;
        let member = store.find_member(seeded.member_ids[0]).await.unwrap().unwrap();
        let bare = store
            .insert_order_without_items(member.id, Delivery::for_member(&member), OrderStatus::Order)
            .await;

        for strategy in RetrievalStrategy::ALL {
            let views = service.list_orders(strategy, &OrderSearch::all(), None).await.unwrap();
            let found: Vec<_> = views.iter().filter(|view| view.order_id == bare).collect();

            assert_eq!(found.len(), 1, "strategy {strategy}");
            assert!(found[0].order_items.is_empty());
            assert_eq!(views.len(), 3);
        }
    }

    #[tokio::test]
    async fn test_closed_scope_fails_with_detached_access() {
        let (_, service, _) = seeded(100).await;
        let scope = service.open_scope();
        scope.close();

        let err = service
            .list_orders_in(&scope, RetrievalStrategy::EntityGraph, &OrderSearch::all(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::DetachedAccess { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_scope_mid_flight_stops_further_batches() {
        let (store, service, _) = seeded(1).await;
        store.set_latency(Duration::from_millis(100));

        let scope = service.open_scope();
        let closer = scope.closer();

        // to-one join finishes at 100ms, first line batch at 200ms,
        // the scope closes at 150ms so the second batch is never issued.
        let all = OrderSearch::all();
        let (result, _) = tokio::join!(
            service.list_orders_in(&scope, RetrievalStrategy::BatchFetch, &all, None),
            async {
                tokio::time::sleep(Duration::from_millis(150)).await;
                closer.close();
            }
        );

        assert!(matches!(result, Err(QueryError::DetachedAccess { .. })));
        assert_eq!(scope.query_count(QueryKind::OrderItemsByOrderIds), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_retrieval_issues_no_more_queries() {
        let (store, service, _) = seeded(1).await;
        store.set_latency(Duration::from_millis(100));
        let before = store.executed_queries();

        let result = tokio::time::timeout(
            Duration::from_millis(150),
            service.list_orders(RetrievalStrategy::BatchFetch, &OrderSearch::all(), None),
        )
        .await;
        assert!(result.is_err());

        let at_cancel = store.executed_queries();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(at_cancel - before, 1);
        assert_eq!(store.executed_queries(), at_cancel);
    }

    #[tokio::test]
    async fn test_store_failure_passes_through() {
        let (store, service, _) = seeded(100).await;
        store.set_unavailable(true);

        let err = service
            .list_orders(RetrievalStrategy::DtoTwoQuery, &OrderSearch::all(), None)
            .await
            .unwrap_err();

        match err {
            QueryError::Store(store_err) => {
                assert!(matches!(store_err, StoreError::Unavailable(_)));
                assert!(store_err.is_transient());
            }
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_order_entities_carry_the_full_graph() {
        let (_, service, _) = seeded(100).await;

        let entities = service.order_entities(&OrderSearch::all(), None).await.unwrap();

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].member.name, "userA");
        assert_eq!(entities[0].order_items[1].item.name, "JPA2 Book");
        assert_eq!(entities[0].order_items[1].item.kind.dtype(), "B");
        assert_eq!(entities[1].delivery.address.city, "Gyeonggi");
    }

    #[tokio::test]
    async fn test_summary_strategies_agree() {
        let (_, service, seeded) = seeded(100).await;

        let baseline = service
            .summaries(SummaryStrategy::DirectProjection, &OrderSearch::all(), None)
            .await
            .unwrap();
        assert_eq!(
            baseline.iter().map(|s| s.order_id).collect::<Vec<_>>(),
            seeded.order_ids
        );

        for strategy in SummaryStrategy::ALL {
            let summaries = service.summaries(strategy, &OrderSearch::all(), None).await.unwrap();
            assert_eq!(summaries, baseline, "strategy {strategy}");

            let paged = service
                .summaries(strategy, &OrderSearch::all(), Some(Page::new(1, 1)))
                .await
                .unwrap();
            assert_eq!(paged, baseline[1..].to_vec());
        }
    }

    #[tokio::test]
    async fn test_metrics_record_queries_and_rejections() {
        let (_, service, _) = seeded(100).await;
        let metrics = Arc::new(Metrics::new().unwrap());
        let service = service.with_metrics(metrics.clone());

        service
            .list_orders(RetrievalStrategy::DtoTwoQuery, &OrderSearch::all(), None)
            .await
            .unwrap();
        let _ = service
            .list_orders(RetrievalStrategy::FlatGroup, &OrderSearch::all(), Some(Page::new(0, 10)))
            .await;

        let queries = |query: &str| metrics.store_queries.with_label_values(&["v5", query]).get();
        assert_eq!(queries("find_order_summaries"), 1);
        assert_eq!(queries("find_order_item_rows"), 1);
        assert_eq!(metrics.retrieval_requests.with_label_values(&["v5", "ok"]).get(), 1);

        assert_eq!(metrics.pagination_rejections.with_label_values(&["v6"]).get(), 1);
        assert_eq!(
            metrics
                .retrieval_requests
                .with_label_values(&["v6", "unsupported_pagination"])
                .get(),
            1
        );
    }
}
