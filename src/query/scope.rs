use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{QueryError, QueryResult};
use crate::domain::item::Item;
use crate::domain::member::Member;
use crate::domain::order::Delivery;
use crate::store::{
    FetchJoinRow, OrderFlatRow, OrderHeaderRow, OrderItemQueryRow, OrderItemRecord, OrderRecord,
    OrderSearch, OrderStore, OrderSummaryRow, Page,
};

// ============================================================================
// Read Scope - the unit of work a retrieval runs in
// ============================================================================
//
// Every store round trip of one retrieval goes through one scope:
// - a query issued on a closed scope fails with DetachedAccess
// - lazy relations remember the scope that produced them and refuse to load
//   through any other scope, or after theirs closed
// - the scope records every query it issued (tests + metrics)
//
// Closing happens on drop, explicitly, or from another task via ScopeCloser.
//
// Consistency: a scope is a logical unit of work, not a database
// transaction. On Postgres every round trip checks out its own pool
// connection, so each statement sees what was committed when it started
// (read committed). Two queries of one retrieval may observe a write that
// landed between them; there is no single snapshot across the scope.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Orders,
    Member,
    Delivery,
    ItemsById,
    OrdersWithMemberDelivery,
    OrderItemsByOrderIds,
    OrdersWithItems,
    OrderSummaries,
    OrderItemRows,
    OrderFlatRows,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Orders => "find_orders",
            QueryKind::Member => "find_member",
            QueryKind::Delivery => "find_delivery",
            QueryKind::ItemsById => "find_items_by_ids",
            QueryKind::OrdersWithMemberDelivery => "find_orders_with_member_delivery",
            QueryKind::OrderItemsByOrderIds => "find_order_items_by_order_ids",
            QueryKind::OrdersWithItems => "find_orders_with_items",
            QueryKind::OrderSummaries => "find_order_summaries",
            QueryKind::OrderItemRows => "find_order_item_rows",
            QueryKind::OrderFlatRows => "find_order_flat_rows",
        }
    }
}

#[derive(Debug)]
struct ScopeState {
    id: Uuid,
    open: AtomicBool,
    issued: Mutex<Vec<QueryKind>>,
}

impl ScopeState {
    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            tracing::debug!(scope_id = %self.id, "Read scope closed");
        }
    }
}

/// Cloneable handle that closes a scope from anywhere.
#[derive(Debug, Clone)]
pub struct ScopeCloser {
    state: Arc<ScopeState>,
}

impl ScopeCloser {
    pub fn close(&self) {
        self.state.close();
    }

    pub fn is_open(&self) -> bool {
        self.state.open.load(Ordering::SeqCst)
    }
}

pub struct ReadScope {
    state: Arc<ScopeState>,
    store: Arc<dyn OrderStore>,
}

impl ReadScope {
    pub fn begin(store: Arc<dyn OrderStore>) -> Self {
        let id = Uuid::now_v7();
        tracing::debug!(scope_id = %id, backend = store.backend(), "Read scope opened");

        Self {
            state: Arc::new(ScopeState {
                id,
                open: AtomicBool::new(true),
                issued: Mutex::new(Vec::new()),
            }),
            store,
        }
    }

    pub fn id(&self) -> Uuid {
        self.state.id
    }

    pub fn is_open(&self) -> bool {
        self.state.open.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        self.state.close();
    }

    pub fn closer(&self) -> ScopeCloser {
        ScopeCloser {
            state: self.state.clone(),
        }
    }

    /// Queries issued so far, in issue order.
    pub fn queries(&self) -> Vec<QueryKind> {
        self.state
            .issued
            .lock()
            .map(|issued| issued.clone())
            .unwrap_or_default()
    }

    pub fn query_count(&self, kind: QueryKind) -> usize {
        self.queries().into_iter().filter(|issued| *issued == kind).count()
    }

    pub fn total_queries(&self) -> usize {
        self.queries().len()
    }

    /// Fails unless `owner` is this scope and it is still open.
    pub(crate) fn ensure_attached(&self, relation: &'static str, owner: Uuid) -> QueryResult<()> {
        if owner != self.state.id || !self.is_open() {
            tracing::error!(relation, owner = %owner, scope_id = %self.state.id, "Detached lazy access");
            return Err(QueryError::DetachedAccess {
                relation,
                scope_id: owner,
            });
        }
        Ok(())
    }

    fn issue(&self, kind: QueryKind) -> QueryResult<()> {
        if !self.is_open() {
            return Err(QueryError::DetachedAccess {
                relation: kind.as_str(),
                scope_id: self.state.id,
            });
        }
        if let Ok(mut issued) = self.state.issued.lock() {
            issued.push(kind);
        }
        tracing::debug!(scope_id = %self.state.id, query = kind.as_str(), "Issuing store query");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Store round trips
    // ------------------------------------------------------------------------

    pub async fn find_orders(&self, search: &OrderSearch, page: Option<Page>) -> QueryResult<Vec<OrderRecord>> {
        self.issue(QueryKind::Orders)?;
        Ok(self.store.find_orders(search, page).await?)
    }

    pub async fn find_member(&self, id: i64) -> QueryResult<Option<Member>> {
        self.issue(QueryKind::Member)?;
        Ok(self.store.find_member(id).await?)
    }

    pub async fn find_delivery(&self, id: i64) -> QueryResult<Option<Delivery>> {
        self.issue(QueryKind::Delivery)?;
        Ok(self.store.find_delivery(id).await?)
    }

    pub async fn find_items_by_ids(&self, ids: &[i64]) -> QueryResult<Vec<Item>> {
        self.issue(QueryKind::ItemsById)?;
        Ok(self.store.find_items_by_ids(ids).await?)
    }

    pub async fn find_orders_with_member_delivery(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> QueryResult<Vec<OrderHeaderRow>> {
        self.issue(QueryKind::OrdersWithMemberDelivery)?;
        Ok(self.store.find_orders_with_member_delivery(search, page).await?)
    }

    pub async fn find_order_items_by_order_ids(&self, order_ids: &[i64]) -> QueryResult<Vec<OrderItemRecord>> {
        self.issue(QueryKind::OrderItemsByOrderIds)?;
        Ok(self.store.find_order_items_by_order_ids(order_ids).await?)
    }

    pub async fn find_orders_with_items(&self, search: &OrderSearch) -> QueryResult<Vec<FetchJoinRow>> {
        self.issue(QueryKind::OrdersWithItems)?;
        Ok(self.store.find_orders_with_items(search).await?)
    }

    pub async fn find_order_summaries(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> QueryResult<Vec<OrderSummaryRow>> {
        self.issue(QueryKind::OrderSummaries)?;
        Ok(self.store.find_order_summaries(search, page).await?)
    }

    pub async fn find_order_item_rows(&self, order_ids: &[i64]) -> QueryResult<Vec<OrderItemQueryRow>> {
        self.issue(QueryKind::OrderItemRows)?;
        Ok(self.store.find_order_item_rows(order_ids).await?)
    }

    pub async fn find_order_flat_rows(&self, search: &OrderSearch) -> QueryResult<Vec<OrderFlatRow>> {
        self.issue(QueryKind::OrderFlatRows)?;
        Ok(self.store.find_order_flat_rows(search).await?)
    }
}

impl Drop for ReadScope {
    fn drop(&mut self) {
        self.state.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::Address;
    use crate::domain::order::OrderStatus;
    use crate::store::seed::seed_demo_data;
    use crate::store::InMemoryOrderStore;

    fn scope() -> ReadScope {
        ReadScope::begin(Arc::new(InMemoryOrderStore::new()))
    }

    #[tokio::test]
    async fn test_queries_are_recorded_in_order() {
        let scope = scope();
        scope.find_orders(&OrderSearch::all(), None).await.unwrap();
        scope.find_member(1).await.unwrap();
        scope.find_member(2).await.unwrap();

        assert_eq!(
            scope.queries(),
            vec![QueryKind::Orders, QueryKind::Member, QueryKind::Member]
        );
        assert_eq!(scope.query_count(QueryKind::Member), 2);
        assert_eq!(scope.total_queries(), 3);
    }

    #[tokio::test]
    async fn test_closed_scope_refuses_queries() {
        let scope = scope();
        scope.close();

        let err = scope.find_orders(&OrderSearch::all(), None).await.unwrap_err();
        assert!(matches!(err, QueryError::DetachedAccess { .. }));
        assert_eq!(scope.total_queries(), 0);
    }

    #[tokio::test]
    async fn test_each_query_sees_writes_committed_before_it() {
        let store = Arc::new(InMemoryOrderStore::new());
        let seeded = seed_demo_data(store.as_ref()).await.unwrap();
        let scope = ReadScope::begin(store.clone());

        let before = scope.find_orders(&OrderSearch::all(), None).await.unwrap();
        let delivery = Delivery::ready(Address::new("Busan", "2", "222-222"));
        store
            .insert_order_without_items(seeded.member_ids[0], delivery, OrderStatus::Order)
            .await;
        let after = scope.find_orders(&OrderSearch::all(), None).await.unwrap();

        assert_eq!(before.len(), 2);
        assert_eq!(after.len(), 3);
        assert!(scope.is_open());
    }

    #[test]
    fn test_drop_closes_scope() {
        let scope = scope();
        let closer = scope.closer();
        assert!(closer.is_open());

        drop(scope);
        assert!(!closer.is_open());
    }

    #[test]
    fn test_closer_closes_from_outside() {
        let scope = scope();
        scope.closer().close();
        assert!(!scope.is_open());
    }

    #[test]
    fn test_foreign_owner_is_detached() {
        let first = scope();
        let second = scope();

        assert!(first.ensure_attached("member", first.id()).is_ok());
        let err = second.ensure_attached("member", first.id()).unwrap_err();
        assert!(matches!(err, QueryError::DetachedAccess { relation: "member", .. }));
    }
}
