use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::item::{Category, Item};
use crate::domain::member::Member;
use crate::domain::order::{Delivery, Order};
use super::{
    FetchJoinRow, OrderFlatRow, OrderHeaderRow, OrderItemQueryRow, OrderItemRecord, OrderRecord,
    OrderSearch, OrderStore, OrderSummaryRow, OrderWriter, Page, StoreError, StoreResult,
};

// ============================================================================
// In-Memory Order Store
// ============================================================================
//
// Tables behind one RwLock. Each query takes the read lock for its own
// duration only, so a retrieval call sees committed writes between its
// queries (read-committed), and never holds a lock across queries.
//
// Ids come from one shared sequence, so BTreeMap order == insertion order.
//
// ============================================================================

#[derive(Default)]
struct Tables {
    next_id: i64,
    members: BTreeMap<i64, Member>,
    items: BTreeMap<i64, Item>,
    categories: BTreeMap<i64, Category>,
    deliveries: BTreeMap<i64, Delivery>,
    orders: BTreeMap<i64, OrderRecord>,
    order_items: BTreeMap<i64, OrderItemRecord>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Orders whose member exists and which pass the search predicate.
    fn matching_orders<'a>(
        &'a self,
        search: &'a OrderSearch,
    ) -> impl Iterator<Item = (&'a OrderRecord, &'a Member)> + 'a {
        self.orders.values().filter_map(move |order| {
            let member = self.members.get(&order.member_id)?;
            search
                .matches(&member.name, order.status)
                .then_some((order, member))
        })
    }

    fn header(&self, order: &OrderRecord, member: &Member) -> StoreResult<OrderHeaderRow> {
        let delivery = self
            .deliveries
            .get(&order.delivery_id)
            .ok_or(StoreError::NotFound { entity: "delivery", id: order.delivery_id })?;

        Ok(OrderHeaderRow {
            order: order.clone(),
            member: member.clone(),
            delivery: delivery.clone(),
        })
    }

    /// Lines of one order joined with their items, in line-id order.
    /// Lines whose item is gone are dropped (inner join on item).
    fn lines_of(&self, order_id: i64) -> impl Iterator<Item = (&OrderItemRecord, &Item)> + '_ {
        self.order_items
            .values()
            .filter(move |line| line.order_id == order_id)
            .filter_map(move |line| self.items.get(&line.item_id).map(|item| (line, item)))
    }
}

pub struct InMemoryOrderStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
    executed: AtomicU64,
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            unavailable: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            executed: AtomicU64::new(0),
        }
    }

    /// Simulate an outage: every query fails with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Simulate network latency on every query.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Queries that reached the tables (after latency, before outage check).
    pub fn executed_queries(&self) -> u64 {
        self.executed.load(Ordering::SeqCst)
    }

    /// Insert an order row with a delivery but no lines, bypassing the
    /// domain constructor. Only useful to exercise left-join behavior.
    pub async fn insert_order_without_items(
        &self,
        member_id: i64,
        delivery: Delivery,
        status: crate::domain::order::OrderStatus,
    ) -> i64 {
        let mut tables = self.tables.write().await;
        let delivery_id = tables.next_id();
        tables.deliveries.insert(delivery_id, Delivery { id: delivery_id, ..delivery });

        let order_id = tables.next_id();
        tables.orders.insert(
            order_id,
            OrderRecord {
                id: order_id,
                member_id,
                delivery_id,
                order_date: chrono::Utc::now(),
                status,
            },
        );
        order_id
    }

    async fn before_query(&self, query: &'static str) -> StoreResult<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        self.executed.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            tracing::error!(query, "In-memory store is marked unavailable");
            return Err(StoreError::Unavailable(format!(
                "in-memory store offline while running {query}"
            )));
        }

        tracing::debug!(query, backend = "memory", "Executing store query");
        Ok(())
    }
}

// ============================================================================
// Read Capabilities
// ============================================================================

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_orders(&self, search: &OrderSearch, page: Option<Page>) -> StoreResult<Vec<OrderRecord>> {
        self.before_query("find_orders").await?;
        let tables = self.tables.read().await;

        let rows = tables.matching_orders(search).map(|(order, _)| order.clone());
        Ok(Page::slice(page, rows))
    }

    async fn find_member(&self, id: i64) -> StoreResult<Option<Member>> {
        self.before_query("find_member").await?;
        Ok(self.tables.read().await.members.get(&id).cloned())
    }

    async fn find_delivery(&self, id: i64) -> StoreResult<Option<Delivery>> {
        self.before_query("find_delivery").await?;
        Ok(self.tables.read().await.deliveries.get(&id).cloned())
    }

    async fn find_items_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Item>> {
        self.before_query("find_items_by_ids").await?;
        let tables = self.tables.read().await;

        Ok(tables
            .items
            .values()
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect())
    }

    async fn find_orders_with_member_delivery(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> StoreResult<Vec<OrderHeaderRow>> {
        self.before_query("find_orders_with_member_delivery").await?;
        let tables = self.tables.read().await;

        let matching: Vec<_> = tables.matching_orders(search).collect();
        Page::slice(page, matching)
            .into_iter()
            .map(|(order, member)| tables.header(order, member))
            .collect()
    }

    async fn find_order_items_by_order_ids(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItemRecord>> {
        self.before_query("find_order_items_by_order_ids").await?;
        let tables = self.tables.read().await;

        Ok(tables
            .order_items
            .values()
            .filter(|line| order_ids.contains(&line.order_id))
            .cloned()
            .collect())
    }

    async fn find_orders_with_items(&self, search: &OrderSearch) -> StoreResult<Vec<FetchJoinRow>> {
        self.before_query("find_orders_with_items").await?;
        let tables = self.tables.read().await;

        let mut rows = Vec::new();
        for (order, member) in tables.matching_orders(search) {
            let header = tables.header(order, member)?;
            let mut lines = tables.lines_of(order.id).peekable();

            if lines.peek().is_none() {
                rows.push(FetchJoinRow { header, line: None });
                continue;
            }
            for (line, item) in lines {
                rows.push(FetchJoinRow {
                    header: header.clone(),
                    line: Some((line.clone(), item.clone())),
                });
            }
        }
        Ok(rows)
    }

    async fn find_order_summaries(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> StoreResult<Vec<OrderSummaryRow>> {
        self.before_query("find_order_summaries").await?;
        let tables = self.tables.read().await;

        let matching: Vec<_> = tables.matching_orders(search).collect();
        Page::slice(page, matching)
            .into_iter()
            .map(|(order, member)| tables.header(order, member).map(|header| header.summary()))
            .collect()
    }

    async fn find_order_item_rows(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItemQueryRow>> {
        self.before_query("find_order_item_rows").await?;
        let tables = self.tables.read().await;

        Ok(tables
            .order_items
            .values()
            .filter(|line| order_ids.contains(&line.order_id))
            .filter_map(|line| {
                tables.items.get(&line.item_id).map(|item| OrderItemQueryRow {
                    order_id: line.order_id,
                    item_name: item.name.clone(),
                    order_price: line.order_price,
                    count: line.count,
                })
            })
            .collect())
    }

    async fn find_order_flat_rows(&self, search: &OrderSearch) -> StoreResult<Vec<OrderFlatRow>> {
        self.before_query("find_order_flat_rows").await?;
        let tables = self.tables.read().await;

        let mut rows = Vec::new();
        for (order, member) in tables.matching_orders(search) {
            let summary = tables.header(order, member)?.summary();
            let flat = |item_name, order_price, count| OrderFlatRow {
                order_id: summary.order_id,
                name: summary.name.clone(),
                order_date: summary.order_date,
                order_status: summary.order_status,
                address: summary.address.clone(),
                item_name,
                order_price,
                count,
            };

            let before = rows.len();
            for (line, item) in tables.lines_of(order.id) {
                rows.push(flat(Some(item.name.clone()), Some(line.order_price), Some(line.count)));
            }
            if rows.len() == before {
                rows.push(flat(None, None, None));
            }
        }
        Ok(rows)
    }
}

// ============================================================================
// Write Path
// ============================================================================

#[async_trait]
impl OrderWriter for InMemoryOrderStore {
    async fn save_member(&self, member: &mut Member) -> StoreResult<i64> {
        self.before_query("save_member").await?;
        let mut tables = self.tables.write().await;

        if member.id == 0 {
            member.id = tables.next_id();
        }
        tables.members.insert(member.id, member.clone());
        Ok(member.id)
    }

    async fn save_item(&self, item: &mut Item) -> StoreResult<i64> {
        self.before_query("save_item").await?;
        let mut tables = self.tables.write().await;

        if item.id == 0 {
            item.id = tables.next_id();
        } else if !tables.items.contains_key(&item.id) {
            return Err(StoreError::NotFound { entity: "item", id: item.id });
        }
        tables.items.insert(item.id, item.clone());
        Ok(item.id)
    }

    async fn save_category(&self, category: &mut Category) -> StoreResult<i64> {
        self.before_query("save_category").await?;
        let mut tables = self.tables.write().await;

        if let Some(missing) = category.item_ids.iter().find(|id| !tables.items.contains_key(id)) {
            return Err(StoreError::NotFound { entity: "item", id: *missing });
        }
        if let Some(parent_id) = category.parent_id.filter(|id| !tables.categories.contains_key(id)) {
            return Err(StoreError::NotFound { entity: "category", id: parent_id });
        }
        if category.id == 0 {
            category.id = tables.next_id();
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category.id)
    }

    async fn save_order(&self, order: &mut Order) -> StoreResult<i64> {
        self.before_query("save_order").await?;
        let mut tables = self.tables.write().await;

        if !tables.members.contains_key(&order.member_id) {
            return Err(StoreError::NotFound { entity: "member", id: order.member_id });
        }
        if let Some(line) = order.order_items.iter().find(|line| !tables.items.contains_key(&line.item_id)) {
            return Err(StoreError::NotFound { entity: "item", id: line.item_id });
        }

        order.delivery.id = tables.next_id();
        tables.deliveries.insert(order.delivery.id, order.delivery.clone());

        order.id = tables.next_id();
        tables.orders.insert(
            order.id,
            OrderRecord {
                id: order.id,
                member_id: order.member_id,
                delivery_id: order.delivery.id,
                order_date: order.order_date,
                status: order.status,
            },
        );

        for line in &mut order.order_items {
            line.id = tables.next_id();
            tables.order_items.insert(
                line.id,
                OrderItemRecord {
                    id: line.id,
                    order_id: order.id,
                    item_id: line.item_id,
                    order_price: line.order_price,
                    count: line.count,
                },
            );
        }

        tracing::debug!(
            order_id = order.id,
            line_count = order.order_items.len(),
            "Saved order with delivery and lines"
        );
        Ok(order.id)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
