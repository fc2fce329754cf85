use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::{QueryError, QueryResult, ReadScope};
use crate::domain::item::Item;
use crate::domain::member::Member;
use crate::domain::order::{Delivery, OrderStatus};
use crate::store::{OrderHeaderRow, OrderItemRecord, OrderRecord, StoreError};

// ============================================================================
// Order Graph - the aggregate with eager or lazy relations
// ============================================================================
//
// Order ──► Member          (to-one)
//       ──► Delivery        (to-one, owned)
//       ──► [OrderItem] ──► Item
//
// A relation is either attached by the query that produced the order, or
// loaded on first access through the scope the order was read in. Only the
// former stays readable once the scope closes; a lazily fetched value is
// reachable through its open owning scope alone.
//
// ============================================================================

/// A relation slot owned by one read scope.
#[derive(Debug)]
pub struct Relation<T> {
    name: &'static str,
    owner: Uuid,
    eager: bool,
    cell: OnceCell<T>,
}

impl<T> Relation<T> {
    pub fn lazy(name: &'static str, owner: Uuid) -> Self {
        Self {
            name,
            owner,
            eager: false,
            cell: OnceCell::new(),
        }
    }

    pub fn loaded(name: &'static str, owner: Uuid, value: T) -> Self {
        Self {
            name,
            owner,
            eager: true,
            cell: OnceCell::new_with(Some(value)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Fill the slot from a batch load. A slot that is already filled keeps
    /// its value. The relation stays lazy: reads still need the open scope.
    pub fn attach(&self, value: T) {
        let _ = self.cell.set(value);
    }

    /// Return the value, loading it through `scope` on first access. Eagerly
    /// attached values are always readable; anything else requires `scope`
    /// to be the owner and still open, cached or not.
    pub async fn get_or_load<F, Fut>(&self, scope: &ReadScope, load: F) -> QueryResult<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = QueryResult<T>>,
    {
        if self.eager {
            if let Some(value) = self.cell.get() {
                return Ok(value);
            }
        }
        scope.ensure_attached(self.name, self.owner)?;
        self.cell.get_or_try_init(load).await
    }
}

fn not_found(entity: &'static str, id: i64) -> QueryError {
    QueryError::Store(StoreError::NotFound { entity, id })
}

// ============================================================================
// Graph Nodes
// ============================================================================

#[derive(Debug)]
pub struct OrderItemGraph {
    pub id: i64,
    pub item_id: i64,
    pub order_price: i32,
    pub count: i32,
    item: Relation<Item>,
}

impl OrderItemGraph {
    pub fn lazy(record: &OrderItemRecord, owner: Uuid) -> Self {
        Self {
            id: record.id,
            item_id: record.item_id,
            order_price: record.order_price,
            count: record.count,
            item: Relation::lazy("order_item.item", owner),
        }
    }

    pub fn with_item(record: &OrderItemRecord, item: Item, owner: Uuid) -> Self {
        Self {
            item: Relation::loaded("order_item.item", owner, item),
            ..Self::lazy(record, owner)
        }
    }

    pub fn attach_item(&self, item: Item) {
        self.item.attach(item);
    }

    pub async fn item(&self, scope: &ReadScope) -> QueryResult<&Item> {
        let item_id = self.item_id;
        self.item
            .get_or_load(scope, || async move {
                scope
                    .find_items_by_ids(&[item_id])
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| not_found("item", item_id))
            })
            .await
    }
}

#[derive(Debug)]
pub struct OrderGraph {
    pub id: i64,
    pub member_id: i64,
    pub delivery_id: i64,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    member: Relation<Member>,
    delivery: Relation<Delivery>,
    order_items: Relation<Vec<OrderItemGraph>>,
}

impl OrderGraph {
    /// Every relation lazy.
    pub fn lazy(record: OrderRecord, owner: Uuid) -> Self {
        Self {
            id: record.id,
            member_id: record.member_id,
            delivery_id: record.delivery_id,
            order_date: record.order_date,
            status: record.status,
            member: Relation::lazy("order.member", owner),
            delivery: Relation::lazy("order.delivery", owner),
            order_items: Relation::lazy("order.order_items", owner),
        }
    }

    /// Member and delivery attached, order items still lazy.
    pub fn with_to_one(header: OrderHeaderRow, owner: Uuid) -> Self {
        let OrderHeaderRow { order, member, delivery } = header;
        Self {
            member: Relation::loaded("order.member", owner, member),
            delivery: Relation::loaded("order.delivery", owner, delivery),
            ..Self::lazy(order, owner)
        }
    }

    pub fn attach_order_items(&self, lines: Vec<OrderItemGraph>) {
        self.order_items.attach(lines);
    }

    pub fn order_items_loaded(&self) -> Option<&[OrderItemGraph]> {
        self.order_items.get().map(Vec::as_slice)
    }

    pub async fn member(&self, scope: &ReadScope) -> QueryResult<&Member> {
        let member_id = self.member_id;
        self.member
            .get_or_load(scope, || async move {
                scope
                    .find_member(member_id)
                    .await?
                    .ok_or_else(|| not_found("member", member_id))
            })
            .await
    }

    pub async fn delivery(&self, scope: &ReadScope) -> QueryResult<&Delivery> {
        let delivery_id = self.delivery_id;
        self.delivery
            .get_or_load(scope, || async move {
                scope
                    .find_delivery(delivery_id)
                    .await?
                    .ok_or_else(|| not_found("delivery", delivery_id))
            })
            .await
    }

    pub async fn order_items(&self, scope: &ReadScope) -> QueryResult<&[OrderItemGraph]> {
        let order_id = self.id;
        let lines = self
            .order_items
            .get_or_load(scope, || async move {
                let records = scope.find_order_items_by_order_ids(&[order_id]).await?;
                Ok(records
                    .iter()
                    .map(|record| OrderItemGraph::lazy(record, scope.id()))
                    .collect())
            })
            .await?;
        Ok(lines.as_slice())
    }

    /// Walk every relation (loading what is still lazy) into an owned tree.
    /// Relation order: member, delivery, order items, then each item.
    pub async fn materialize(&self, scope: &ReadScope) -> QueryResult<OrderEntity> {
        let member = self.member(scope).await?.clone();
        let delivery = self.delivery(scope).await?.clone();

        let mut order_items = Vec::new();
        for line in self.order_items(scope).await? {
            order_items.push(OrderItemEntity {
                id: line.id,
                item: line.item(scope).await?.clone(),
                order_price: line.order_price,
                count: line.count,
            });
        }

        Ok(OrderEntity {
            id: self.id,
            member,
            delivery,
            order_items,
            order_date: self.order_date,
            status: self.status,
        })
    }
}

// ============================================================================
// Materialized Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemEntity {
    pub id: i64,
    pub item: Item,
    pub order_price: i32,
    pub count: i32,
}

/// Fully loaded order aggregate, detached from any scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEntity {
    pub id: i64,
    pub member: Member,
    pub delivery: Delivery,
    pub order_items: Vec<OrderItemEntity>,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}
