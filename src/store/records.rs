use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::item::Item;
use crate::domain::member::{Address, Member};
use crate::domain::order::{Delivery, OrderStatus};

// ============================================================================
// Store Records - the shapes each query capability returns
// ============================================================================

/// An order row with its to-one relations left as foreign keys.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub id: i64,
    pub member_id: i64,
    pub delivery_id: i64,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

/// An order line with its item left as a foreign key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemRecord {
    pub id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub order_price: i32,
    pub count: i32,
}

/// Result of the to-one join: order + member + delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderHeaderRow {
    pub order: OrderRecord,
    pub member: Member,
    pub delivery: Delivery,
}

/// Result of the collection fetch join: one row per (order, line) pair.
/// `line` is `None` for an order without lines.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchJoinRow {
    pub header: OrderHeaderRow,
    pub line: Option<(OrderItemRecord, Item)>,
}

/// Direct projection of the to-one join into order-level fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummaryRow {
    pub order_id: i64,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
}

/// Line projection keyed by its owning order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemQueryRow {
    pub order_id: i64,
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

/// Fully flattened order × line row. Line columns are all `None` when the
/// order has no lines (left join).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFlatRow {
    pub order_id: i64,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
    pub item_name: Option<String>,
    pub order_price: Option<i32>,
    pub count: Option<i32>,
}

impl OrderHeaderRow {
    pub fn summary(&self) -> OrderSummaryRow {
        OrderSummaryRow {
            order_id: self.order.id,
            name: self.member.name.clone(),
            order_date: self.order.order_date,
            order_status: self.order.status,
            address: self.delivery.address.clone(),
        }
    }
}
