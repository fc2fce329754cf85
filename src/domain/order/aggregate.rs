use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::item::Item;
use crate::domain::member::{Address, Member};
use super::errors::OrderError;
use super::value_objects::{DeliveryStatus, OrderStatus};

// ============================================================================
// Delivery - owned exclusively by one order
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: i64,
    pub address: Address,
    pub status: DeliveryStatus,
}

impl Delivery {
    /// A delivery ready to ship to the given address.
    pub fn ready(address: Address) -> Self {
        Self {
            id: 0,
            address,
            status: DeliveryStatus::Ready,
        }
    }

    pub fn for_member(member: &Member) -> Self {
        Self::ready(member.address.clone())
    }
}

// ============================================================================
// OrderItem - one order line
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub item_id: i64,
    /// Price at the time of ordering, independent of later item price changes.
    pub order_price: i32,
    pub count: i32,
}

impl OrderItem {
    /// Snapshot the price and take `count` units out of the item's stock.
    pub fn create(item: &mut Item, order_price: i32, count: i32) -> Result<Self, OrderError> {
        if count <= 0 {
            return Err(OrderError::InvalidCount(count));
        }
        if order_price < 0 {
            return Err(OrderError::InvalidPrice(order_price));
        }
        if item.id == 0 {
            return Err(OrderError::TransientItem(item.name.clone()));
        }

        item.remove_stock(count)?;

        Ok(Self {
            id: 0,
            item_id: item.id,
            order_price,
            count,
        })
    }

    pub fn total_price(&self) -> i64 {
        i64::from(self.order_price) * i64::from(self.count)
    }
}

// ============================================================================
// Order Aggregate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub member_id: i64,
    pub delivery: Delivery,
    pub order_items: Vec<OrderItem>,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    pub fn create(
        member: &Member,
        delivery: Delivery,
        order_items: Vec<OrderItem>,
    ) -> Result<Self, OrderError> {
        if !member.is_persisted() {
            return Err(OrderError::TransientMember);
        }
        if order_items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        Ok(Self {
            id: 0,
            member_id: member.id,
            delivery,
            order_items,
            order_date: Utc::now(),
            status: OrderStatus::Order,
        })
    }

    pub fn total_price(&self) -> i64 {
        self.order_items.iter().map(OrderItem::total_price).sum()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
