use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::graph::OrderEntity;
use crate::domain::member::Address;
use crate::domain::order::OrderStatus;
use crate::store::{OrderFlatRow, OrderItemQueryRow, OrderSummaryRow};

// ============================================================================
// Projection Assembler - aggregates and rows into response views
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: i64,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemView>,
}

/// Order-level fields only, for the simple order listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryView {
    pub order_id: i64,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
}

impl OrderView {
    pub fn from_entity(entity: &OrderEntity) -> Self {
        Self {
            order_id: entity.id,
            name: entity.member.name.clone(),
            order_date: entity.order_date,
            order_status: entity.status,
            address: entity.delivery.address.clone(),
            order_items: entity
                .order_items
                .iter()
                .map(|line| OrderItemView {
                    item_name: line.item.name.clone(),
                    order_price: line.order_price,
                    count: line.count,
                })
                .collect(),
        }
    }

    pub fn from_summary(summary: OrderSummaryRow, order_items: Vec<OrderItemView>) -> Self {
        Self {
            order_id: summary.order_id,
            name: summary.name,
            order_date: summary.order_date,
            order_status: summary.order_status,
            address: summary.address,
            order_items,
        }
    }

    pub fn total_price(&self) -> i64 {
        self.order_items
            .iter()
            .map(|line| i64::from(line.order_price) * i64::from(line.count))
            .sum()
    }
}

impl From<OrderSummaryRow> for OrderSummaryView {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            order_id: row.order_id,
            name: row.name,
            order_date: row.order_date,
            order_status: row.order_status,
            address: row.address,
        }
    }
}

impl From<OrderItemQueryRow> for OrderItemView {
    fn from(row: OrderItemQueryRow) -> Self {
        Self {
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        }
    }
}

// ============================================================================
// Flat Row Grouping
// ============================================================================

/// Full order identity. Two rows belong to the same order only if every
/// order-level column agrees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OrderKey {
    order_id: i64,
    name: String,
    order_date: DateTime<Utc>,
    order_status: OrderStatus,
    address: Address,
}

/// Group flat (order × line) rows into views in one pass. Orders keep their
/// first-seen position; lines keep row order. A row without line columns
/// (left join on an order with no lines) contributes the order only.
pub fn group_flat_rows(rows: Vec<OrderFlatRow>) -> Vec<OrderView> {
    let mut positions: HashMap<OrderKey, usize> = HashMap::new();
    let mut views: Vec<OrderView> = Vec::new();

    for row in rows {
        let key = OrderKey {
            order_id: row.order_id,
            name: row.name,
            order_date: row.order_date,
            order_status: row.order_status,
            address: row.address,
        };

        let position = match positions.get(&key) {
            Some(position) => *position,
            None => {
                views.push(OrderView {
                    order_id: key.order_id,
                    name: key.name.clone(),
                    order_date: key.order_date,
                    order_status: key.order_status,
                    address: key.address.clone(),
                    order_items: Vec::new(),
                });
                positions.insert(key, views.len() - 1);
                views.len() - 1
            }
        };

        if let (Some(item_name), Some(order_price), Some(count)) = (row.item_name, row.order_price, row.count) {
            views[position].order_items.push(OrderItemView {
                item_name,
                order_price,
                count,
            });
        }
    }

    views
}

/// Bucket line rows by owning order, keeping row order within each bucket.
pub fn group_item_rows(rows: Vec<OrderItemQueryRow>) -> HashMap<i64, Vec<OrderItemView>> {
    let mut by_order: HashMap<i64, Vec<OrderItemView>> = HashMap::new();
    for row in rows {
        by_order.entry(row.order_id).or_default().push(row.into());
    }
    by_order
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn flat(order_id: i64, item: Option<(&str, i32, i32)>) -> OrderFlatRow {
        OrderFlatRow {
            order_id,
            name: format!("user{order_id}"),
            order_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            order_status: OrderStatus::Order,
            address: Address::new("Seoul", "1", "111-111"),
            item_name: item.map(|(name, _, _)| name.to_string()),
            order_price: item.map(|(_, price, _)| price),
            count: item.map(|(_, _, count)| count),
        }
    }

    #[test]
    fn test_groups_lines_under_their_order() {
        let views = group_flat_rows(vec![
            flat(1, Some(("JPA1 Book", 10000, 1))),
            flat(1, Some(("JPA2 Book", 20000, 2))),
            flat(2, Some(("Spring1 Book", 20000, 1))),
        ]);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].order_items.len(), 2);
        assert_eq!(views[0].order_items[1].item_name, "JPA2 Book");
        assert_eq!(views[0].total_price(), 50000);
        assert_eq!(views[1].total_price(), 20000);
    }

    #[test]
    fn test_order_without_lines_is_kept() {
        let views = group_flat_rows(vec![flat(7, None)]);
        assert_eq!(views.len(), 1);
        assert!(views[0].order_items.is_empty());
    }

    #[test]
    fn test_identity_includes_every_order_column() {
        let mut renamed = flat(1, Some(("B", 2, 1)));
        renamed.name = "someone else".into();

        let views = group_flat_rows(vec![flat(1, Some(("A", 1, 1))), renamed]);
        assert_eq!(views.len(), 2);
    }

    #[test]
    fn test_group_item_rows_keeps_row_order() {
        let row = |order_id, name: &str| OrderItemQueryRow {
            order_id,
            item_name: name.into(),
            order_price: 1,
            count: 1,
        };
        let grouped = group_item_rows(vec![row(1, "a"), row(2, "x"), row(1, "b")]);

        let names: Vec<_> = grouped[&1].iter().map(|l| l.item_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(grouped[&2].len(), 1);
    }

    proptest! {
        #[test]
        fn prop_grouping_preserves_first_seen_order_and_every_line(
            order_ids in prop::collection::vec(1i64..6, 0..40)
        ) {
            let rows: Vec<_> = order_ids
                .iter()
                .enumerate()
                .map(|(i, id)| flat(*id, Some(("line", i as i32, 1))))
                .collect();

            let views = group_flat_rows(rows);

            // first-seen order of distinct ids, no duplicates
            let mut expected_ids = Vec::new();
            for id in &order_ids {
                if !expected_ids.contains(id) {
                    expected_ids.push(*id);
                }
            }
            let ids: Vec<_> = views.iter().map(|v| v.order_id).collect();
            prop_assert_eq!(ids, expected_ids);

            // every line kept, in row order within its order
            let total: usize = views.iter().map(|v| v.order_items.len()).sum();
            prop_assert_eq!(total, order_ids.len());
            for view in &views {
                let prices: Vec<_> = view.order_items.iter().map(|l| l.order_price).collect();
                let mut sorted = prices.clone();
                sorted.sort();
                prop_assert_eq!(prices, sorted);
            }
        }
    }
}
