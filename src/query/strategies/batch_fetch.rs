use std::collections::HashMap;

use crate::query::graph::{OrderGraph, OrderItemGraph};
use crate::query::projection::OrderView;
use crate::query::{QueryResult, ReadScope};
use crate::config::BatchSize;
use crate::domain::item::Item;
use crate::store::{OrderSearch, Page};

/// v3.1: to-one join (pageable), then order lines in batches of parent ids,
/// then the referenced items in batches of item ids. Batches run one after
/// another; dropping the future stops before the next batch.
pub async fn views(
    scope: &ReadScope,
    search: &OrderSearch,
    page: Option<Page>,
    batch_size: BatchSize,
) -> QueryResult<Vec<OrderView>> {
    let graphs: Vec<OrderGraph> = scope
        .find_orders_with_member_delivery(search, page)
        .await?
        .into_iter()
        .map(|header| OrderGraph::with_to_one(header, scope.id()))
        .collect();

    load_order_items(scope, &graphs, batch_size).await?;
    load_items(scope, &graphs, batch_size).await?;

    let mut views = Vec::with_capacity(graphs.len());
    for graph in &graphs {
        views.push(OrderView::from_entity(&graph.materialize(scope).await?));
    }
    Ok(views)
}

async fn load_order_items(scope: &ReadScope, graphs: &[OrderGraph], batch_size: BatchSize) -> QueryResult<()> {
    let order_ids: Vec<i64> = graphs.iter().map(|graph| graph.id).collect();

    let mut by_order: HashMap<i64, Vec<OrderItemGraph>> = HashMap::new();
    for (batch, chunk) in order_ids.chunks(batch_size.get()).enumerate() {
        let records = scope.find_order_items_by_order_ids(chunk).await?;
        tracing::debug!(
            scope_id = %scope.id(),
            batch,
            parents = chunk.len(),
            lines = records.len(),
            "Loaded order item batch"
        );

        for record in &records {
            by_order
                .entry(record.order_id)
                .or_default()
                .push(OrderItemGraph::lazy(record, scope.id()));
        }
    }

    // Every order gets its slot filled, including orders with no lines.
    for graph in graphs {
        graph.attach_order_items(by_order.remove(&graph.id).unwrap_or_default());
    }
    Ok(())
}

async fn load_items(scope: &ReadScope, graphs: &[OrderGraph], batch_size: BatchSize) -> QueryResult<()> {
    let lines: Vec<&OrderItemGraph> = graphs
        .iter()
        .flat_map(|graph| graph.order_items_loaded().unwrap_or_default())
        .collect();

    let mut item_ids: Vec<i64> = Vec::new();
    for line in &lines {
        if !item_ids.contains(&line.item_id) {
            item_ids.push(line.item_id);
        }
    }

    let mut items: HashMap<i64, Item> = HashMap::new();
    for chunk in item_ids.chunks(batch_size.get()) {
        for item in scope.find_items_by_ids(chunk).await? {
            items.insert(item.id, item);
        }
    }

    for line in lines {
        if let Some(item) = items.get(&line.item_id) {
            line.attach_item(item.clone());
        }
    }
    Ok(())
}
