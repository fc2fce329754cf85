use std::collections::HashMap;

use crate::query::graph::{OrderGraph, OrderItemGraph};
use crate::query::projection::OrderView;
use crate::query::{QueryResult, ReadScope};
use crate::store::{FetchJoinRow, OrderSearch};

/// v3: a single collection fetch join. The join repeats each order once per
/// line, so rows are folded back into one graph per order id before mapping.
pub async fn views(scope: &ReadScope, search: &OrderSearch) -> QueryResult<Vec<OrderView>> {
    let rows = scope.find_orders_with_items(search).await?;
    let row_count = rows.len();
    let graphs = dedupe(rows, scope);

    tracing::debug!(
        scope_id = %scope.id(),
        rows = row_count,
        orders = graphs.len(),
        "Folded fetch-join rows by order id"
    );

    let mut views = Vec::with_capacity(graphs.len());
    for graph in &graphs {
        views.push(OrderView::from_entity(&graph.materialize(scope).await?));
    }
    Ok(views)
}

/// One fully attached graph per distinct order, in first-seen order.
fn dedupe(rows: Vec<FetchJoinRow>, scope: &ReadScope) -> Vec<OrderGraph> {
    let mut positions: HashMap<i64, usize> = HashMap::new();
    let mut headers = Vec::new();
    let mut lines: Vec<Vec<OrderItemGraph>> = Vec::new();

    for FetchJoinRow { header, line } in rows {
        let position = *positions.entry(header.order.id).or_insert_with(|| {
            headers.push(header);
            lines.push(Vec::new());
            headers.len() - 1
        });

        if let Some((record, item)) = line {
            lines[position].push(OrderItemGraph::with_item(&record, item, scope.id()));
        }
    }

    headers
        .into_iter()
        .zip(lines)
        .map(|(header, lines)| {
            let graph = OrderGraph::with_to_one(header, scope.id());
            graph.attach_order_items(lines);
            graph
        })
        .collect()
}
