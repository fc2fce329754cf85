use crate::query::graph::{OrderEntity, OrderGraph};
use crate::query::projection::OrderView;
use crate::query::{QueryResult, ReadScope};
use crate::store::{OrderSearch, Page};

/// v1: one order query, then every relation resolved lazily per order (N+1).
pub async fn entities(scope: &ReadScope, search: &OrderSearch, page: Option<Page>) -> QueryResult<Vec<OrderEntity>> {
    let graphs: Vec<OrderGraph> = scope
        .find_orders(search, page)
        .await?
        .into_iter()
        .map(|record| OrderGraph::lazy(record, scope.id()))
        .collect();

    let mut entities = Vec::with_capacity(graphs.len());
    for graph in &graphs {
        entities.push(graph.materialize(scope).await?);
    }
    Ok(entities)
}

/// v2: v1 mapped to views. Same round trips.
pub async fn views(scope: &ReadScope, search: &OrderSearch, page: Option<Page>) -> QueryResult<Vec<OrderView>> {
    let entities = entities(scope, search, page).await?;
    Ok(entities.iter().map(OrderView::from_entity).collect())
}
