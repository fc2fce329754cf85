use crate::query::projection::{group_flat_rows, OrderView};
use crate::query::{QueryResult, ReadScope};
use crate::store::OrderSearch;

/// v6: one fully flattened join, grouped on the full order identity.
pub async fn views(scope: &ReadScope, search: &OrderSearch) -> QueryResult<Vec<OrderView>> {
    let rows = scope.find_order_flat_rows(search).await?;
    Ok(group_flat_rows(rows))
}
