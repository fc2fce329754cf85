use crate::query::projection::{group_item_rows, OrderItemView, OrderView};
use crate::query::{QueryResult, ReadScope};
use crate::store::{OrderSearch, Page};

/// v4: order-level projection (pageable), then one line query per order.
pub async fn per_order(scope: &ReadScope, search: &OrderSearch, page: Option<Page>) -> QueryResult<Vec<OrderView>> {
    let summaries = scope.find_order_summaries(search, page).await?;

    let mut views = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let lines: Vec<OrderItemView> = scope
            .find_order_item_rows(&[summary.order_id])
            .await?
            .into_iter()
            .map(OrderItemView::from)
            .collect();
        views.push(OrderView::from_summary(summary, lines));
    }
    Ok(views)
}

/// v5: order-level projection (pageable), then every line for the page in
/// one IN query, bucketed by order id in memory.
pub async fn two_query(scope: &ReadScope, search: &OrderSearch, page: Option<Page>) -> QueryResult<Vec<OrderView>> {
    let summaries = scope.find_order_summaries(search, page).await?;
    if summaries.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i64> = summaries.iter().map(|summary| summary.order_id).collect();
    let mut lines = group_item_rows(scope.find_order_item_rows(&order_ids).await?);

    Ok(summaries
        .into_iter()
        .map(|summary| {
            let order_items = lines.remove(&summary.order_id).unwrap_or_default();
            OrderView::from_summary(summary, order_items)
        })
        .collect())
}
