use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::graph::OrderGraph;
use super::projection::OrderSummaryView;
use super::{QueryResult, ReadScope};
use crate::store::{OrderSearch, Page};

// ============================================================================
// Simple Order Listings - order-level fields only (no lines)
// ============================================================================
//
// v1 / v2  entity graph, lazy member + delivery    1 + 2N queries
// v3       to-one fetch join                        1 query
// v4       direct projection                        1 query
//
// All four page over orders.
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SummaryStrategy {
    EntityGraph,
    EntityDto,
    ToOneFetchJoin,
    DirectProjection,
}

impl SummaryStrategy {
    pub const ALL: [SummaryStrategy; 4] = [
        SummaryStrategy::EntityGraph,
        SummaryStrategy::EntityDto,
        SummaryStrategy::ToOneFetchJoin,
        SummaryStrategy::DirectProjection,
    ];

    pub fn version(&self) -> &'static str {
        match self {
            SummaryStrategy::EntityGraph => "simple-v1",
            SummaryStrategy::EntityDto => "simple-v2",
            SummaryStrategy::ToOneFetchJoin => "simple-v3",
            SummaryStrategy::DirectProjection => "simple-v4",
        }
    }
}

impl fmt::Display for SummaryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version())
    }
}

impl FromStr for SummaryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SummaryStrategy::ALL
            .into_iter()
            .find(|strategy| {
                let version = strategy.version();
                version.eq_ignore_ascii_case(s) || version.trim_start_matches("simple-").eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| format!("unknown summary strategy '{s}'"))
    }
}

pub async fn summaries(
    scope: &ReadScope,
    strategy: SummaryStrategy,
    search: &OrderSearch,
    page: Option<Page>,
) -> QueryResult<Vec<OrderSummaryView>> {
    match strategy {
        SummaryStrategy::EntityGraph | SummaryStrategy::EntityDto => lazy_to_one(scope, search, page).await,
        SummaryStrategy::ToOneFetchJoin => Ok(scope
            .find_orders_with_member_delivery(search, page)
            .await?
            .iter()
            .map(|header| OrderSummaryView::from(header.summary()))
            .collect()),
        SummaryStrategy::DirectProjection => Ok(scope
            .find_order_summaries(search, page)
            .await?
            .into_iter()
            .map(OrderSummaryView::from)
            .collect()),
    }
}

async fn lazy_to_one(scope: &ReadScope, search: &OrderSearch, page: Option<Page>) -> QueryResult<Vec<OrderSummaryView>> {
    let graphs: Vec<OrderGraph> = scope
        .find_orders(search, page)
        .await?
        .into_iter()
        .map(|record| OrderGraph::lazy(record, scope.id()))
        .collect();

    let mut views = Vec::with_capacity(graphs.len());
    for graph in &graphs {
        let member = graph.member(scope).await?;
        let delivery = graph.delivery(scope).await?;
        views.push(OrderSummaryView {
            order_id: graph.id,
            name: member.name.clone(),
            order_date: graph.order_date,
            order_status: graph.status,
            address: delivery.address.clone(),
        });
    }
    Ok(views)
}
