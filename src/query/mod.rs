// ============================================================================
// Query - the order retrieval core
// ============================================================================
//
// caller ──► guard (pagination) ──► ReadScope ──► strategy plan ──► views
//
// - guard:       rejects bad pages and paging against collection joins
// - scope:       one per retrieval; owns every store round trip
// - graph:       aggregate with eager/lazy relations bound to a scope
// - strategies:  the seven order plans (v1..v6, v3.1)
// - summaries:   order-level listings without lines
// - projection:  entities and rows into response views
// - service:     entry point, logging + metrics around every retrieval
//
// ============================================================================

mod error;
mod guard;
mod scope;
mod strategy;
pub mod graph;
pub mod projection;
pub mod service;
pub mod strategies;
pub mod summaries;

pub use error::{QueryError, QueryResult};
pub use guard::{check_bounds, check_page};
pub use graph::{OrderEntity, OrderItemEntity, OrderGraph, OrderItemGraph, Relation};
pub use projection::{group_flat_rows, OrderItemView, OrderSummaryView, OrderView};
pub use scope::{QueryKind, ReadScope, ScopeCloser};
pub use service::OrderQueryService;
pub use strategy::RetrievalStrategy;
pub use summaries::SummaryStrategy;
