// ============================================================================
// Strategy Plans
// ============================================================================
//
// Each plan takes an open ReadScope and a filter, and returns orders in
// ascending order id with lines in insertion order. Pagination has already
// been validated by the guard.
//
// ============================================================================

pub mod batch_fetch;
pub mod dto_projection;
pub mod entity_graph;
pub mod fetch_join;
pub mod flat_group;
