// ============================================================================
// Domain Layer - Order Aggregate Model
// ============================================================================
//
// Entities that make up the order aggregate and the references it holds:
// - member: who placed the order (referenced, not owned)
// - item:   catalog items and categories (shared, read-mostly)
// - order:  order, delivery and order lines (owned by the order)
//
// Nothing in here knows how the store materializes relations. The retrieval
// core in `crate::query` decides when and how each relation is loaded.
//
// ============================================================================

pub mod member;
pub mod item;
pub mod order;
