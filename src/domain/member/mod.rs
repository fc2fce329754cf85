// ============================================================================
// Member Domain
// ============================================================================
//
// - Value objects (Address)
// - Aggregate (Member)
//
// A member owns zero or more orders on the inverse side; the order holds the
// reference, so nothing here points back at orders.
//
// ============================================================================

pub mod value_objects;
pub mod aggregate;

pub use value_objects::*;
pub use aggregate::*;
