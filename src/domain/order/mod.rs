// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (OrderStatus, DeliveryStatus)
// - Errors (OrderError)
// - Aggregate (Order owning Delivery and OrderItems)
//
// Construction is the only write rule kept here: an order is built atomically
// from an existing member, a fresh delivery and a non-empty list of lines.
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod aggregate;

pub use value_objects::*;
pub use errors::*;
pub use aggregate::*;
