// ============================================================================
// Item Domain - Catalog Items and Categories
// ============================================================================
//
// - Value objects (ItemKind: Book, Album, Movie)
// - Errors (ItemError)
// - Aggregate (Item with stock rules)
// - Category (many-to-many with Item)
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod aggregate;
pub mod category;

pub use value_objects::*;
pub use errors::*;
pub use aggregate::*;
pub use category::*;
