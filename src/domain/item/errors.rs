// ============================================================================
// Item Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ItemError {
    #[error("need more stock for item '{name}': requested {requested}, available {available}")]
    NotEnoughStock {
        name: String,
        requested: i32,
        available: i32,
    },

    #[error("Invalid stock quantity: {0}")]
    InvalidQuantity(i32),
}
