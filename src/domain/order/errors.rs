use crate::domain::item::ItemError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OrderError {
    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid item count: {0}")]
    InvalidCount(i32),

    #[error("Invalid order price: {0}")]
    InvalidPrice(i32),

    #[error("Order member must be persisted before ordering")]
    TransientMember,

    #[error("Order item references an unsaved item: {0}")]
    TransientItem(String),

    #[error(transparent)]
    Stock(#[from] ItemError),
}
