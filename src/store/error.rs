// ============================================================================
// Store Errors - persistence failures, passed through unchanged
// ============================================================================

/// Postgres `query_canceled`, raised when `statement_timeout` fires.
const PG_QUERY_CANCELED: &str = "57014";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Failures a caller may reasonably retry later. The retrieval core itself
    /// never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Database(sqlx::Error::PoolTimedOut)
            | StoreError::Database(sqlx::Error::PoolClosed)
            | StoreError::Database(sqlx::Error::Io(_)) => true,
            StoreError::Database(sqlx::Error::Database(db)) => {
                db.code().as_deref() == Some(PG_QUERY_CANCELED)
            }
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Unavailable("down".into()).is_transient());
        assert!(StoreError::Database(sqlx::Error::PoolTimedOut).is_transient());

        assert!(!StoreError::NotFound { entity: "member", id: 1 }.is_transient());
        assert!(!StoreError::Corrupt("bad dtype".into()).is_transient());
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_transient());
    }

    #[test]
    fn test_detail_is_preserved_in_message() {
        let err = StoreError::Unavailable("connection refused (127.0.0.1:5432)".into());
        assert!(err.to_string().contains("127.0.0.1:5432"));
    }
}
