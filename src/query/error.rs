use uuid::Uuid;

use super::RetrievalStrategy;
use crate::store::StoreError;

// ============================================================================
// Query Errors - the retrieval error taxonomy
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("unsupported pagination for this strategy ({strategy})")]
    UnsupportedPagination { strategy: RetrievalStrategy },

    #[error("invalid page: offset must be >= 0 and limit > 0 (offset={offset}, limit={limit})")]
    InvalidPage { offset: i64, limit: i64 },

    #[error("'{relation}' accessed outside its read scope {scope_id}")]
    DetachedAccess {
        relation: &'static str,
        scope_id: Uuid,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Stable machine-readable kind, used in response bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::UnsupportedPagination { .. } => "unsupported_pagination",
            QueryError::InvalidPage { .. } => "invalid_page",
            QueryError::DetachedAccess { .. } => "detached_access",
            QueryError::Store(_) => "store_error",
        }
    }

    /// Caller mistakes, raised before any query runs.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            QueryError::UnsupportedPagination { .. } | QueryError::InvalidPage { .. }
        )
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let err = QueryError::UnsupportedPagination { strategy: RetrievalStrategy::FlatGroup };
        assert_eq!(err.kind(), "unsupported_pagination");
        assert!(err.is_bad_request());
        assert!(err.to_string().contains("unsupported pagination for this strategy"));

        let err = QueryError::Store(StoreError::Unavailable("down".into()));
        assert_eq!(err.kind(), "store_error");
        assert!(!err.is_bad_request());
        assert!(err.to_string().contains("down"));
    }
}
