use super::{QueryError, QueryResult, RetrievalStrategy};
use crate::store::Page;

/// Pagination guard. Runs before a scope is opened, so a rejected request
/// never reaches the store.
///
/// Bounds are checked first; a well-formed page against a collection-join
/// strategy is then rejected outright rather than silently paging over rows.
pub fn check_page(strategy: RetrievalStrategy, page: Option<Page>) -> QueryResult<Option<Page>> {
    let Some(page) = page else {
        return Ok(None);
    };

    let page = check_bounds(page)?;
    if !strategy.supports_pagination() {
        tracing::warn!(strategy = %strategy, offset = page.offset, limit = page.limit, "Rejecting paged request");
        return Err(QueryError::UnsupportedPagination { strategy });
    }

    Ok(Some(page))
}

/// Offset must be non-negative and limit positive.
pub fn check_bounds(page: Page) -> QueryResult<Page> {
    if page.offset < 0 || page.limit <= 0 {
        return Err(QueryError::InvalidPage {
            offset: page.offset,
            limit: page.limit,
        });
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaged_always_passes() {
        for strategy in RetrievalStrategy::ALL {
            assert_eq!(check_page(strategy, None).unwrap(), None);
        }
    }

    #[test]
    fn test_page_is_forwarded_unchanged() {
        let page = Page::new(1, 1);
        assert_eq!(check_page(RetrievalStrategy::BatchFetch, Some(page)).unwrap(), Some(page));
    }

    #[test]
    fn test_bounds() {
        let err = check_page(RetrievalStrategy::DtoTwoQuery, Some(Page::new(-1, 10))).unwrap_err();
        assert!(matches!(err, QueryError::InvalidPage { offset: -1, limit: 10 }));

        let err = check_page(RetrievalStrategy::DtoTwoQuery, Some(Page::new(0, 0))).unwrap_err();
        assert!(matches!(err, QueryError::InvalidPage { .. }));
    }

    #[test]
    fn test_collection_joins_are_rejected() {
        let err = check_page(RetrievalStrategy::CollectionFetchJoin, Some(Page::new(0, 100))).unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnsupportedPagination { strategy: RetrievalStrategy::CollectionFetchJoin }
        ));

        let err = check_page(RetrievalStrategy::FlatGroup, Some(Page::new(0, 100))).unwrap_err();
        assert_eq!(err.kind(), "unsupported_pagination");
    }
}
