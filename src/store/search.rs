use serde::{Deserialize, Serialize};

use crate::domain::order::OrderStatus;

// ============================================================================
// Order Search - the predicate every order query accepts
// ============================================================================

/// Optional filter on member name (substring match) and order status.
/// A blank name is treated as "no name filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderSearch {
    pub member_name: Option<String>,
    pub order_status: Option<OrderStatus>,
}

impl OrderSearch {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_member(name: impl Into<String>) -> Self {
        Self {
            member_name: Some(name.into()),
            order_status: None,
        }
    }

    pub fn by_status(status: OrderStatus) -> Self {
        Self {
            member_name: None,
            order_status: Some(status),
        }
    }

    /// The name filter with blanks folded to `None`.
    pub fn name_filter(&self) -> Option<&str> {
        self.member_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn matches(&self, member_name: &str, status: OrderStatus) -> bool {
        let name_ok = self
            .name_filter()
            .map_or(true, |needle| member_name.contains(needle));
        let status_ok = self.order_status.map_or(true, |wanted| wanted == status);
        name_ok && status_ok
    }
}

/// Offset/limit over distinct orders. Validated by the pagination guard
/// before it ever reaches a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// Apply the page to an already ordered sequence.
    pub fn slice<I: IntoIterator>(page: Option<Page>, rows: I) -> Vec<I::Item> {
        match page {
            None => rows.into_iter().collect(),
            Some(page) => rows
                .into_iter()
                .skip(usize::try_from(page.offset).unwrap_or(0))
                .take(usize::try_from(page.limit).unwrap_or(0))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_matches_everything() {
        let search = OrderSearch::all();
        assert!(search.matches("userA", OrderStatus::Order));
        assert!(search.matches("userB", OrderStatus::Cancel));
    }

    #[test]
    fn test_member_name_is_substring_match() {
        let search = OrderSearch::by_member("userB");
        assert!(search.matches("userB", OrderStatus::Order));
        assert!(!search.matches("userA", OrderStatus::Order));

        let partial = OrderSearch::by_member("user");
        assert!(partial.matches("userA", OrderStatus::Order));
    }

    #[test]
    fn test_blank_member_name_is_ignored() {
        let search = OrderSearch::by_member("   ");
        assert_eq!(search.name_filter(), None);
        assert!(search.matches("anyone", OrderStatus::Order));
    }

    #[test]
    fn test_status_filter() {
        let search = OrderSearch::by_status(OrderStatus::Cancel);
        assert!(search.matches("userA", OrderStatus::Cancel));
        assert!(!search.matches("userA", OrderStatus::Order));
    }

    #[test]
    fn test_page_slice() {
        let rows = vec![1, 2, 3, 4, 5];
        assert_eq!(Page::slice(Some(Page::new(1, 2)), rows.clone()), vec![2, 3]);
        assert_eq!(Page::slice(Some(Page::new(4, 10)), rows.clone()), vec![5]);
        assert_eq!(Page::slice(None, rows), vec![1, 2, 3, 4, 5]);
    }
}
