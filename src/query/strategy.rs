use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Retrieval Strategies
// ============================================================================
//
// | version | plan                                   | round trips            | paging   |
// |---------|----------------------------------------|------------------------|----------|
// | v1      | entity graph, lazy relations           | 1 + N per relation     | yes      |
// | v2      | v1 mapped to views                     | same as v1             | yes      |
// | v3      | collection fetch join                  | 1                      | rejected |
// | v3.1    | to-one join + batched to-many          | 1 + ceil(N / batch)    | yes      |
// | v4      | view projection + one query per order  | 1 + N                  | yes      |
// | v5      | view projection + one IN query         | 2                      | yes      |
// | v6      | flat join + in-memory grouping         | 1                      | rejected |
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetrievalStrategy {
    EntityGraph,
    EntityDto,
    CollectionFetchJoin,
    BatchFetch,
    DtoPerOrder,
    DtoTwoQuery,
    FlatGroup,
}

impl RetrievalStrategy {
    pub const ALL: [RetrievalStrategy; 7] = [
        RetrievalStrategy::EntityGraph,
        RetrievalStrategy::EntityDto,
        RetrievalStrategy::CollectionFetchJoin,
        RetrievalStrategy::BatchFetch,
        RetrievalStrategy::DtoPerOrder,
        RetrievalStrategy::DtoTwoQuery,
        RetrievalStrategy::FlatGroup,
    ];

    /// Endpoint version, also the metric label.
    pub fn version(&self) -> &'static str {
        match self {
            RetrievalStrategy::EntityGraph => "v1",
            RetrievalStrategy::EntityDto => "v2",
            RetrievalStrategy::CollectionFetchJoin => "v3",
            RetrievalStrategy::BatchFetch => "v3.1",
            RetrievalStrategy::DtoPerOrder => "v4",
            RetrievalStrategy::DtoTwoQuery => "v5",
            RetrievalStrategy::FlatGroup => "v6",
        }
    }

    /// Strategies that join the to-many side page over rows, not orders.
    pub fn supports_pagination(&self) -> bool {
        !matches!(
            self,
            RetrievalStrategy::CollectionFetchJoin | RetrievalStrategy::FlatGroup
        )
    }
}

impl fmt::Display for RetrievalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version())
    }
}

impl FromStr for RetrievalStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RetrievalStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.version().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown retrieval strategy '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_parse_back() {
        for strategy in RetrievalStrategy::ALL {
            assert_eq!(strategy.version().parse::<RetrievalStrategy>().unwrap(), strategy);
        }
        assert!("v7".parse::<RetrievalStrategy>().is_err());
    }

    #[test]
    fn test_collection_joins_reject_pagination() {
        let rejecting: Vec<_> = RetrievalStrategy::ALL
            .into_iter()
            .filter(|s| !s.supports_pagination())
            .collect();
        assert_eq!(
            rejecting,
            vec![RetrievalStrategy::CollectionFetchJoin, RetrievalStrategy::FlatGroup]
        );
    }
}
