// ============================================================================
// Store - Persistence Collaborator
// ============================================================================
//
// The retrieval core sees the store only through these two traits:
// - OrderStore:  read-side query capabilities (one method per query shape)
// - OrderWriter: the write path needed to build an aggregate in the first place
//
// Backends:
// - InMemoryOrderStore (tests, demo)
// - PgOrderStore (sqlx / Postgres)
//
// ============================================================================

mod error;
mod records;
mod search;
pub mod memory;
pub mod postgres;
pub mod seed;

use async_trait::async_trait;

use crate::domain::item::{Category, Item};
use crate::domain::member::Member;
use crate::domain::order::{Delivery, Order};

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;
pub use records::*;
pub use search::{OrderSearch, Page};

/// Read-side query capabilities. Every method is a single round trip.
///
/// Ordering contract shared by all implementations:
/// - orders come back in ascending order id (insertion order)
/// - order lines come back in ascending line id within an order
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Name used in logs and metrics.
    fn backend(&self) -> &'static str;

    /// Predicate-filtered order query, relations left as keys.
    async fn find_orders(&self, search: &OrderSearch, page: Option<Page>) -> StoreResult<Vec<OrderRecord>>;

    async fn find_member(&self, id: i64) -> StoreResult<Option<Member>>;

    async fn find_delivery(&self, id: i64) -> StoreResult<Option<Delivery>>;

    /// Items by id set. Result order is unspecified.
    async fn find_items_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Item>>;

    /// Join across the to-one relations (member, delivery).
    async fn find_orders_with_member_delivery(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> StoreResult<Vec<OrderHeaderRow>>;

    /// Order lines for a set of owning orders.
    async fn find_order_items_by_order_ids(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItemRecord>>;

    /// Collection fetch join: order → member, delivery, lines → item.
    /// Never paged: one row per (order, line) pair.
    async fn find_orders_with_items(&self, search: &OrderSearch) -> StoreResult<Vec<FetchJoinRow>>;

    /// To-one join projected straight into order-level fields.
    async fn find_order_summaries(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> StoreResult<Vec<OrderSummaryRow>>;

    /// Line projections (item name, price, count) for a set of orders.
    async fn find_order_item_rows(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItemQueryRow>>;

    /// Fully flattened order × line join. Never paged.
    async fn find_order_flat_rows(&self, search: &OrderSearch) -> StoreResult<Vec<OrderFlatRow>>;
}

/// Write path. Ids are assigned by the store and written back into the
/// argument. Saving an order cascades to its delivery and lines.
#[async_trait]
pub trait OrderWriter: Send + Sync {
    async fn save_member(&self, member: &mut Member) -> StoreResult<i64>;

    /// Inserts when `item.id == 0`, otherwise updates price, name and stock.
    async fn save_item(&self, item: &mut Item) -> StoreResult<i64>;

    async fn save_category(&self, category: &mut Category) -> StoreResult<i64>;

    async fn save_order(&self, order: &mut Order) -> StoreResult<i64>;
}
