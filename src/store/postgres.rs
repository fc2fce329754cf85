use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::domain::item::{Category, Item, ItemKind};
use crate::domain::member::{Address, Member};
use crate::domain::order::{Delivery, DeliveryStatus, Order, OrderStatus};
use super::{
    FetchJoinRow, OrderFlatRow, OrderHeaderRow, OrderItemQueryRow, OrderItemRecord, OrderRecord,
    OrderSearch, OrderStore, OrderSummaryRow, OrderWriter, Page, StoreError, StoreResult,
};

// ============================================================================
// Postgres Order Store (sqlx)
// ============================================================================
//
// One SQL statement per capability. Every order query shares the same
// predicate: $1 = member name substring (NULL = any), $2 = status (NULL = any).
// Paged queries add $3 = LIMIT, $4 = OFFSET (NULL = no limit / offset 0).
//
// Line joins are LEFT joins over (order_item JOIN item), so orders without
// lines still produce exactly one row.
//
// Reads run straight on the pool, one connection per statement and no
// surrounding transaction. Multi-statement writes run in one transaction.
//
// ============================================================================

const SCHEMA: &str = include_str!("../../migrations/0001_create_order_tables.sql");

const ORDER_PREDICATE: &str = "
    WHERE ($1::text IS NULL OR strpos(m.name, $1::text) > 0)
      AND ($2::text IS NULL OR o.status = $2::text)";

const TO_ONE_COLUMNS: &str = "
    o.order_id, o.member_id, o.delivery_id, o.order_date, o.status,
    m.name AS member_name, m.city AS member_city, m.street AS member_street, m.zipcode AS member_zipcode,
    d.city AS delivery_city, d.street AS delivery_street, d.zipcode AS delivery_zipcode,
    d.status AS delivery_status";

const TO_ONE_JOIN: &str = "
    FROM orders o
    JOIN member m ON m.member_id = o.member_id
    JOIN delivery d ON d.delivery_id = o.delivery_id";

const LINE_JOIN: &str = "
    LEFT JOIN (order_item oi JOIN item i ON i.item_id = oi.item_id)
           ON oi.order_id = o.order_id";

const ITEM_COLUMNS: &str = "
    i.item_id, i.dtype, i.name AS item_name, i.price AS item_price, i.stock_quantity,
    i.author, i.isbn, i.artist, i.etc, i.director, i.actor";

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the configured pool size, acquire timeout and
    /// server-side statement timeout.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let options = PgConnectOptions::from_str(&config.database_url)?.options([(
            "statement_timeout",
            format!("{}s", config.statement_timeout_secs),
        )]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            statement_timeout_secs = config.statement_timeout_secs,
            "🐘 Connected to Postgres"
        );
        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("Order schema is in place");
        Ok(())
    }

    fn order_query(sql: &str) -> String {
        format!("{sql} {ORDER_PREDICATE} ORDER BY o.order_id LIMIT $3 OFFSET $4")
    }
}

// ============================================================================
// Row Decoding
// ============================================================================

fn order_status(raw: &str) -> StoreResult<OrderStatus> {
    raw.parse()
        .map_err(|_| StoreError::Corrupt(format!("unknown order status '{raw}'")))
}

fn decode_order(row: &PgRow) -> StoreResult<OrderRecord> {
    let status: String = row.try_get("status")?;
    Ok(OrderRecord {
        id: row.try_get("order_id")?,
        member_id: row.try_get("member_id")?,
        delivery_id: row.try_get("delivery_id")?,
        order_date: row.try_get("order_date")?,
        status: order_status(&status)?,
    })
}

fn decode_member(row: &PgRow) -> StoreResult<Member> {
    Ok(Member {
        id: row.try_get("member_id")?,
        name: row.try_get("member_name")?,
        address: Address {
            city: row.try_get("member_city")?,
            street: row.try_get("member_street")?,
            zipcode: row.try_get("member_zipcode")?,
        },
    })
}

fn decode_delivery(row: &PgRow) -> StoreResult<Delivery> {
    let status: String = row.try_get("delivery_status")?;
    Ok(Delivery {
        id: row.try_get("delivery_id")?,
        address: Address {
            city: row.try_get("delivery_city")?,
            street: row.try_get("delivery_street")?,
            zipcode: row.try_get("delivery_zipcode")?,
        },
        status: DeliveryStatus::from_str(&status)
            .map_err(|_| StoreError::Corrupt(format!("unknown delivery status '{status}'")))?,
    })
}

fn decode_header(row: &PgRow) -> StoreResult<OrderHeaderRow> {
    Ok(OrderHeaderRow {
        order: decode_order(row)?,
        member: decode_member(row)?,
        delivery: decode_delivery(row)?,
    })
}

fn decode_item(row: &PgRow) -> StoreResult<Item> {
    let dtype: String = row.try_get("dtype")?;
    let column = |name: &str| -> StoreResult<String> {
        Ok(row.try_get::<Option<String>, _>(name)?.unwrap_or_default())
    };

    let kind = match dtype.as_str() {
        "B" => ItemKind::Book { author: column("author")?, isbn: column("isbn")? },
        "A" => ItemKind::Album { artist: column("artist")?, etc: column("etc")? },
        "M" => ItemKind::Movie { director: column("director")?, actor: column("actor")? },
        other => return Err(StoreError::Corrupt(format!("unknown item dtype '{other}'"))),
    };

    Ok(Item {
        id: row.try_get("item_id")?,
        name: row.try_get("item_name")?,
        price: row.try_get("item_price")?,
        stock_quantity: row.try_get("stock_quantity")?,
        kind,
    })
}

fn decode_line(row: &PgRow) -> StoreResult<OrderItemRecord> {
    Ok(OrderItemRecord {
        id: row.try_get("order_item_id")?,
        order_id: row.try_get("order_id")?,
        item_id: row.try_get("item_id")?,
        order_price: row.try_get("order_price")?,
        count: row.try_get("count")?,
    })
}

fn decode_summary(row: &PgRow) -> StoreResult<OrderSummaryRow> {
    let status: String = row.try_get("status")?;
    Ok(OrderSummaryRow {
        order_id: row.try_get("order_id")?,
        name: row.try_get("member_name")?,
        order_date: row.try_get("order_date")?,
        order_status: order_status(&status)?,
        address: Address {
            city: row.try_get("delivery_city")?,
            street: row.try_get("delivery_street")?,
            zipcode: row.try_get("delivery_zipcode")?,
        },
    })
}

/// Variant columns in table order: author, isbn, artist, etc, director, actor.
fn kind_columns(kind: &ItemKind) -> [Option<&str>; 6] {
    match kind {
        ItemKind::Book { author, isbn } => [Some(author.as_str()), Some(isbn.as_str()), None, None, None, None],
        ItemKind::Album { artist, etc } => [None, None, Some(artist.as_str()), Some(etc.as_str()), None, None],
        ItemKind::Movie { director, actor } => {
            [None, None, None, None, Some(director.as_str()), Some(actor.as_str())]
        }
    }
}

// ============================================================================
// Read Capabilities
// ============================================================================

#[async_trait]
impl OrderStore for PgOrderStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn find_orders(&self, search: &OrderSearch, page: Option<Page>) -> StoreResult<Vec<OrderRecord>> {
        let sql = Self::order_query(
            "SELECT o.order_id, o.member_id, o.delivery_id, o.order_date, o.status
             FROM orders o JOIN member m ON m.member_id = o.member_id",
        );

        let rows = sqlx::query(&sql)
            .bind(search.name_filter())
            .bind(search.order_status.map(|s| s.as_str()))
            .bind(page.map(|p| p.limit))
            .bind(page.map(|p| p.offset))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_order).collect()
    }

    async fn find_member(&self, id: i64) -> StoreResult<Option<Member>> {
        let row = sqlx::query(
            "SELECT member_id, name AS member_name, city AS member_city,
                    street AS member_street, zipcode AS member_zipcode
             FROM member WHERE member_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_member).transpose()
    }

    async fn find_delivery(&self, id: i64) -> StoreResult<Option<Delivery>> {
        let row = sqlx::query(
            "SELECT delivery_id, city AS delivery_city, street AS delivery_street,
                    zipcode AS delivery_zipcode, status AS delivery_status
             FROM delivery WHERE delivery_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_delivery).transpose()
    }

    async fn find_items_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM item i WHERE i.item_id = ANY($1)");
        let rows = sqlx::query(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_item).collect()
    }

    async fn find_orders_with_member_delivery(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> StoreResult<Vec<OrderHeaderRow>> {
        let sql = Self::order_query(&format!("SELECT {TO_ONE_COLUMNS} {TO_ONE_JOIN}"));

        let rows = sqlx::query(&sql)
            .bind(search.name_filter())
            .bind(search.order_status.map(|s| s.as_str()))
            .bind(page.map(|p| p.limit))
            .bind(page.map(|p| p.offset))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_header).collect()
    }

    async fn find_order_items_by_order_ids(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItemRecord>> {
        let rows = sqlx::query(
            "SELECT order_item_id, order_id, item_id, order_price, count
             FROM order_item
             WHERE order_id = ANY($1)
             ORDER BY order_item_id",
        )
        .bind(order_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_line).collect()
    }

    async fn find_orders_with_items(&self, search: &OrderSearch) -> StoreResult<Vec<FetchJoinRow>> {
        let sql = format!(
            "SELECT {TO_ONE_COLUMNS},
                    oi.order_item_id, oi.order_price, oi.count, {ITEM_COLUMNS}
             {TO_ONE_JOIN} {LINE_JOIN} {ORDER_PREDICATE}
             ORDER BY o.order_id, oi.order_item_id"
        );

        let rows = sqlx::query(&sql)
            .bind(search.name_filter())
            .bind(search.order_status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let header = decode_header(row)?;
                let line_id: Option<i64> = row.try_get("order_item_id")?;
                let line = match line_id {
                    None => None,
                    Some(id) => {
                        let item = decode_item(row)?;
                        let record = OrderItemRecord {
                            id,
                            order_id: header.order.id,
                            item_id: item.id,
                            order_price: row.try_get("order_price")?,
                            count: row.try_get("count")?,
                        };
                        Some((record, item))
                    }
                };
                Ok(FetchJoinRow { header, line })
            })
            .collect()
    }

    async fn find_order_summaries(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> StoreResult<Vec<OrderSummaryRow>> {
        let sql = Self::order_query(&format!(
            "SELECT o.order_id, m.name AS member_name, o.order_date, o.status,
                    d.city AS delivery_city, d.street AS delivery_street, d.zipcode AS delivery_zipcode
             {TO_ONE_JOIN}"
        ));

        let rows = sqlx::query(&sql)
            .bind(search.name_filter())
            .bind(search.order_status.map(|s| s.as_str()))
            .bind(page.map(|p| p.limit))
            .bind(page.map(|p| p.offset))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_summary).collect()
    }

    async fn find_order_item_rows(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItemQueryRow>> {
        let rows = sqlx::query(
            "SELECT oi.order_id, i.name AS item_name, oi.order_price, oi.count
             FROM order_item oi
             JOIN item i ON i.item_id = oi.item_id
             WHERE oi.order_id = ANY($1)
             ORDER BY oi.order_item_id",
        )
        .bind(order_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(OrderItemQueryRow {
                    order_id: row.try_get("order_id")?,
                    item_name: row.try_get("item_name")?,
                    order_price: row.try_get("order_price")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    async fn find_order_flat_rows(&self, search: &OrderSearch) -> StoreResult<Vec<OrderFlatRow>> {
        let sql = format!(
            "SELECT o.order_id, m.name AS member_name, o.order_date, o.status,
                    d.city AS delivery_city, d.street AS delivery_street, d.zipcode AS delivery_zipcode,
                    i.name AS item_name, oi.order_price, oi.count
             {TO_ONE_JOIN} {LINE_JOIN} {ORDER_PREDICATE}
             ORDER BY o.order_id, oi.order_item_id"
        );

        let mut stream = sqlx::query(&sql)
            .bind(search.name_filter())
            .bind(search.order_status.map(|s| s.as_str()))
            .fetch(&self.pool);

        let mut flat = Vec::new();
        while let Some(row) = stream.try_next().await? {
            let summary = decode_summary(&row)?;
            flat.push(OrderFlatRow {
                order_id: summary.order_id,
                name: summary.name,
                order_date: summary.order_date,
                order_status: summary.order_status,
                address: summary.address,
                item_name: row.try_get("item_name")?,
                order_price: row.try_get("order_price")?,
                count: row.try_get("count")?,
            });
        }
        Ok(flat)
    }
}

// ============================================================================
// Write Path
// ============================================================================

#[async_trait]
impl OrderWriter for PgOrderStore {
    async fn save_member(&self, member: &mut Member) -> StoreResult<i64> {
        if member.id == 0 {
            member.id = sqlx::query_scalar(
                "INSERT INTO member (name, city, street, zipcode)
                 VALUES ($1, $2, $3, $4) RETURNING member_id",
            )
            .bind(&member.name)
            .bind(&member.address.city)
            .bind(&member.address.street)
            .bind(&member.address.zipcode)
            .fetch_one(&self.pool)
            .await?;
        } else {
            sqlx::query("UPDATE member SET name = $2, city = $3, street = $4, zipcode = $5 WHERE member_id = $1")
                .bind(member.id)
                .bind(&member.name)
                .bind(&member.address.city)
                .bind(&member.address.street)
                .bind(&member.address.zipcode)
                .execute(&self.pool)
                .await?;
        }
        Ok(member.id)
    }

    async fn save_item(&self, item: &mut Item) -> StoreResult<i64> {
        if item.id != 0 {
            let updated = sqlx::query(
                "UPDATE item SET name = $2, price = $3, stock_quantity = $4 WHERE item_id = $1",
            )
            .bind(item.id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.stock_quantity)
            .execute(&self.pool)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(StoreError::NotFound { entity: "item", id: item.id });
            }
            return Ok(item.id);
        }

        let [author, isbn, artist, etc, director, actor] = kind_columns(&item.kind);
        item.id = sqlx::query_scalar(
            "INSERT INTO item (dtype, name, price, stock_quantity, author, isbn, artist, etc, director, actor)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING item_id",
        )
        .bind(item.kind.dtype())
        .bind(&item.name)
        .bind(item.price)
        .bind(item.stock_quantity)
        .bind(author)
        .bind(isbn)
        .bind(artist)
        .bind(etc)
        .bind(director)
        .bind(actor)
        .fetch_one(&self.pool)
        .await?;

        Ok(item.id)
    }

    async fn save_category(&self, category: &mut Category) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;

        if category.id == 0 {
            category.id = sqlx::query_scalar(
                "INSERT INTO category (name, parent_id) VALUES ($1, $2) RETURNING category_id",
            )
            .bind(&category.name)
            .bind(category.parent_id)
            .fetch_one(&mut *tx)
            .await?;
        }

        for item_id in &category.item_ids {
            sqlx::query(
                "INSERT INTO category_item (category_id, item_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(category.id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(category.id)
    }

    async fn save_order(&self, order: &mut Order) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;

        order.delivery.id = sqlx::query_scalar(
            "INSERT INTO delivery (city, street, zipcode, status)
             VALUES ($1, $2, $3, $4) RETURNING delivery_id",
        )
        .bind(&order.delivery.address.city)
        .bind(&order.delivery.address.street)
        .bind(&order.delivery.address.zipcode)
        .bind(order.delivery.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        order.id = sqlx::query_scalar(
            "INSERT INTO orders (member_id, delivery_id, order_date, status)
             VALUES ($1, $2, $3, $4) RETURNING order_id",
        )
        .bind(order.member_id)
        .bind(order.delivery.id)
        .bind(order.order_date)
        .bind(order.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for line in &mut order.order_items {
            line.id = sqlx::query_scalar(
                "INSERT INTO order_item (order_id, item_id, order_price, count)
                 VALUES ($1, $2, $3, $4) RETURNING order_item_id",
            )
            .bind(order.id)
            .bind(line.item_id)
            .bind(line.order_price)
            .bind(line.count)
            .fetch_one(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            order_id = order.id,
            line_count = order.order_items.len(),
            "Saved order with delivery and lines"
        );
        Ok(order.id)
    }
}
