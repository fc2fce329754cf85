use anyhow::Result;

use crate::domain::item::{Category, Item};
use crate::domain::member::{Address, Member};
use crate::domain::order::{Delivery, Order, OrderItem};
use super::OrderWriter;

// ============================================================================
// Demo Data
// ============================================================================
//
// Two orders:
// - userA: JPA1 Book (10000 x 1), JPA2 Book (20000 x 2)    -> 50000
// - userB: Spring1 Book (20000 x 1)                        -> 20000
//
// "Spring2 Book" is stocked but never ordered. All four books sit in a
// "Books" category under a "Media" parent.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct SeededOrders {
    pub order_ids: Vec<i64>,
    pub member_ids: Vec<i64>,
    pub category_ids: Vec<i64>,
}

pub async fn seed_demo_data<W: OrderWriter + ?Sized>(writer: &W) -> Result<SeededOrders> {
    let mut user_a = Member::new("userA", Address::new("Seoul", "1", "111-111"));
    writer.save_member(&mut user_a).await?;

    let mut jpa1 = Item::book("JPA1 Book", 10000, 100, "Kim", "9788960777330");
    let mut jpa2 = Item::book("JPA2 Book", 20000, 100, "Kim", "9788960777331");
    writer.save_item(&mut jpa1).await?;
    writer.save_item(&mut jpa2).await?;

    let (jpa1_price, jpa2_price) = (jpa1.price, jpa2.price);
    let lines = vec![
        OrderItem::create(&mut jpa1, jpa1_price, 1)?,
        OrderItem::create(&mut jpa2, jpa2_price, 2)?,
    ];
    let mut first = Order::create(&user_a, Delivery::for_member(&user_a), lines)?;
    writer.save_item(&mut jpa1).await?;
    writer.save_item(&mut jpa2).await?;
    writer.save_order(&mut first).await?;

    let mut user_b = Member::new("userB", Address::new("Gyeonggi", "Suwon", "111-222"));
    writer.save_member(&mut user_b).await?;

    let mut spring1 = Item::book("Spring1 Book", 20000, 200, "Park", "9791158390730");
    let mut spring2 = Item::book("Spring2 Book", 40000, 300, "Park", "9791158390731");
    writer.save_item(&mut spring1).await?;
    writer.save_item(&mut spring2).await?;

    let spring1_price = spring1.price;
    let lines = vec![OrderItem::create(&mut spring1, spring1_price, 1)?];
    let mut second = Order::create(&user_b, Delivery::for_member(&user_b), lines)?;
    writer.save_item(&mut spring1).await?;
    writer.save_order(&mut second).await?;

    let mut media = Category::new("Media");
    writer.save_category(&mut media).await?;

    let mut books = Category::child_of("Books", &media);
    for book in [&jpa1, &jpa2, &spring1, &spring2] {
        books.add_item(book.id);
    }
    writer.save_category(&mut books).await?;

    tracing::info!(
        first_order = first.id,
        second_order = second.id,
        "🌱 Seeded demo orders"
    );

    Ok(SeededOrders {
        order_ids: vec![first.id, second.id],
        member_ids: vec![user_a.id, user_b.id],
        category_ids: vec![media.id, books.id],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryOrderStore, OrderSearch, OrderStore};

    #[tokio::test]
    async fn test_seed_creates_two_orders() {
        let store = InMemoryOrderStore::new();
        let seeded = seed_demo_data(&store).await.unwrap();

        assert_eq!(seeded.order_ids.len(), 2);
        let orders = store.find_orders(&OrderSearch::all(), None).await.unwrap();
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, seeded.order_ids);
    }

    #[tokio::test]
    async fn test_seed_decrements_stock() {
        let store = InMemoryOrderStore::new();
        let seeded = seed_demo_data(&store).await.unwrap();

        let lines = store
            .find_order_items_by_order_ids(&seeded.order_ids[..1])
            .await
            .unwrap();
        let item_ids: Vec<i64> = lines.iter().map(|l| l.item_id).collect();
        let items = store.find_items_by_ids(&item_ids).await.unwrap();

        let jpa2 = items.iter().find(|i| i.name == "JPA2 Book").unwrap();
        assert_eq!(jpa2.stock_quantity, 98);
    }

    #[tokio::test]
    async fn test_seed_nests_books_under_media() {
        let store = InMemoryOrderStore::new();
        let seeded = seed_demo_data(&store).await.unwrap();

        assert_eq!(seeded.category_ids.len(), 2);
        assert_ne!(seeded.category_ids[0], seeded.category_ids[1]);
        assert!(seeded.category_ids.iter().all(|id| *id > 0));
    }
}
