use serde::{Deserialize, Serialize};

use super::errors::ItemError;
use super::value_objects::ItemKind;

// ============================================================================
// Item - shared catalog entry
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub price: i32,
    pub stock_quantity: i32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    pub fn new(name: impl Into<String>, price: i32, stock_quantity: i32, kind: ItemKind) -> Self {
        Self {
            id: 0,
            name: name.into(),
            price,
            stock_quantity,
            kind,
        }
    }

    pub fn book(
        name: impl Into<String>,
        price: i32,
        stock_quantity: i32,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            price,
            stock_quantity,
            ItemKind::Book { author: author.into(), isbn: isbn.into() },
        )
    }

    /// Stock never goes negative; the item is left untouched on failure.
    pub fn remove_stock(&mut self, quantity: i32) -> Result<(), ItemError> {
        if quantity <= 0 {
            return Err(ItemError::InvalidQuantity(quantity));
        }

        let rest = self.stock_quantity - quantity;
        if rest < 0 {
            return Err(ItemError::NotEnoughStock {
                name: self.name.clone(),
                requested: quantity,
                available: self.stock_quantity,
            });
        }

        self.stock_quantity = rest;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpa_book() -> Item {
        Item::book("JPA1 Book", 10000, 100, "Kim", "1111")
    }

    #[test]
    fn test_remove_stock() {
        let mut item = jpa_book();
        item.remove_stock(30).unwrap();
        assert_eq!(item.stock_quantity, 70);
    }

    #[test]
    fn test_remove_all_stock_is_allowed() {
        let mut item = jpa_book();
        item.remove_stock(100).unwrap();
        assert_eq!(item.stock_quantity, 0);
    }

    #[test]
    fn test_cannot_drive_stock_negative() {
        let mut item = jpa_book();

        let result = item.remove_stock(101);
        assert!(matches!(
            result,
            Err(ItemError::NotEnoughStock { requested: 101, available: 100, .. })
        ));
        assert_eq!(item.stock_quantity, 100);
    }

    #[test]
    fn test_non_positive_quantities_rejected() {
        let mut item = jpa_book();
        assert_eq!(item.remove_stock(0), Err(ItemError::InvalidQuantity(0)));
        assert_eq!(item.remove_stock(-1), Err(ItemError::InvalidQuantity(-1)));
    }

    #[test]
    fn test_item_serializes_variant_inline() {
        let json = serde_json::to_value(jpa_book()).unwrap();
        assert_eq!(json["dtype"], "B");
        assert_eq!(json["name"], "JPA1 Book");
        assert_eq!(json["isbn"], "1111");
    }

    #[test]
    fn test_item_fields_are_camel_case() {
        let json = serde_json::to_value(jpa_book()).unwrap();
        assert_eq!(json["stockQuantity"], 100);
        assert!(json.get("stock_quantity").is_none());

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, jpa_book());
    }
}
