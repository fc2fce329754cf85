use serde::{Deserialize, Serialize};

// ============================================================================
// Category - many-to-many with Item
// ============================================================================
//
// Part of the owning model only; no retrieval path reads categories.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub item_ids: Vec<i64>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            parent_id: None,
            item_ids: Vec::new(),
        }
    }

    pub fn child_of(name: impl Into<String>, parent: &Category) -> Self {
        Self {
            parent_id: Some(parent.id),
            ..Self::new(name)
        }
    }

    /// Adding the same item twice is a no-op.
    pub fn add_item(&mut self, item_id: i64) {
        if !self.item_ids.contains(&item_id) {
            self.item_ids.push(item_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item_is_idempotent() {
        let mut category = Category::new("Books");
        category.add_item(1);
        category.add_item(2);
        category.add_item(1);

        assert_eq!(category.item_ids, vec![1, 2]);
    }

    #[test]
    fn test_child_category_points_at_parent() {
        let mut parent = Category::new("Media");
        parent.id = 7;

        let child = Category::child_of("Books", &parent);
        assert_eq!(child.parent_id, Some(7));
    }
}
