use serde::{Deserialize, Serialize};

// ============================================================================
// Item Value Objects
// ============================================================================

/// Variant-specific data of an item. The variant is stored as a `dtype`
/// discriminator column, the same way it is serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype")]
pub enum ItemKind {
    #[serde(rename = "B")]
    Book { author: String, isbn: String },
    #[serde(rename = "A")]
    Album { artist: String, etc: String },
    #[serde(rename = "M")]
    Movie { director: String, actor: String },
}

impl ItemKind {
    pub fn dtype(&self) -> &'static str {
        match self {
            ItemKind::Book { .. } => "B",
            ItemKind::Album { .. } => "A",
            ItemKind::Movie { .. } => "M",
        }
    }
}
