use serde::{Deserialize, Serialize};

use super::value_objects::Address;

// ============================================================================
// Member
// ============================================================================

/// Identity `0` means "not yet persisted"; the writer assigns the real id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub address: Address,
}

impl Member {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            id: 0,
            name: name.into(),
            address,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_member_is_transient() {
        let member = Member::new("userA", Address::new("Seoul", "1", "111-111"));

        assert_eq!(member.name, "userA");
        assert!(!member.is_persisted());
    }
}
