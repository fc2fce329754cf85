use serde::{Deserialize, Serialize};

// ============================================================================
// Member Value Objects
// ============================================================================

/// Postal address. Copied into the delivery when an order is placed, so later
/// changes to the member's address do not move existing deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl Address {
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_equality_is_by_value() {
        let a = Address::new("Seoul", "1", "111-111");
        let b = Address::new("Seoul", "1", "111-111");
        let c = Address::new("Gyeonggi", "Suwon", "111-222");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_address_serialization() {
        let address = Address::new("Seoul", "1", "111-111");
        let json = serde_json::to_value(&address).unwrap();

        assert_eq!(json["city"], "Seoul");
        assert_eq!(json["street"], "1");
        assert_eq!(json["zipcode"], "111-111");
    }
}
