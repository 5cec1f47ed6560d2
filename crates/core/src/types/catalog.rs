//! Catalog items offered at the register.

use serde::{Deserialize, Serialize};

use super::{ItemId, Price};

/// An item the register can sell.
///
/// Reference data: fetched once when the register loads and never mutated
/// by the client. Field names follow the backend's JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Catalog key.
    #[serde(rename = "item_id")]
    pub id: ItemId,
    /// Human-readable description, also printed on receipts and sale records.
    #[serde(rename = "item_description")]
    pub description: String,
    /// Unit price.
    pub price: Price,
}

impl CatalogItem {
    /// Create a catalog item.
    #[must_use]
    pub fn new(id: ItemId, description: impl Into<String>, price: Price) -> Self {
        Self {
            id,
            description: description.into(),
            price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_item_wire_names() {
        let json = r#"{"item_id": 3, "item_description": "USB cable", "price": 4.5}"#;
        let item: CatalogItem = serde_json::from_str(json).expect("deserialize");

        assert_eq!(item.id, ItemId::new(3));
        assert_eq!(item.description, "USB cable");
        assert_eq!(item.price, Price::from_cents(450));
    }
}
