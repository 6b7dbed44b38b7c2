//! Staging and canonical records
//!
//! Staging rows are minimally-transformed copies of streamed records, keyed by
//! external id. Catalog items are the canonical business rows derived from
//! staging on every transform.

use crate::domain::ids::ExternalId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Staged product variant (primary record)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingVariant {
    pub external_id: ExternalId,
    /// Natural business key (SKU)
    pub natural_key: Option<String>,
    pub title: Option<String>,
    pub product_id: Option<String>,
    pub product_type: Option<String>,
    pub tags: Option<String>,
    pub price: Option<String>,
    pub compare_at_price: Option<String>,
    /// Metafield values keyed by their query alias
    pub metafields: BTreeMap<String, String>,
}

impl StagingVariant {
    /// Empty variant for the given id
    pub fn new(external_id: ExternalId) -> Self {
        Self {
            external_id,
            natural_key: None,
            title: None,
            product_id: None,
            product_type: None,
            tags: None,
            price: None,
            compare_at_price: None,
            metafields: BTreeMap::new(),
        }
    }

    /// Look up an attribute by name: known scalars first, then metafield aliases
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let scalar = match name {
            "sku" | "natural_key" => self.natural_key.as_deref(),
            "title" => self.title.as_deref(),
            "product_type" => self.product_type.as_deref(),
            "tags" => self.tags.as_deref(),
            "price" => self.price.as_deref(),
            "compare_at_price" => self.compare_at_price.as_deref(),
            _ => None,
        };
        scalar.or_else(|| self.metafields.get(name).map(String::as_str))
    }
}

/// Staged inventory level (child record of a variant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingInventoryLevel {
    pub external_id: ExternalId,
    pub parent_external_id: ExternalId,
    pub incoming: i64,
    pub committed: i64,
}

/// Whether an upsert created or replaced a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Canonical category a catalog item is filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Whether this is the pre-order flavour of the category
    pub preorder: bool,
}

/// Values that must survive a canonical rebuild, keyed by natural key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickyFields {
    pub display_order: Option<i32>,
}

/// Canonical catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub natural_key: String,
    pub external_id: ExternalId,
    pub title: Option<String>,
    pub category_id: i64,
    pub preorder: bool,
    pub price: Option<String>,
    pub compare_at_price: Option<String>,
    /// Required pricing fields captured from staging
    pub pricing: BTreeMap<String, String>,
    /// `max(0, incoming - committed)` across linked inventory levels
    pub pending_supply: i64,
    pub display_order: Option<i32>,
}

impl CatalogItem {
    /// Copy sticky values onto this row
    pub fn apply_sticky(&mut self, sticky: &StickyFields) {
        self.display_order = sticky.display_order;
    }

    /// Extract sticky values from this row
    pub fn sticky(&self) -> StickyFields {
        StickyFields {
            display_order: self.display_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_attribute_prefers_scalars() {
        let mut variant =
            StagingVariant::new(ExternalId::from_str("gid://shopify/ProductVariant/1").unwrap());
        variant.price = Some("10.00".to_string());
        variant
            .metafields
            .insert("price".to_string(), "99.00".to_string());
        variant
            .metafields
            .insert("wholesale_price".to_string(), "5.00".to_string());

        assert_eq!(variant.attribute("price"), Some("10.00"));
        assert_eq!(variant.attribute("wholesale_price"), Some("5.00"));
        assert_eq!(variant.attribute("missing"), None);
    }

    #[test]
    fn test_sticky_round_trip() {
        let mut item = CatalogItem {
            natural_key: "ABC-123".to_string(),
            external_id: ExternalId::from_str("gid://shopify/ProductVariant/1").unwrap(),
            title: None,
            category_id: 1,
            preorder: false,
            price: None,
            compare_at_price: None,
            pricing: BTreeMap::new(),
            pending_supply: 0,
            display_order: None,
        };
        item.apply_sticky(&StickyFields {
            display_order: Some(7),
        });
        assert_eq!(item.sticky().display_order, Some(7));
    }
}
