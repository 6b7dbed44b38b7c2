//! Decoding of individual NDJSON result lines
//!
//! Each line is a flat JSON object. Its `id` resource type decides the record
//! kind: variants are primary records, inventory levels carrying a parent
//! reference are children. Everything else is ignored.

use crate::domain::{ExternalId, Result, StagingVariant, SyncError};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Resource type of primary records
pub const PRIMARY_TYPE: &str = "ProductVariant";

/// Resource type of child records
pub const CHILD_TYPE: &str = "InventoryLevel";

/// Named quantity on a child record, e.g. `incoming` or `committed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuantity {
    pub name: String,
    pub value: i64,
}

/// Inventory level as read from the stream, before reduction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRecord {
    pub external_id: ExternalId,
    pub parent_external_id: ExternalId,
    pub quantities: Vec<NamedQuantity>,
}

/// A decoded stream line
#[derive(Debug, Clone, PartialEq)]
pub enum StreamRecord {
    Primary(StagingVariant),
    Child(ChildRecord),
    Unrecognized,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrimaryLine {
    id: String,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    compare_at_price: Option<Value>,
    #[serde(default)]
    product: Option<ProductRef>,
    #[serde(default)]
    product_type: Option<String>,
    #[serde(default)]
    tags: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRef {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    product_type: Option<String>,
    #[serde(default)]
    tags: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChildLine {
    id: String,
    #[serde(rename = "__parentId", alias = "parentRef")]
    parent_id: String,
    #[serde(default)]
    quantities: Vec<QuantityLine>,
}

#[derive(Debug, Deserialize)]
struct QuantityLine {
    name: String,
    #[serde(alias = "value")]
    quantity: Value,
}

/// Decode one line
///
/// # Errors
///
/// Returns [`SyncError::Parse`] for invalid JSON, non-object lines, or
/// recognized records with malformed fields.
pub fn decode_line(line: &str) -> Result<StreamRecord> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| SyncError::Parse(format!("Invalid JSON line: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| SyncError::Parse("Line is not a JSON object".to_string()))?;

    let resource_type = object
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| ExternalId::new(id).ok())
        .and_then(|id| id.resource_type().map(str::to_string));
    let has_parent = has_parent(object);

    match resource_type.as_deref() {
        Some(PRIMARY_TYPE) => decode_primary(value).map(StreamRecord::Primary),
        Some(CHILD_TYPE) if has_parent => decode_child(value).map(StreamRecord::Child),
        _ => Ok(StreamRecord::Unrecognized),
    }
}

fn has_parent(object: &Map<String, Value>) -> bool {
    object.contains_key("__parentId") || object.contains_key("parentRef")
}

fn decode_primary(value: Value) -> Result<StagingVariant> {
    let line: PrimaryLine = serde_json::from_value(value)
        .map_err(|e| SyncError::Parse(format!("Malformed {} record: {}", PRIMARY_TYPE, e)))?;

    let external_id = ExternalId::new(line.id).map_err(SyncError::Parse)?;
    let product = line.product.unwrap_or_default();

    let mut variant = StagingVariant::new(external_id);
    variant.natural_key = line.sku.filter(|s| !s.trim().is_empty());
    variant.title = product.title.or(line.title);
    variant.product_id = product.id;
    variant.product_type = product.product_type.or(line.product_type);
    variant.tags = product.tags.or(line.tags).and_then(tags_text);
    variant.price = line.price.and_then(scalar_text);
    variant.compare_at_price = line.compare_at_price.and_then(scalar_text);

    // Aliased metafields arrive as `{ "value": ... }` objects
    for (alias, field) in line.extra {
        if let Some(text) = field.get("value").cloned().and_then(scalar_text) {
            variant.metafields.insert(alias, text);
        }
    }

    Ok(variant)
}

fn decode_child(value: Value) -> Result<ChildRecord> {
    let line: ChildLine = serde_json::from_value(value)
        .map_err(|e| SyncError::Parse(format!("Malformed {} record: {}", CHILD_TYPE, e)))?;

    let quantities = line
        .quantities
        .into_iter()
        .map(|q| {
            let value = quantity_value(&q.quantity).ok_or_else(|| {
                SyncError::Parse(format!("Quantity '{}' is not an integer", q.name))
            })?;
            Ok(NamedQuantity {
                name: q.name,
                value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChildRecord {
        external_id: ExternalId::new(line.id).map_err(SyncError::Parse)?,
        parent_external_id: ExternalId::new(line.parent_id).map_err(SyncError::Parse)?,
        quantities,
    })
}

/// Text form of a scalar; objects with an `amount` (money) are unwrapped
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(mut map) => map.remove("amount").and_then(scalar_text),
        _ => None,
    }
}

/// Tags arrive as a list or an already comma-joined string
fn tags_text(value: Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let tags: Vec<String> = items.into_iter().filter_map(scalar_text).collect();
            Some(tags.join(", "))
        }
        other => scalar_text(other),
    }
}

fn quantity_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_primary_with_product_and_metafields() {
        let line = r#"{"id":"gid://shopify/ProductVariant/555","sku":"ABC-123","title":"Small","price":"49.00","compareAtPrice":null,"product":{"id":"gid://shopify/Product/9","title":"Reef Top","productType":"Swimwear","tags":["Swim","Resort PreOrder"]},"season":{"value":"SS25"},"fabric":null}"#;

        let StreamRecord::Primary(variant) = decode_line(line).unwrap() else {
            panic!("expected primary record");
        };
        assert_eq!(variant.natural_key.as_deref(), Some("ABC-123"));
        assert_eq!(variant.title.as_deref(), Some("Reef Top"));
        assert_eq!(variant.product_type.as_deref(), Some("Swimwear"));
        assert_eq!(variant.tags.as_deref(), Some("Swim, Resort PreOrder"));
        assert_eq!(variant.price.as_deref(), Some("49.00"));
        assert_eq!(variant.compare_at_price, None);
        assert_eq!(variant.metafields.get("season").map(String::as_str), Some("SS25"));
        assert!(!variant.metafields.contains_key("fabric"));
    }

    #[test]
    fn test_decode_flat_primary() {
        let line = r#"{"id":"ext://ProductVariant/555","sku":"ABC-123","productType":"Swimwear","tags":"Swim","price":12.5}"#;
        let StreamRecord::Primary(variant) = decode_line(line).unwrap() else {
            panic!("expected primary record");
        };
        assert_eq!(variant.tags.as_deref(), Some("Swim"));
        assert_eq!(variant.price.as_deref(), Some("12.5"));
    }

    #[test]
    fn test_decode_child_keeps_raw_quantities() {
        let line = r#"{"id":"gid://shopify/InventoryLevel/1?inventory_item_id=7","quantities":[{"name":"incoming","quantity":5},{"name":"committed","quantity":"2"}],"__parentId":"gid://shopify/ProductVariant/555"}"#;
        let StreamRecord::Child(child) = decode_line(line).unwrap() else {
            panic!("expected child record");
        };
        assert_eq!(child.parent_external_id.as_str(), "gid://shopify/ProductVariant/555");
        assert_eq!(child.quantities.len(), 2);
        assert_eq!(child.quantities[1].value, 2);
    }

    #[test]
    fn test_child_accepts_parent_ref_alias() {
        let line = r#"{"id":"ext://InventoryLevel/1","parentRef":"ext://ProductVariant/555","quantities":[{"name":"incoming","value":3}]}"#;
        assert!(matches!(decode_line(line).unwrap(), StreamRecord::Child(_)));
    }

    #[test]
    fn test_unknown_types_are_unrecognized() {
        assert_eq!(
            decode_line(r#"{"id":"gid://shopify/Product/1","title":"x"}"#).unwrap(),
            StreamRecord::Unrecognized
        );
        assert_eq!(
            decode_line(r#"{"id":"gid://shopify/InventoryLevel/1"}"#).unwrap(),
            StreamRecord::Unrecognized
        );
        assert_eq!(decode_line(r#"{"title":"no id"}"#).unwrap(), StreamRecord::Unrecognized);
    }

    #[test]
    fn test_malformed_lines_are_parse_errors() {
        assert!(matches!(decode_line("{not json"), Err(SyncError::Parse(_))));
        assert!(matches!(decode_line("[1,2]"), Err(SyncError::Parse(_))));
        assert!(matches!(
            decode_line(r#"{"id":"ext://ProductVariant/1","sku":42}"#),
            Err(SyncError::Parse(_))
        ));
        assert!(matches!(
            decode_line(r#"{"id":"ext://InventoryLevel/1","__parentId":"ext://ProductVariant/1","quantities":[{"name":"incoming","quantity":"many"}]}"#),
            Err(SyncError::Parse(_))
        ));
    }
}
