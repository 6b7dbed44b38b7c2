//! Row mapping between PostgreSQL tables and domain records

use crate::domain::{
    CatalogItem, Category, ExternalId, OperationId, Result, RunId, RunStatus, StagingInventoryLevel,
    StagingVariant, SyncError, SyncRun, SyncType,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio_postgres::types::FromSql;
use tokio_postgres::Row;

/// Typed column read that reports the column name instead of panicking
pub(crate) fn column<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.try_get(name)
        .map_err(|e| SyncError::Database(format!("Failed to read column '{name}': {e}")))
}

fn external_id(raw: String) -> Result<ExternalId> {
    ExternalId::new(raw).map_err(SyncError::Database)
}

/// JSONB object of string values
pub(crate) fn string_map_to_json(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

fn json_to_string_map(value: Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                Value::Null => None,
                other => Some((k, other.to_string())),
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// `sync_runs` row
pub(crate) fn sync_run_from_row(row: &Row) -> Result<SyncRun> {
    let sync_type: String = column(row, "sync_type")?;
    let status: String = column(row, "status")?;
    let operation_id: Option<String> = column(row, "operation_id")?;

    Ok(SyncRun {
        id: RunId::from_uuid(column(row, "id")?),
        sync_type: sync_type.parse::<SyncType>()?,
        status: status.parse::<RunStatus>()?,
        operation_id: operation_id
            .map(OperationId::new)
            .transpose()
            .map_err(SyncError::Database)?,
        started_at: column::<DateTime<Utc>>(row, "started_at")?,
        completed_at: column(row, "completed_at")?,
        item_count: column(row, "item_count")?,
        error_message: column(row, "error_message")?,
    })
}

/// `staging_variants` row
pub(crate) fn variant_from_row(row: &Row) -> Result<StagingVariant> {
    let mut variant = StagingVariant::new(external_id(column(row, "external_id")?)?);
    variant.natural_key = column(row, "natural_key")?;
    variant.title = column(row, "title")?;
    variant.product_id = column(row, "product_id")?;
    variant.product_type = column(row, "product_type")?;
    variant.tags = column(row, "tags")?;
    variant.price = column(row, "price")?;
    variant.compare_at_price = column(row, "compare_at_price")?;
    variant.metafields = json_to_string_map(column(row, "metafields")?);
    Ok(variant)
}

/// `staging_inventory_levels` row
pub(crate) fn inventory_level_from_row(row: &Row) -> Result<StagingInventoryLevel> {
    Ok(StagingInventoryLevel {
        external_id: external_id(column(row, "external_id")?)?,
        parent_external_id: external_id(column(row, "parent_external_id")?)?,
        incoming: column(row, "incoming")?,
        committed: column(row, "committed")?,
    })
}

/// `categories` row
pub(crate) fn category_from_row(row: &Row) -> Result<Category> {
    Ok(Category {
        id: column(row, "id")?,
        name: column(row, "name")?,
        preorder: column(row, "preorder")?,
    })
}

/// `catalog_items` row
pub(crate) fn catalog_item_from_row(row: &Row) -> Result<CatalogItem> {
    Ok(CatalogItem {
        natural_key: column(row, "natural_key")?,
        external_id: external_id(column(row, "external_id")?)?,
        title: column(row, "title")?,
        category_id: column(row, "category_id")?,
        preorder: column(row, "preorder")?,
        price: column(row, "price")?,
        compare_at_price: column(row, "compare_at_price")?,
        pricing: json_to_string_map(column(row, "pricing")?),
        pending_supply: column(row, "pending_supply")?,
        display_order: column(row, "display_order")?,
    })
}
