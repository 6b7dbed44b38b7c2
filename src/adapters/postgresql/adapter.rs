//! PostgreSQL adapter implementing the storage traits

use crate::adapters::database::traits::{
    backup_table_name, CatalogStore, StagingStore, SyncRunStore,
};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    catalog_item_from_row, category_from_row, column, inventory_level_from_row,
    string_map_to_json, sync_run_from_row, variant_from_row,
};
use crate::domain::{
    CatalogItem, Category, OperationId, Result, RunId, StagingInventoryLevel, StagingVariant,
    StickyFields, SyncError, SyncRun, UpsertOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

const RUN_COLUMNS: &str =
    "id, sync_type, status, operation_id, started_at, completed_at, item_count, error_message";

/// PostgreSQL implementation of the storage traits
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn new_with_arc(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    fn upsert_outcome(inserted: bool) -> UpsertOutcome {
        if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        }
    }
}

#[async_trait]
impl SyncRunStore for PostgreSQLAdapter {
    async fn create_run(&self, run: &SyncRun) -> Result<()> {
        let query = format!(
            "INSERT INTO sync_runs ({RUN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        );
        self.client
            .execute(
                &query,
                &[
                    &run.id.as_uuid(),
                    &run.sync_type.as_str(),
                    &run.status.as_str(),
                    &run.operation_id.as_ref().map(|id| id.as_str()),
                    &run.started_at,
                    &run.completed_at,
                    &run.item_count,
                    &run.error_message,
                ],
            )
            .await?;

        tracing::debug!(run_id = %run.id, status = %run.status, "Run record created");
        Ok(())
    }

    async fn finish_run(&self, run: &SyncRun) -> Result<bool> {
        if !run.status.is_terminal() {
            return Err(SyncError::State(format!(
                "Run {} is not in a terminal status",
                run.id
            )));
        }

        let affected = self
            .client
            .execute(
                r#"
                UPDATE sync_runs SET
                    status = $2,
                    completed_at = $3,
                    item_count = $4,
                    error_message = $5,
                    operation_id = COALESCE($6, operation_id)
                WHERE id = $1 AND status = 'started'
                "#,
                &[
                    &run.id.as_uuid(),
                    &run.status.as_str(),
                    &run.completed_at,
                    &run.item_count,
                    &run.error_message,
                    &run.operation_id.as_ref().map(|id| id.as_str()),
                ],
            )
            .await?;

        if affected == 0 {
            tracing::warn!(
                run_id = %run.id,
                status = %run.status,
                "Run was already terminal; status not overwritten"
            );
        }
        Ok(affected > 0)
    }

    async fn find_active_run(&self, started_after: DateTime<Utc>) -> Result<Option<SyncRun>> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM sync_runs \
             WHERE status = 'started' AND started_at > $1 \
             ORDER BY started_at DESC LIMIT 1"
        );
        let rows = self.client.query(&query, &[&started_after]).await?;
        rows.first().map(sync_run_from_row).transpose()
    }

    async fn sweep_orphans(&self, started_before: DateTime<Utc>, message: &str) -> Result<u64> {
        let now = Utc::now();
        self.client
            .execute(
                r#"
                UPDATE sync_runs
                SET status = 'timeout', completed_at = $2, error_message = $3
                WHERE status = 'started' AND started_at < $1
                "#,
                &[&started_before, &now, &message],
            )
            .await
    }

    async fn get_run(&self, id: &RunId) -> Result<Option<SyncRun>> {
        let query = format!("SELECT {RUN_COLUMNS} FROM sync_runs WHERE id = $1");
        let rows = self.client.query(&query, &[&id.as_uuid()]).await?;
        rows.first().map(sync_run_from_row).transpose()
    }

    async fn find_by_operation_id(&self, operation_id: &OperationId) -> Result<Option<SyncRun>> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM sync_runs WHERE operation_id = $1 \
             ORDER BY started_at DESC LIMIT 1"
        );
        let rows = self
            .client
            .query(&query, &[&operation_id.as_str()])
            .await?;
        rows.first().map(sync_run_from_row).transpose()
    }

    async fn runs_since(&self, since: DateTime<Utc>) -> Result<Vec<SyncRun>> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM sync_runs WHERE started_at >= $1 ORDER BY started_at DESC"
        );
        let rows = self.client.query(&query, &[&since]).await?;
        rows.iter().map(sync_run_from_row).collect()
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<SyncRun>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let query =
            format!("SELECT {RUN_COLUMNS} FROM sync_runs ORDER BY started_at DESC LIMIT $1");
        let rows = self.client.query(&query, &[&limit]).await?;
        rows.iter().map(sync_run_from_row).collect()
    }

    async fn last_success(&self) -> Result<Option<SyncRun>> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM sync_runs WHERE status = 'completed' \
             ORDER BY completed_at DESC NULLS LAST LIMIT 1"
        );
        let rows = self.client.query(&query, &[]).await?;
        rows.first().map(sync_run_from_row).transpose()
    }
}

#[async_trait]
impl StagingStore for PostgreSQLAdapter {
    async fn upsert_variant(&self, variant: &StagingVariant) -> Result<UpsertOutcome> {
        let metafields = string_map_to_json(&variant.metafields);

        // Every column is overwritten so replays converge on the last write
        let row = self
            .client
            .query_one(
                r#"
                INSERT INTO staging_variants (
                    external_id, natural_key, title, product_id, product_type,
                    tags, price, compare_at_price, metafields
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (external_id) DO UPDATE SET
                    natural_key = EXCLUDED.natural_key,
                    title = EXCLUDED.title,
                    product_id = EXCLUDED.product_id,
                    product_type = EXCLUDED.product_type,
                    tags = EXCLUDED.tags,
                    price = EXCLUDED.price,
                    compare_at_price = EXCLUDED.compare_at_price,
                    metafields = EXCLUDED.metafields
                RETURNING (xmax = 0) AS inserted
                "#,
                &[
                    &variant.external_id.as_str(),
                    &variant.natural_key,
                    &variant.title,
                    &variant.product_id,
                    &variant.product_type,
                    &variant.tags,
                    &variant.price,
                    &variant.compare_at_price,
                    &metafields,
                ],
            )
            .await?;

        Ok(Self::upsert_outcome(column(&row, "inserted")?))
    }

    async fn upsert_inventory_level(
        &self,
        level: &StagingInventoryLevel,
    ) -> Result<UpsertOutcome> {
        let row = self
            .client
            .query_one(
                r#"
                INSERT INTO staging_inventory_levels (
                    external_id, parent_external_id, incoming, committed
                )
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (external_id) DO UPDATE SET
                    parent_external_id = EXCLUDED.parent_external_id,
                    incoming = EXCLUDED.incoming,
                    committed = EXCLUDED.committed
                RETURNING (xmax = 0) AS inserted
                "#,
                &[
                    &level.external_id.as_str(),
                    &level.parent_external_id.as_str(),
                    &level.incoming,
                    &level.committed,
                ],
            )
            .await?;

        Ok(Self::upsert_outcome(column(&row, "inserted")?))
    }

    async fn load_variants(&self) -> Result<Vec<StagingVariant>> {
        let rows = self
            .client
            .query(
                "SELECT external_id, natural_key, title, product_id, product_type, tags, \
                 price, compare_at_price, metafields FROM staging_variants ORDER BY external_id",
                &[],
            )
            .await?;
        rows.iter().map(variant_from_row).collect()
    }

    async fn load_inventory_levels(&self) -> Result<Vec<StagingInventoryLevel>> {
        let rows = self
            .client
            .query(
                "SELECT external_id, parent_external_id, incoming, committed \
                 FROM staging_inventory_levels ORDER BY external_id",
                &[],
            )
            .await?;
        rows.iter().map(inventory_level_from_row).collect()
    }
}

#[async_trait]
impl CatalogStore for PostgreSQLAdapter {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = self
            .client
            .query("SELECT id, name, preorder FROM categories ORDER BY id", &[])
            .await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn backup_catalog(&self, taken_at: DateTime<Utc>) -> Result<String> {
        let table = backup_table_name(taken_at);
        let conn = self.client.get_connection().await?;
        conn.batch_execute(&format!("CREATE TABLE {table} AS TABLE catalog_items"))
            .await
            .map_err(|e| SyncError::Database(format!("Failed to back up catalog: {e}")))?;

        tracing::info!(backup = %table, "Catalog table backed up");
        Ok(table)
    }

    async fn capture_sticky(&self) -> Result<HashMap<String, StickyFields>> {
        let rows = self
            .client
            .query(
                "SELECT DISTINCT ON (natural_key) natural_key, display_order \
                 FROM catalog_items WHERE display_order IS NOT NULL \
                 ORDER BY natural_key, id",
                &[],
            )
            .await?;

        let mut sticky = HashMap::with_capacity(rows.len());
        for row in &rows {
            sticky.insert(
                column::<String>(row, "natural_key")?,
                StickyFields {
                    display_order: column(row, "display_order")?,
                },
            );
        }
        Ok(sticky)
    }

    async fn replace_catalog(&self, items: &[CatalogItem]) -> Result<u64> {
        let db_err = |e: tokio_postgres::Error| {
            SyncError::Database(format!("Catalog rebuild failed: {e}"))
        };

        let mut conn = self.client.get_connection().await?;
        let tx = conn.transaction().await.map_err(db_err)?;

        tx.batch_execute("TRUNCATE catalog_items RESTART IDENTITY")
            .await
            .map_err(db_err)?;

        let insert = tx
            .prepare(
                r#"
                INSERT INTO catalog_items (
                    natural_key, external_id, title, category_id, preorder,
                    price, compare_at_price, pricing, pending_supply, display_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .await
            .map_err(db_err)?;

        let mut inserted = 0u64;
        for item in items {
            let pricing = string_map_to_json(&item.pricing);
            inserted += tx
                .execute(
                    &insert,
                    &[
                        &item.natural_key,
                        &item.external_id.as_str(),
                        &item.title,
                        &item.category_id,
                        &item.preorder,
                        &item.price,
                        &item.compare_at_price,
                        &pricing,
                        &item.pending_supply,
                        &item.display_order,
                    ],
                )
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        tracing::debug!(rows = inserted, "Catalog table replaced");
        Ok(inserted)
    }

    async fn list_catalog(&self) -> Result<Vec<CatalogItem>> {
        let rows = self
            .client
            .query(
                "SELECT natural_key, external_id, title, category_id, preorder, price, \
                 compare_at_price, pricing, pending_supply, display_order \
                 FROM catalog_items ORDER BY id",
                &[],
            )
            .await?;
        rows.iter().map(catalog_item_from_row).collect()
    }
}
