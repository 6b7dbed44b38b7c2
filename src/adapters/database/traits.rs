//! Storage abstraction traits
//!
//! Run history, staging and the canonical catalog are behind three traits so
//! the sync engine can run against PostgreSQL in production and an in-memory
//! store in tests.

use crate::domain::{
    CatalogItem, Category, OperationId, Result, RunId, StagingInventoryLevel, StagingVariant,
    StickyFields, SyncRun, UpsertOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Persistent run history
#[async_trait]
pub trait SyncRunStore: Send + Sync {
    /// Insert a new run record
    async fn create_run(&self, run: &SyncRun) -> Result<()>;

    /// Persist a run's terminal status
    ///
    /// Only applies while the stored row is still `started`. Returns `false`
    /// when the row had already reached a terminal status, in which case
    /// nothing is written.
    async fn finish_run(&self, run: &SyncRun) -> Result<bool>;

    /// Run record by id
    async fn get_run(&self, id: &RunId) -> Result<Option<SyncRun>>;

    /// Most recent `started` run whose `started_at` is after `started_after`
    async fn find_active_run(&self, started_after: DateTime<Utc>) -> Result<Option<SyncRun>>;

    /// Move every `started` run older than `started_before` to `timeout`
    ///
    /// Returns the number of runs swept.
    async fn sweep_orphans(&self, started_before: DateTime<Utc>, message: &str) -> Result<u64>;

    /// Run that started the given remote operation, if any
    async fn find_by_operation_id(&self, operation_id: &OperationId) -> Result<Option<SyncRun>>;

    /// Runs started at or after `since`, newest first
    async fn runs_since(&self, since: DateTime<Utc>) -> Result<Vec<SyncRun>>;

    /// The `limit` most recent runs, newest first
    async fn recent_runs(&self, limit: usize) -> Result<Vec<SyncRun>>;

    /// Most recent `completed` run regardless of age
    async fn last_success(&self) -> Result<Option<SyncRun>>;
}

/// Staging rows keyed by external id
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Insert or fully replace a variant row
    async fn upsert_variant(&self, variant: &StagingVariant) -> Result<UpsertOutcome>;

    /// Insert or fully replace an inventory level row
    async fn upsert_inventory_level(&self, level: &StagingInventoryLevel)
        -> Result<UpsertOutcome>;

    /// All staged variants ordered by external id
    async fn load_variants(&self) -> Result<Vec<StagingVariant>>;

    /// All staged inventory levels ordered by external id
    async fn load_inventory_levels(&self) -> Result<Vec<StagingInventoryLevel>>;
}

/// Canonical catalog table and its reference data
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Copy the catalog table to a timestamped snapshot and return its name
    async fn backup_catalog(&self, taken_at: DateTime<Utc>) -> Result<String>;

    /// Sticky values of the current catalog, keyed by natural key
    async fn capture_sticky(&self) -> Result<HashMap<String, StickyFields>>;

    /// Atomically replace the catalog table contents with `items`
    ///
    /// Readers observe either the previous contents or the new ones.
    async fn replace_catalog(&self, items: &[CatalogItem]) -> Result<u64>;

    /// Current catalog rows in insertion order
    async fn list_catalog(&self) -> Result<Vec<CatalogItem>>;
}

/// Every store the sync engine needs
pub trait SyncStore: SyncRunStore + StagingStore + CatalogStore {}

impl<T> SyncStore for T where T: SyncRunStore + StagingStore + CatalogStore {}

/// Name of the snapshot table for a backup taken at `taken_at`
pub fn backup_table_name(taken_at: DateTime<Utc>) -> String {
    format!("catalog_items_backup_{}", taken_at.format("%Y%m%d%H%M%S%3f"))
}
