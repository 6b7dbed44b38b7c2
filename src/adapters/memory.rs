//! In-memory implementation of every storage trait
//!
//! Backs the test suites. State lives behind one mutex so each trait call is
//! atomic, matching what a PostgreSQL transaction gives the real adapter.

use crate::adapters::database::traits::{
    backup_table_name, CatalogStore, StagingStore, SyncRunStore,
};
use crate::domain::{
    CatalogItem, Category, OperationId, Result, RunId, RunStatus, StagingInventoryLevel,
    StagingVariant, StickyFields, SyncError, SyncRun, UpsertOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    runs: Vec<SyncRun>,
    variants: BTreeMap<String, StagingVariant>,
    inventory_levels: BTreeMap<String, StagingInventoryLevel>,
    categories: Vec<Category>,
    catalog: Vec<CatalogItem>,
    backups: BTreeMap<String, Vec<CatalogItem>>,
}

/// In-memory store for tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| SyncError::Database("in-memory store mutex poisoned".to_string()))
    }

    /// Register a category and return it with its assigned id
    pub fn add_category(&self, name: &str, preorder: bool) -> Result<Category> {
        let mut state = self.lock()?;
        let id = state.categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let category = Category {
            id,
            name: name.to_string(),
            preorder,
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    /// Names of the catalog snapshots taken so far
    pub fn backup_names(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.backups.keys().cloned().collect())
    }

    /// Rows of one catalog snapshot
    pub fn backup(&self, name: &str) -> Result<Option<Vec<CatalogItem>>> {
        Ok(self.lock()?.backups.get(name).cloned())
    }

    /// Run record by id, for assertions
    pub fn run(&self, id: &RunId) -> Result<Option<SyncRun>> {
        Ok(self.lock()?.runs.iter().find(|r| &r.id == id).cloned())
    }

    /// Every run record in creation order
    pub fn all_runs(&self) -> Result<Vec<SyncRun>> {
        Ok(self.lock()?.runs.clone())
    }
}

fn newest_first(mut runs: Vec<SyncRun>) -> Vec<SyncRun> {
    runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    runs
}

#[async_trait]
impl SyncRunStore for InMemoryStore {
    async fn create_run(&self, run: &SyncRun) -> Result<()> {
        let mut state = self.lock()?;
        if state.runs.iter().any(|r| r.id == run.id) {
            return Err(SyncError::Database(format!("Run {} already exists", run.id)));
        }
        state.runs.push(run.clone());
        Ok(())
    }

    async fn finish_run(&self, run: &SyncRun) -> Result<bool> {
        if !run.status.is_terminal() {
            return Err(SyncError::State(format!(
                "Run {} is not in a terminal status",
                run.id
            )));
        }

        let mut state = self.lock()?;
        let stored = state
            .runs
            .iter_mut()
            .find(|r| r.id == run.id)
            .ok_or_else(|| SyncError::Database(format!("Run {} not found", run.id)))?;

        if stored.status != RunStatus::Started {
            return Ok(false);
        }

        stored.status = run.status;
        stored.completed_at = run.completed_at;
        stored.item_count = run.item_count;
        stored.error_message = run.error_message.clone();
        if run.operation_id.is_some() {
            stored.operation_id = run.operation_id.clone();
        }
        Ok(true)
    }

    async fn find_active_run(&self, started_after: DateTime<Utc>) -> Result<Option<SyncRun>> {
        let state = self.lock()?;
        Ok(state
            .runs
            .iter()
            .filter(|r| r.status == RunStatus::Started && r.started_at > started_after)
            .max_by_key(|r| r.started_at)
            .cloned())
    }

    async fn sweep_orphans(&self, started_before: DateTime<Utc>, message: &str) -> Result<u64> {
        let now = Utc::now();
        let mut state = self.lock()?;
        let mut swept = 0;
        for run in state
            .runs
            .iter_mut()
            .filter(|r| r.status == RunStatus::Started && r.started_at < started_before)
        {
            run.status = RunStatus::Timeout;
            run.completed_at = Some(now);
            run.error_message = Some(message.to_string());
            swept += 1;
        }
        Ok(swept)
    }

    async fn get_run(&self, id: &RunId) -> Result<Option<SyncRun>> {
        self.run(id)
    }

    async fn find_by_operation_id(&self, operation_id: &OperationId) -> Result<Option<SyncRun>> {
        let state = self.lock()?;
        Ok(state
            .runs
            .iter()
            .filter(|r| r.operation_id.as_ref() == Some(operation_id))
            .max_by_key(|r| r.started_at)
            .cloned())
    }

    async fn runs_since(&self, since: DateTime<Utc>) -> Result<Vec<SyncRun>> {
        let state = self.lock()?;
        Ok(newest_first(
            state
                .runs
                .iter()
                .filter(|r| r.started_at >= since)
                .cloned()
                .collect(),
        ))
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<SyncRun>> {
        let state = self.lock()?;
        let mut runs = newest_first(state.runs.clone());
        runs.truncate(limit);
        Ok(runs)
    }

    async fn last_success(&self) -> Result<Option<SyncRun>> {
        let state = self.lock()?;
        Ok(state
            .runs
            .iter()
            .filter(|r| r.status == RunStatus::Completed)
            .max_by_key(|r| r.completed_at)
            .cloned())
    }
}

#[async_trait]
impl StagingStore for InMemoryStore {
    async fn upsert_variant(&self, variant: &StagingVariant) -> Result<UpsertOutcome> {
        let mut state = self.lock()?;
        let previous = state
            .variants
            .insert(variant.external_id.as_str().to_string(), variant.clone());
        Ok(match previous {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        })
    }

    async fn upsert_inventory_level(
        &self,
        level: &StagingInventoryLevel,
    ) -> Result<UpsertOutcome> {
        let mut state = self.lock()?;
        let previous = state
            .inventory_levels
            .insert(level.external_id.as_str().to_string(), level.clone());
        Ok(match previous {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        })
    }

    async fn load_variants(&self) -> Result<Vec<StagingVariant>> {
        Ok(self.lock()?.variants.values().cloned().collect())
    }

    async fn load_inventory_levels(&self) -> Result<Vec<StagingInventoryLevel>> {
        Ok(self.lock()?.inventory_levels.values().cloned().collect())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.lock()?.categories.clone())
    }

    async fn backup_catalog(&self, taken_at: DateTime<Utc>) -> Result<String> {
        let mut state = self.lock()?;
        let name = backup_table_name(taken_at);
        let snapshot = state.catalog.clone();
        state.backups.insert(name.clone(), snapshot);
        Ok(name)
    }

    async fn capture_sticky(&self) -> Result<HashMap<String, StickyFields>> {
        let state = self.lock()?;
        let mut sticky = HashMap::new();
        for item in state.catalog.iter().filter(|i| i.display_order.is_some()) {
            sticky
                .entry(item.natural_key.clone())
                .or_insert_with(|| item.sticky());
        }
        Ok(sticky)
    }

    async fn replace_catalog(&self, items: &[CatalogItem]) -> Result<u64> {
        let mut state = self.lock()?;
        state.catalog = items.to_vec();
        Ok(items.len() as u64)
    }

    async fn list_catalog(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.lock()?.catalog.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExternalId, SyncType};
    use chrono::Duration;

    fn variant(id: &str, sku: &str) -> StagingVariant {
        let mut v = StagingVariant::new(ExternalId::new(id).unwrap());
        v.natural_key = Some(sku.to_string());
        v
    }

    #[tokio::test]
    async fn test_upsert_variant_reports_outcome() {
        let store = InMemoryStore::new();
        let v = variant("gid://shopify/ProductVariant/1", "ABC-1");

        assert_eq!(store.upsert_variant(&v).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(store.upsert_variant(&v).await.unwrap(), UpsertOutcome::Updated);
        assert_eq!(store.load_variants().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_finish_run_does_not_overwrite_terminal_status() {
        let store = InMemoryStore::new();
        let mut run = SyncRun::new(SyncType::Scheduled);
        store.create_run(&run).await.unwrap();

        run.mark_completed(3).unwrap();
        assert!(store.finish_run(&run).await.unwrap());

        let mut late = store.run(&run.id).unwrap().unwrap();
        late.status = RunStatus::Started;
        late.mark_failed("late failure").unwrap();
        assert!(!store.finish_run(&late).await.unwrap());

        let stored = store.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Completed);
        assert_eq!(stored.item_count, Some(3));
    }

    #[tokio::test]
    async fn test_find_active_run_respects_window() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let old = SyncRun::new(SyncType::Scheduled).with_started_at(now - Duration::minutes(20));
        store.create_run(&old).await.unwrap();

        let cutoff = now - Duration::minutes(15);
        assert!(store.find_active_run(cutoff).await.unwrap().is_none());

        let fresh = SyncRun::new(SyncType::OnDemand).with_started_at(now);
        store.create_run(&fresh).await.unwrap();
        let active = store.find_active_run(cutoff).await.unwrap().unwrap();
        assert_eq!(active.id, fresh.id);
    }

    #[tokio::test]
    async fn test_capture_sticky_keeps_first_per_key() {
        let store = InMemoryStore::new();
        let item = |category_id, display_order| CatalogItem {
            natural_key: "ABC-1".to_string(),
            external_id: ExternalId::new("gid://shopify/ProductVariant/1").unwrap(),
            title: None,
            category_id,
            preorder: false,
            price: None,
            compare_at_price: None,
            pricing: BTreeMap::new(),
            pending_supply: 0,
            display_order,
        };
        store
            .replace_catalog(&[item(1, Some(4)), item(2, Some(9))])
            .await
            .unwrap();

        let sticky = store.capture_sticky().await.unwrap();
        assert_eq!(sticky["ABC-1"].display_order, Some(4));
    }

    #[tokio::test]
    async fn test_backup_catalog_snapshots_rows() {
        let store = InMemoryStore::new();
        let name = store.backup_catalog(Utc::now()).await.unwrap();
        assert!(name.starts_with("catalog_items_backup_"));
        assert_eq!(store.backup(&name).unwrap(), Some(Vec::new()));
    }
}
