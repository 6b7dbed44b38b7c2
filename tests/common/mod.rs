//! Shared fakes for the integration tests
//!
//! [`ScriptedRemote`] plays back a remote job lifecycle without HTTP; the
//! in-memory store stands in for PostgreSQL.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_sync::adapters::database::{Stores, SyncRunStore};
use catalog_sync::adapters::memory::InMemoryStore;
use catalog_sync::adapters::shopify::{BulkOperationApi, ByteStream};
use catalog_sync::config::{SyncSettingsConfig, TransformConfig};
use catalog_sync::core::query::{QuerySource, DEFAULT_BASELINE_QUERY};
use catalog_sync::core::sync::SyncOrchestrator;
use catalog_sync::domain::{
    OperationId, RemoteError, RemoteJobHandle, RemoteJobStatus, Result, SyncRun, SyncType,
};
use chrono::{Duration, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const OPERATION_ID: &str = "gid://shopify/BulkOperation/42";
pub const RESULT_URL: &str = "https://storage.example.com/bulk/42.jsonl";

/// One primary record with a linked inventory level
pub const SAMPLE_RESULTS: &str = concat!(
    r#"{"id":"ext://ProductVariant/555","sku":"ABC-123","title":"Reef Top","price":"49.00","tags":"Swim"}"#,
    "\n",
    r#"{"id":"ext://InventoryLevel/1","__parentId":"ext://ProductVariant/555","quantities":[{"name":"incoming","quantity":5},{"name":"committed","quantity":2}]}"#,
    "\n"
);

/// Remote API fake with a scripted job lifecycle
///
/// Poll responses are taken from a queue; the last entry repeats once the
/// queue is down to one.
pub struct ScriptedRemote {
    poll_statuses: Mutex<VecDeque<RemoteJobStatus>>,
    error_code: Mutex<Option<String>>,
    start_error: Mutex<Option<String>>,
    poll_error: Mutex<Option<String>>,
    current: Mutex<Option<RemoteJobStatus>>,
    current_fails: Mutex<bool>,
    results: Mutex<Option<String>>,
    sweep_on_download: Mutex<Option<Arc<InMemoryStore>>>,
    pub start_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub current_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
}

impl ScriptedRemote {
    /// A job that runs once and completes with [`SAMPLE_RESULTS`]
    pub fn new() -> Self {
        Self {
            poll_statuses: Mutex::new(VecDeque::from([
                RemoteJobStatus::Running,
                RemoteJobStatus::Completed,
            ])),
            error_code: Mutex::new(None),
            start_error: Mutex::new(None),
            poll_error: Mutex::new(None),
            current: Mutex::new(None),
            current_fails: Mutex::new(false),
            results: Mutex::new(Some(SAMPLE_RESULTS.to_string())),
            sweep_on_download: Mutex::new(None),
            start_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            current_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_polls(self, statuses: &[RemoteJobStatus]) -> Self {
        self.set_polls(statuses);
        self
    }

    pub fn set_polls(&self, statuses: &[RemoteJobStatus]) {
        *self.poll_statuses.lock().unwrap() = statuses.iter().copied().collect();
    }

    pub fn with_error_code(self, code: &str) -> Self {
        *self.error_code.lock().unwrap() = Some(code.to_string());
        self
    }

    pub fn with_start_error(self, message: &str) -> Self {
        *self.start_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn with_poll_error(self, message: &str) -> Self {
        *self.poll_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn with_current(self, status: RemoteJobStatus) -> Self {
        *self.current.lock().unwrap() = Some(status);
        self
    }

    pub fn with_failing_current(self) -> Self {
        *self.current_fails.lock().unwrap() = true;
        self
    }

    /// `None` means the job completes with no result file
    pub fn with_results(self, body: Option<&str>) -> Self {
        *self.results.lock().unwrap() = body.map(str::to_string);
        self
    }

    /// Time out every started run in `store` when the download begins
    pub fn with_sweep_on_download(self, store: &Arc<InMemoryStore>) -> Self {
        *self.sweep_on_download.lock().unwrap() = Some(store.clone());
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn handle(&self, status: RemoteJobStatus) -> RemoteJobHandle {
        let has_results = self.results.lock().unwrap().is_some();
        RemoteJobHandle {
            operation_id: OperationId::new(OPERATION_ID).unwrap(),
            status,
            object_count: if has_results { 2 } else { 0 },
            result_url: (status == RemoteJobStatus::Completed && has_results)
                .then(|| RESULT_URL.to_string()),
            error_code: if status.is_failure() {
                self.error_code.lock().unwrap().clone()
            } else {
                None
            },
        }
    }
}

#[async_trait]
impl BulkOperationApi for ScriptedRemote {
    async fn start_bulk_query(&self, query: &str) -> Result<RemoteJobHandle> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        assert!(!query.is_empty());
        if let Some(message) = self.start_error.lock().unwrap().clone() {
            return Err(RemoteError::UserErrors(message).into());
        }
        Ok(self.handle(RemoteJobStatus::Created))
    }

    async fn poll_status(&self, operation_id: &OperationId) -> Result<RemoteJobHandle> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(operation_id.as_str(), OPERATION_ID);
        if let Some(message) = self.poll_error.lock().unwrap().clone() {
            return Err(RemoteError::Connection(message).into());
        }
        let status = {
            let mut queue = self.poll_statuses.lock().unwrap();
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().copied()
            }
        }
        .unwrap_or(RemoteJobStatus::Completed);
        Ok(self.handle(status))
    }

    async fn current_operation(&self) -> Result<Option<RemoteJobHandle>> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        if *self.current_fails.lock().unwrap() {
            return Err(RemoteError::Transient {
                status: 503,
                message: "Service Unavailable".to_string(),
            }
            .into());
        }
        let current = *self.current.lock().unwrap();
        Ok(current.map(|status| self.handle(status)))
    }

    async fn download_results(&self, url: &str) -> Result<ByteStream> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(url, RESULT_URL);
        let sweeper = self.sweep_on_download.lock().unwrap().clone();
        if let Some(store) = sweeper {
            store
                .sweep_orphans(Utc::now() + Duration::hours(1), "Swept by another trigger")
                .await
                .unwrap();
        }
        let body = self.results.lock().unwrap().clone().unwrap_or_default();
        // Small chunks so records straddle chunk boundaries
        let chunks: Vec<Result<Vec<u8>>> = body
            .into_bytes()
            .chunks(7)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

pub fn settings() -> SyncSettingsConfig {
    SyncSettingsConfig {
        lease_minutes: 15,
        orphan_minutes: 30,
        poll_interval_seconds: 3,
        max_wait_seconds: 60,
        progress_interval: 1,
        checkpoint_interval: 100,
    }
}

pub fn transform_config() -> TransformConfig {
    TransformConfig {
        backup_before_rebuild: false,
        ..TransformConfig::default()
    }
}

/// Store with the "Swim" category registered
pub fn store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.add_category("Swim", false).unwrap();
    store
}

pub fn orchestrator(remote: &Arc<ScriptedRemote>, store: &Arc<InMemoryStore>) -> SyncOrchestrator {
    orchestrator_with_query(
        remote,
        store,
        QuerySource::Fixed(DEFAULT_BASELINE_QUERY.to_string()),
    )
}

pub fn orchestrator_with_query(
    remote: &Arc<ScriptedRemote>,
    store: &Arc<InMemoryStore>,
    query: QuerySource,
) -> SyncOrchestrator {
    SyncOrchestrator::from_parts(
        remote.clone(),
        Stores::from_shared(store.clone()),
        query,
        transform_config(),
        settings(),
    )
}

/// Persist a run started `minutes_ago`
pub async fn started_run(store: &InMemoryStore, minutes_ago: i64) -> SyncRun {
    let run = SyncRun::new(SyncType::Scheduled)
        .with_started_at(Utc::now() - Duration::minutes(minutes_ago));
    store.create_run(&run).await.unwrap();
    run
}
