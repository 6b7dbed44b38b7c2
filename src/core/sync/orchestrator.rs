//! Sync run orchestration
//!
//! Drives one run through sweep, guard, query, job start, polling, ingestion
//! and transform. Every stage error is caught here, recorded on the run and
//! returned as a [`SyncResponse`].

use crate::adapters::database::Stores;
use crate::adapters::shopify::BulkOperationApi;
use crate::config::{SyncConfig, SyncSettingsConfig, TransformConfig};
use crate::core::guard::ConcurrencyGuard;
use crate::core::ingest::{IngestStats, StreamIngestor};
use crate::core::query::QuerySource;
use crate::core::reconcile::Reconciler;
use crate::core::sync::outcome::{CompletionPayload, SyncOptions, SyncOutcome, SyncResponse};
use crate::core::transform::{TransformOptions, TransformStage};
use crate::domain::{
    OperationId, RemoteJobHandle, RemoteJobStatus, Result, RunStatus, SyncError, SyncRun,
    SyncType,
};
use crate::log_run_transition;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Terminal status to apply to a run
enum RunEnd {
    Completed(i64),
    Failed(String),
    Timeout(String),
    Cancelled(String),
}

/// Result of waiting on a remote job
enum PollOutcome {
    Finished(RemoteJobHandle),
    TimedOut,
    Interrupted,
    Error(SyncError),
}

/// Coordinates a full sync run
///
/// # Example
///
/// ```no_run
/// use catalog_sync::adapters::database::create_stores;
/// use catalog_sync::adapters::shopify::ShopifyClient;
/// use catalog_sync::config::load_config;
/// use catalog_sync::core::sync::{SyncOptions, SyncOrchestrator};
/// use std::sync::Arc;
///
/// # async fn example() -> catalog_sync::domain::Result<()> {
/// let config = load_config("catalog-sync.toml")?;
/// let remote = Arc::new(ShopifyClient::new(&config.shopify)?);
/// let stores = create_stores(&config).await?;
///
/// let orchestrator = SyncOrchestrator::new(&config, remote, stores)?;
/// let response = orchestrator.run_full_sync(SyncOptions::default()).await;
/// println!("{}: {}", response.success, response.message);
/// # Ok(())
/// # }
/// ```
pub struct SyncOrchestrator {
    remote: Arc<dyn BulkOperationApi>,
    stores: Stores,
    guard: ConcurrencyGuard,
    query: QuerySource,
    ingestor: StreamIngestor,
    transform: TransformStage,
    settings: SyncSettingsConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl SyncOrchestrator {
    /// Build an orchestrator from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the query source cannot be built (unreadable baseline).
    pub fn new(
        config: &SyncConfig,
        remote: Arc<dyn BulkOperationApi>,
        stores: Stores,
    ) -> Result<Self> {
        let query = QuerySource::from_config(&config.query)?;
        Ok(Self::from_parts(
            remote,
            stores,
            query,
            config.transform.clone(),
            config.sync.clone(),
        ))
    }

    pub fn from_parts(
        remote: Arc<dyn BulkOperationApi>,
        stores: Stores,
        query: QuerySource,
        transform: TransformConfig,
        settings: SyncSettingsConfig,
    ) -> Self {
        let guard = ConcurrencyGuard::new(
            stores.runs.clone(),
            remote.clone(),
            minutes(settings.lease_minutes),
        );
        let ingestor = StreamIngestor::new(
            Reconciler::new(stores.staging.clone()),
            settings.progress_interval,
            settings.checkpoint_interval,
        );
        let transform =
            TransformStage::new(stores.staging.clone(), stores.catalog.clone(), transform);

        Self {
            remote,
            stores,
            guard,
            query,
            ingestor,
            transform,
            settings,
            shutdown: None,
        }
    }

    /// Stop waiting on the remote job once `true` is sent on this channel
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Move runs stuck in `started` past the orphan threshold to `timeout`
    pub async fn sweep_orphans(&self) -> Result<u64> {
        let cutoff = Utc::now() - minutes(self.settings.orphan_minutes);
        let message = format!(
            "No completion signal within {} minutes",
            self.settings.orphan_minutes
        );
        let swept = self.stores.runs.sweep_orphans(cutoff, &message).await?;
        if swept > 0 {
            tracing::warn!(swept, cutoff = %cutoff, "Swept orphaned sync runs");
        }
        Ok(swept)
    }

    /// Run a full sync
    pub async fn run_full_sync(&self, options: SyncOptions) -> SyncResponse {
        tracing::info!(
            sync_type = %options.sync_type,
            wait = options.wait_for_completion,
            "Starting sync"
        );

        if let Err(e) = self.sweep_orphans().await {
            tracing::warn!(error = %e, "Orphan sweep failed; continuing");
        }

        match self.guard.check_active().await {
            Ok(status) if status.in_progress => {
                return SyncResponse::already_running(status.reason);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Concurrency check failed");
                return SyncResponse::rejected("Concurrency check failed", Some(&e));
            }
        }

        let query = match self.query.resolve() {
            Ok(query) => query,
            Err(e) => {
                return self
                    .record_failed_start(options.sync_type, "Query validation failed", e)
                    .await
            }
        };

        let job = match self.remote.start_bulk_query(&query).await {
            Ok(job) => job,
            Err(e) => {
                return self
                    .record_failed_start(options.sync_type, "Bulk operation rejected", e)
                    .await
            }
        };

        let run = SyncRun::new(options.sync_type).with_operation_id(job.operation_id.clone());
        if let Err(e) = self.stores.runs.create_run(&run).await {
            tracing::error!(
                operation_id = %job.operation_id,
                error = %e,
                "Failed to record sync run"
            );
            let mut response = SyncResponse::rejected("Failed to record sync run", Some(&e));
            response.operation_id = Some(job.operation_id);
            return response;
        }
        log_run_transition!(&run);

        if !options.wait_for_completion {
            return SyncResponse::from_run(&run, "Bulk operation started");
        }

        let max_wait = options.max_wait.unwrap_or_else(|| self.settings.max_wait());
        let response = match self.wait_for_completion(&job.operation_id, max_wait).await {
            PollOutcome::Finished(handle) => self.finish_remote(run, handle).await,
            PollOutcome::TimedOut => {
                let message = format!(
                    "Bulk operation did not finish within {} seconds",
                    max_wait.as_secs()
                );
                let run = self.conclude(run, RunEnd::Timeout(message)).await;
                SyncResponse::from_run(&run, "Sync timed out")
            }
            PollOutcome::Interrupted => SyncResponse::unfinished(
                &run,
                SyncOutcome::Interrupted,
                "Shutdown requested; run left started for the completion callback or orphan sweep",
            ),
            PollOutcome::Error(e) => {
                let run = self
                    .conclude(run, RunEnd::Failed(format!("Status polling failed: {}", e)))
                    .await;
                SyncResponse::from_run(&run, "Sync failed")
            }
        };

        response.log_summary();
        response
    }

    /// Continue a run whose remote job signalled completion
    ///
    /// The notification carries no result URL, so the job status is re-read
    /// before proceeding exactly as the polling path would.
    pub async fn handle_completion(&self, payload: &CompletionPayload) -> SyncResponse {
        let operation_id = match payload.operation_id() {
            Ok(id) => id,
            Err(e) => return SyncResponse::rejected("Invalid completion payload", Some(&e)),
        };
        tracing::info!(
            operation_id = %operation_id,
            status = ?payload.status,
            "Bulk operation completion received"
        );

        let run = match self.stores.runs.find_by_operation_id(&operation_id).await {
            Ok(Some(run)) => run,
            Ok(None) => {
                let mut response =
                    SyncResponse::rejected("No sync run for this bulk operation", None);
                response.operation_id = Some(operation_id);
                return response;
            }
            Err(e) => return SyncResponse::rejected("Failed to look up sync run", Some(&e)),
        };

        if run.status.is_terminal() {
            tracing::info!(run_id = %run.id, status = %run.status, "Run already finalized");
            return SyncResponse::from_run(&run, format!("Run already {}", run.status));
        }

        let handle = match self.remote.poll_status(&operation_id).await {
            Ok(handle) => handle,
            Err(e) => {
                let run = self
                    .conclude(run, RunEnd::Failed(format!("Status check failed: {}", e)))
                    .await;
                return SyncResponse::from_run(&run, "Sync failed");
            }
        };

        if handle.status.is_busy() {
            return SyncResponse::unfinished(
                &run,
                SyncOutcome::Pending,
                format!("Bulk operation is still {}", handle.status),
            );
        }

        let response = self.finish_remote(run, handle).await;
        response.log_summary();
        response
    }

    /// Persist a run that failed before a job was accepted
    async fn record_failed_start(
        &self,
        sync_type: SyncType,
        message: &str,
        error: SyncError,
    ) -> SyncResponse {
        tracing::error!(error = %error, "{}", message);
        let mut run = SyncRun::new(sync_type);
        if let Err(e) = run.mark_failed(error.to_string()) {
            tracing::error!(error = %e, "Failed to mark run failed");
        }
        match self.stores.runs.create_run(&run).await {
            Ok(()) => {
                log_run_transition!(&run);
            }
            Err(e) => tracing::error!(error = %e, "Failed to record failed sync run"),
        }
        let response = SyncResponse::from_run(&run, message);
        response.log_summary();
        response
    }

    async fn wait_for_completion(
        &self,
        operation_id: &OperationId,
        max_wait: Duration,
    ) -> PollOutcome {
        let deadline = Instant::now() + max_wait;
        let mut shutdown = self.shutdown.clone();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(operation_id = %operation_id, "Poll wait exceeded");
                return PollOutcome::TimedOut;
            }
            let pause = self.settings.poll_interval().min(remaining);

            let mut interrupted = false;
            let mut sender_gone = false;
            match shutdown.as_mut() {
                Some(rx) if *rx.borrow() => interrupted = true,
                Some(rx) => {
                    tokio::select! {
                        _ = tokio::time::sleep(pause) => {}
                        changed = rx.changed() => match changed {
                            Ok(()) => interrupted = *rx.borrow(),
                            Err(_) => sender_gone = true,
                        },
                    }
                }
                None => tokio::time::sleep(pause).await,
            }
            if interrupted {
                tracing::warn!(operation_id = %operation_id, "Shutdown requested while polling");
                return PollOutcome::Interrupted;
            }
            if sender_gone {
                shutdown = None;
            }

            match self.remote.poll_status(operation_id).await {
                Ok(handle) if handle.status.is_busy() => {
                    tracing::debug!(
                        operation_id = %operation_id,
                        status = %handle.status,
                        object_count = handle.object_count,
                        "Bulk operation in progress"
                    );
                }
                Ok(handle) => return PollOutcome::Finished(handle),
                Err(e) => return PollOutcome::Error(e),
            }
        }
    }

    /// Act on a job that reached a non-busy status
    async fn finish_remote(&self, run: SyncRun, handle: RemoteJobHandle) -> SyncResponse {
        match handle.status {
            RemoteJobStatus::Completed => self.complete(run, handle).await,
            RemoteJobStatus::Canceled => {
                let run = self
                    .conclude(run, RunEnd::Cancelled(handle.failure_message()))
                    .await;
                SyncResponse::from_run(&run, "Bulk operation was cancelled")
            }
            _ => {
                let run = self.conclude(run, RunEnd::Failed(handle.failure_message())).await;
                SyncResponse::from_run(&run, "Bulk operation failed")
            }
        }
    }

    /// Ingest the results of a completed job, rebuild the catalog and finalize
    async fn complete(&self, run: SyncRun, handle: RemoteJobHandle) -> SyncResponse {
        let stats = match &handle.result_url {
            Some(url) => match self.ingest(url, handle.object_count).await {
                Ok(stats) => stats,
                Err(e) => {
                    let run = self
                        .conclude(run, RunEnd::Failed(format!("Ingestion failed: {}", e)))
                        .await;
                    return SyncResponse::from_run(&run, "Sync failed");
                }
            },
            None => {
                tracing::info!(
                    operation_id = %handle.operation_id,
                    "Bulk operation produced no results; skipping download"
                );
                IngestStats::default()
            }
        };

        let summary = match self.transform.run(TransformOptions::default()).await {
            Ok(summary) => summary,
            Err(e) => {
                let run = self
                    .conclude(run, RunEnd::Failed(format!("Transform failed: {}", e)))
                    .await;
                return SyncResponse::from_run(&run, "Sync failed")
                    .with_processed_count(stats.processed);
            }
        };

        let item_count = i64::try_from(summary.processed).unwrap_or(i64::MAX);
        let run = self.conclude(run, RunEnd::Completed(item_count)).await;
        let message = match run.status {
            RunStatus::Completed => "Sync completed".to_string(),
            status => format!("Sync finished but the run was already marked {}", status),
        };
        SyncResponse::from_run(&run, message).with_processed_count(stats.processed)
    }

    async fn ingest(&self, url: &str, expected: u64) -> Result<IngestStats> {
        let stream = self.remote.download_results(url).await?;
        let mut report = |processed: u64| {
            tracing::info!(processed, expected, "Ingestion progress");
        };
        self.ingestor.ingest(stream, Some(&mut report)).await
    }

    /// Apply a terminal status and persist it
    ///
    /// The store only accepts the transition while the row is still `started`;
    /// when something else finalized it first, the stored status wins.
    async fn conclude(&self, mut run: SyncRun, end: RunEnd) -> SyncRun {
        let marked = match end {
            RunEnd::Completed(items) => run.mark_completed(items),
            RunEnd::Failed(message) => run.mark_failed(message),
            RunEnd::Timeout(message) => run.mark_timeout(message),
            RunEnd::Cancelled(message) => run.mark_cancelled(message),
        };
        if let Err(e) = marked {
            tracing::warn!(run_id = %run.id, error = %e, "Run already finished");
            return run;
        }

        match self.stores.runs.finish_run(&run).await {
            Ok(true) => {
                log_run_transition!(&run);
                run
            }
            Ok(false) => {
                tracing::warn!(
                    run_id = %run.id,
                    attempted = %run.status,
                    "Run was finalized elsewhere; keeping stored status"
                );
                self.stored_run(run).await
            }
            Err(e) => {
                tracing::error!(run_id = %run.id, error = %e, "Failed to persist run status");
                run
            }
        }
    }

    /// Reload a run whose terminal status was written by someone else
    async fn stored_run(&self, run: SyncRun) -> SyncRun {
        match self.stores.runs.get_run(&run.id).await {
            Ok(Some(stored)) => {
                log_run_transition!(&stored);
                stored
            }
            Ok(None) => {
                tracing::error!(run_id = %run.id, "Run record disappeared");
                run
            }
            Err(e) => {
                tracing::error!(run_id = %run.id, error = %e, "Failed to reload run");
                run
            }
        }
    }
}

fn minutes(value: u64) -> chrono::Duration {
    chrono::Duration::minutes(i64::from(u32::try_from(value).unwrap_or(u32::MAX)))
}
