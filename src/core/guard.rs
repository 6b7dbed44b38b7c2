//! Two-tier concurrency guard
//!
//! A local lease (a `started` run younger than the lease window) is checked
//! first and never triggers a remote call. Otherwise the remote platform's
//! current job decides. The guard is best-effort: the gap between this check
//! and run creation is not closed.

use crate::adapters::database::SyncRunStore;
use crate::adapters::shopify::BulkOperationApi;
use crate::domain::{RemoteJobStatus, Result, RunId};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Answer to "is a sync already running?"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardStatus {
    pub in_progress: bool,
    pub reason: Option<String>,
    /// Local run holding the lease
    pub run_id: Option<RunId>,
    /// Remote job status that blocked the start
    pub remote_status: Option<RemoteJobStatus>,
}

impl GuardStatus {
    fn clear() -> Self {
        Self {
            in_progress: false,
            reason: None,
            run_id: None,
            remote_status: None,
        }
    }
}

pub struct ConcurrencyGuard {
    runs: Arc<dyn SyncRunStore + Send + Sync>,
    remote: Arc<dyn BulkOperationApi>,
    lease: Duration,
}

impl ConcurrencyGuard {
    pub fn new(
        runs: Arc<dyn SyncRunStore + Send + Sync>,
        remote: Arc<dyn BulkOperationApi>,
        lease: Duration,
    ) -> Self {
        Self {
            runs,
            remote,
            lease,
        }
    }

    /// Check for an active sync
    ///
    /// A remote error does not block: it is logged and treated as "not busy".
    ///
    /// # Errors
    ///
    /// Returns an error only if the local run store cannot be read.
    pub async fn check_active(&self) -> Result<GuardStatus> {
        let cutoff = Utc::now() - self.lease;
        if let Some(run) = self.runs.find_active_run(cutoff).await? {
            tracing::info!(run_id = %run.id, started_at = %run.started_at, "Local sync lease held");
            return Ok(GuardStatus {
                in_progress: true,
                reason: Some(format!(
                    "Run {} started at {} holds the sync lease",
                    run.id, run.started_at
                )),
                run_id: Some(run.id),
                remote_status: None,
            });
        }

        match self.remote.current_operation().await {
            Ok(Some(job)) if job.status.is_busy() => {
                tracing::info!(
                    operation_id = %job.operation_id,
                    status = %job.status,
                    "Remote bulk operation in progress"
                );
                Ok(GuardStatus {
                    in_progress: true,
                    reason: Some(format!(
                        "Remote bulk operation {} is {}",
                        job.operation_id, job.status
                    )),
                    run_id: None,
                    remote_status: Some(job.status),
                })
            }
            Ok(_) => Ok(GuardStatus::clear()),
            Err(e) => {
                tracing::warn!(error = %e, "Remote status check failed; not blocking sync");
                Ok(GuardStatus::clear())
            }
        }
    }
}
