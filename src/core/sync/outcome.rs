//! Sync request options and structured results

use crate::domain::{OperationId, Result, RunId, RunStatus, SyncError, SyncRun, SyncType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for one sync trigger
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub sync_type: SyncType,
    /// Overrides `sync.max_wait_seconds`
    pub max_wait: Option<Duration>,
    /// Return right after the job is accepted when false
    pub wait_for_completion: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            sync_type: SyncType::OnDemand,
            max_wait: None,
            wait_for_completion: true,
        }
    }
}

/// How a trigger ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed,
    /// Job accepted, not waited on
    Started,
    AlreadyRunning,
    Failed,
    TimedOut,
    Cancelled,
    /// Shutdown requested while waiting; the run stays `started`
    Interrupted,
    /// Completion signalled but the job is still running
    Pending,
    /// Nothing to act on (unknown operation, unreadable payload)
    Rejected,
}

/// Structured result of a sync trigger or completion callback
///
/// The orchestrator never returns an error to its caller; everything that went
/// wrong is described here and, where a run exists, on the run record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub outcome: SyncOutcome,
    pub message: String,
    pub run_id: Option<RunId>,
    pub operation_id: Option<OperationId>,
    pub status: Option<RunStatus>,
    /// Records ingested into staging
    pub processed_count: Option<u64>,
    /// Catalog rows written by the transform
    pub item_count: Option<u64>,
    pub error: Option<String>,
}

impl SyncResponse {
    fn without_run(outcome: SyncOutcome, message: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome,
            message: message.into(),
            run_id: None,
            operation_id: None,
            status: None,
            processed_count: None,
            item_count: None,
            error: None,
        }
    }

    /// Describe a run record
    pub fn from_run(run: &SyncRun, message: impl Into<String>) -> Self {
        let outcome = match run.status {
            RunStatus::Started => SyncOutcome::Started,
            RunStatus::Completed => SyncOutcome::Completed,
            RunStatus::Failed => SyncOutcome::Failed,
            RunStatus::Timeout => SyncOutcome::TimedOut,
            RunStatus::Cancelled => SyncOutcome::Cancelled,
        };
        Self {
            success: matches!(run.status, RunStatus::Completed | RunStatus::Started),
            outcome,
            message: message.into(),
            run_id: Some(run.id),
            operation_id: run.operation_id.clone(),
            status: Some(run.status),
            processed_count: None,
            item_count: run.item_count.and_then(|n| u64::try_from(n).ok()),
            error: run.error_message.clone(),
        }
    }

    pub fn already_running(reason: Option<String>) -> Self {
        let mut response =
            Self::without_run(SyncOutcome::AlreadyRunning, "Sync already in progress");
        response.error = reason;
        response
    }

    pub fn rejected(message: impl Into<String>, error: Option<&SyncError>) -> Self {
        let mut response = Self::without_run(SyncOutcome::Rejected, message);
        response.error = error.map(ToString::to_string);
        response
    }

    /// Run left `started` without a terminal status
    pub fn unfinished(run: &SyncRun, outcome: SyncOutcome, message: impl Into<String>) -> Self {
        let mut response = Self::from_run(run, message);
        response.success = false;
        response.outcome = outcome;
        response
    }

    pub fn with_processed_count(mut self, processed: u64) -> Self {
        self.processed_count = Some(processed);
        self
    }

    /// Log the response at a level matching its outcome
    pub fn log_summary(&self) {
        let run_id = self.run_id.map(|id| id.to_string());
        let operation_id = self.operation_id.as_ref().map(|id| id.as_str());
        if self.success {
            tracing::info!(
                outcome = ?self.outcome,
                run_id = ?run_id,
                operation_id = ?operation_id,
                processed = ?self.processed_count,
                items = ?self.item_count,
                "{}",
                self.message
            );
        } else {
            tracing::warn!(
                outcome = ?self.outcome,
                run_id = ?run_id,
                operation_id = ?operation_id,
                error = ?self.error,
                "{}",
                self.message
            );
        }
    }
}

/// Bulk operation completion notification
///
/// Carries no result URL or object count; those are re-read from the remote.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionPayload {
    #[serde(alias = "operation_id", alias = "id")]
    pub admin_graphql_api_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl CompletionPayload {
    pub fn for_operation(operation_id: &OperationId) -> Self {
        Self {
            admin_graphql_api_id: operation_id.as_str().to_string(),
            status: None,
            error_code: None,
        }
    }

    /// Parse a webhook body
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| SyncError::Serialization(format!("Invalid completion payload: {}", e)))
    }

    pub fn operation_id(&self) -> Result<OperationId> {
        OperationId::new(self.admin_graphql_api_id.clone()).map_err(SyncError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_from_webhook_body() {
        let payload = CompletionPayload::from_json(
            r#"{"admin_graphql_api_id":"gid://shopify/BulkOperation/42","completed_at":"2025-01-01T00:00:00Z","error_code":null,"status":"completed","type":"query"}"#,
        )
        .unwrap();
        assert_eq!(
            payload.operation_id().unwrap().as_str(),
            "gid://shopify/BulkOperation/42"
        );
        assert_eq!(payload.status.as_deref(), Some("completed"));
    }

    #[test]
    fn test_payload_requires_id() {
        assert!(CompletionPayload::from_json(r#"{"status":"completed"}"#).is_err());
        let blank = CompletionPayload {
            admin_graphql_api_id: " ".to_string(),
            status: None,
            error_code: None,
        };
        assert!(blank.operation_id().is_err());
    }

    #[test]
    fn test_response_from_failed_run() {
        let mut run = SyncRun::new(SyncType::OnDemand);
        run.mark_failed("Bulk operation FAILED (ACCESS_DENIED)").unwrap();

        let response = SyncResponse::from_run(&run, "Sync failed");
        assert!(!response.success);
        assert_eq!(response.outcome, SyncOutcome::Failed);
        assert_eq!(response.status, Some(RunStatus::Failed));
        assert_eq!(
            response.error.as_deref(),
            Some("Bulk operation FAILED (ACCESS_DENIED)")
        );
    }
}
