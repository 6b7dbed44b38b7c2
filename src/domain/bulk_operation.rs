//! Remote bulk operation handle
//!
//! The remote platform owns these; the engine only polls and reads them.

use crate::domain::ids::OperationId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote job status as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteJobStatus {
    Created,
    Running,
    Completed,
    Failed,
    Canceled,
    Canceling,
    Expired,
}

impl RemoteJobStatus {
    /// Statuses during which another job must not be started
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            RemoteJobStatus::Created | RemoteJobStatus::Running | RemoteJobStatus::Canceling
        )
    }

    /// Statuses that end the job unsuccessfully
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RemoteJobStatus::Failed | RemoteJobStatus::Canceled | RemoteJobStatus::Expired
        )
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteJobStatus::Created => "CREATED",
            RemoteJobStatus::Running => "RUNNING",
            RemoteJobStatus::Completed => "COMPLETED",
            RemoteJobStatus::Failed => "FAILED",
            RemoteJobStatus::Canceled => "CANCELED",
            RemoteJobStatus::Canceling => "CANCELING",
            RemoteJobStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for RemoteJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a remote bulk operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteJobHandle {
    pub operation_id: OperationId,
    pub status: RemoteJobStatus,
    pub object_count: u64,
    /// Only populated once `status == COMPLETED` and there is something to download
    pub result_url: Option<String>,
    pub error_code: Option<String>,
}

impl RemoteJobHandle {
    /// Human-readable failure description for run records
    pub fn failure_message(&self) -> String {
        match &self.error_code {
            Some(code) => format!("Bulk operation {} ({code})", self.status),
            None => format!("Bulk operation {}", self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_statuses() {
        assert!(RemoteJobStatus::Created.is_busy());
        assert!(RemoteJobStatus::Running.is_busy());
        assert!(RemoteJobStatus::Canceling.is_busy());
        assert!(!RemoteJobStatus::Completed.is_busy());
        assert!(!RemoteJobStatus::Failed.is_busy());
        assert!(!RemoteJobStatus::Canceled.is_busy());
    }

    #[test]
    fn test_status_deserializes_from_wire() {
        let status: RemoteJobStatus = serde_json::from_str("\"CANCELING\"").unwrap();
        assert_eq!(status, RemoteJobStatus::Canceling);
        assert!(serde_json::from_str::<RemoteJobStatus>("\"PAUSED\"").is_err());
    }

    #[test]
    fn test_failure_message_includes_code() {
        let handle = RemoteJobHandle {
            operation_id: OperationId::new("gid://shopify/BulkOperation/1").unwrap(),
            status: RemoteJobStatus::Failed,
            object_count: 0,
            result_url: None,
            error_code: Some("ACCESS_DENIED".to_string()),
        };
        assert_eq!(handle.failure_message(), "Bulk operation FAILED (ACCESS_DENIED)");
    }
}
