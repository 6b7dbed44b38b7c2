//! Sync run record and its state machine
//!
//! A `SyncRun` is created once per run attempt and moves from `started` to
//! exactly one terminal status. Terminal statuses are absorbing.

use crate::domain::ids::{OperationId, RunId};
use crate::domain::{Result, SyncError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What triggered the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    /// Started by the scheduler
    Scheduled,
    /// Started manually
    OnDemand,
}

impl SyncType {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Scheduled => "scheduled",
            SyncType::OnDemand => "on_demand",
        }
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(SyncType::Scheduled),
            "on_demand" | "on-demand" => Ok(SyncType::OnDemand),
            other => Err(SyncError::Serialization(format!("Unknown sync type: {other}"))),
        }
    }
}

/// Run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Started,
    Completed,
    Failed,
    /// Outcome unknown: the poll loop gave up or the run was swept as an orphan
    Timeout,
    Cancelled,
}

impl RunStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Started => "started",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Timeout => "timeout",
            RunStatus::Cancelled => "cancelled",
        }
    }

    /// Every status except `started` is terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Started)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "started" => Ok(RunStatus::Started),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            "timeout" => Ok(RunStatus::Timeout),
            "cancelled" => Ok(RunStatus::Cancelled),
            other => Err(SyncError::Serialization(format!("Unknown run status: {other}"))),
        }
    }
}

/// One sync run attempt
///
/// # Examples
///
/// ```
/// use catalog_sync::domain::sync_run::{RunStatus, SyncRun, SyncType};
///
/// let mut run = SyncRun::new(SyncType::OnDemand);
/// assert_eq!(run.status, RunStatus::Started);
///
/// run.mark_completed(42).unwrap();
/// assert_eq!(run.item_count, Some(42));
/// assert!(run.mark_failed("too late").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRun {
    pub id: RunId,
    pub sync_type: SyncType,
    pub status: RunStatus,
    pub operation_id: Option<OperationId>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub item_count: Option<i64>,
    pub error_message: Option<String>,
}

impl SyncRun {
    /// New run in `started` status, stamped now
    pub fn new(sync_type: SyncType) -> Self {
        Self {
            id: RunId::generate(),
            sync_type,
            status: RunStatus::Started,
            operation_id: None,
            started_at: Utc::now(),
            completed_at: None,
            item_count: None,
            error_message: None,
        }
    }

    /// Attach the remote operation id
    pub fn with_operation_id(mut self, operation_id: OperationId) -> Self {
        self.operation_id = Some(operation_id);
        self
    }

    /// Override the start timestamp
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Whether the run is still `started` and younger than the lease window
    pub fn holds_lease(&self, now: DateTime<Utc>, lease: Duration) -> bool {
        self.status == RunStatus::Started && self.started_at > now - lease
    }

    /// Whether the run is stuck in `started` past the orphan threshold
    pub fn is_orphaned(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.status == RunStatus::Started && self.started_at < now - threshold
    }

    /// Elapsed time between start and finish, if finished
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at.map(|completed| completed - self.started_at)
    }

    /// Mark the run completed with the canonical item count
    pub fn mark_completed(&mut self, item_count: i64) -> Result<()> {
        self.finish(RunStatus::Completed, None)?;
        self.item_count = Some(item_count);
        Ok(())
    }

    /// Mark the run failed
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<()> {
        self.finish(RunStatus::Failed, Some(message.into()))
    }

    /// Mark the run timed out (outcome unknown)
    pub fn mark_timeout(&mut self, message: impl Into<String>) -> Result<()> {
        self.finish(RunStatus::Timeout, Some(message.into()))
    }

    /// Mark the run cancelled
    pub fn mark_cancelled(&mut self, message: impl Into<String>) -> Result<()> {
        self.finish(RunStatus::Cancelled, Some(message.into()))
    }

    fn finish(&mut self, status: RunStatus, message: Option<String>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(SyncError::State(format!(
                "Run {} is already {}; cannot move to {}",
                self.id, self.status, status
            )));
        }
        self.status = status;
        self.completed_at = Some(Utc::now());
        self.error_message = message;
        Ok(())
    }
}
