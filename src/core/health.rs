//! Run-history health monitoring
//!
//! Aggregates recent runs into statistics and reduces them to at most one
//! alert, chosen by fixed priority.

use crate::adapters::database::SyncRunStore;
use crate::config::HealthConfig;
use crate::domain::{Result, RunStatus, SyncRun};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Aggregates over the runs in a look-back window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStats {
    pub window_hours: u32,
    pub total_runs: usize,
    pub completed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
    pub in_progress: usize,
    /// Completed over finished runs, as a percentage; 100 when none finished
    pub success_rate: f64,
    /// Mean duration of completed runs
    pub avg_duration_ms: Option<i64>,
    /// Unsuccessful finished runs since the most recent success
    pub consecutive_failures: usize,
    pub last_success_at: Option<DateTime<Utc>>,
    /// Every alert condition that currently holds, highest priority first
    pub warnings: Vec<String>,
}

/// Alert kinds in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    NoRecentSuccess,
    ConsecutiveFailures,
    LowSuccessRate,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::NoRecentSuccess => "no_recent_success",
            AlertType::ConsecutiveFailures => "consecutive_failures",
            AlertType::LowSuccessRate => "low_success_rate",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether to alert, and about what
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDecision {
    pub should_alert: bool,
    pub alert_type: Option<AlertType>,
    pub message: Option<String>,
    pub stats: HealthStats,
}

pub struct HealthMonitor {
    runs: Arc<dyn SyncRunStore + Send + Sync>,
    config: HealthConfig,
}

impl HealthMonitor {
    pub fn new(runs: Arc<dyn SyncRunStore + Send + Sync>, config: HealthConfig) -> Self {
        Self { runs, config }
    }

    /// Statistics for the last `window_hours`
    pub async fn get_stats(&self, window_hours: u32) -> Result<HealthStats> {
        let since = Utc::now() - Duration::hours(i64::from(window_hours));
        let runs = self.runs.runs_since(since).await?;
        let last_success = self.runs.last_success().await?;

        let mut stats = summarize(&runs, window_hours);
        stats.last_success_at = last_success.and_then(|run| run.completed_at);
        stats.warnings = self
            .conditions(&stats)
            .into_iter()
            .map(|(_, message)| message)
            .collect();
        Ok(stats)
    }

    /// Evaluate alert conditions over the configured window
    ///
    /// Priority: no success in the window, then consecutive failures at or
    /// above the threshold, then a success rate below the minimum.
    pub async fn check_and_alert(&self) -> Result<AlertDecision> {
        let stats = self.get_stats(self.config.window_hours).await?;
        let decision = match self.conditions(&stats).into_iter().next() {
            Some((alert_type, message)) => {
                tracing::warn!(alert = %alert_type, %message, "Sync health alert");
                AlertDecision {
                    should_alert: true,
                    alert_type: Some(alert_type),
                    message: Some(message),
                    stats,
                }
            }
            None => AlertDecision {
                should_alert: false,
                alert_type: None,
                message: None,
                stats,
            },
        };
        Ok(decision)
    }

    fn conditions(&self, stats: &HealthStats) -> Vec<(AlertType, String)> {
        let mut conditions = Vec::new();

        if stats.completed == 0 {
            let since = match stats.last_success_at {
                Some(at) => format!("last success at {}", at.to_rfc3339()),
                None => "no successful run on record".to_string(),
            };
            conditions.push((
                AlertType::NoRecentSuccess,
                format!(
                    "No successful sync in the last {} hours ({})",
                    stats.window_hours, since
                ),
            ));
        }

        if stats.consecutive_failures >= self.config.consecutive_failure_threshold {
            conditions.push((
                AlertType::ConsecutiveFailures,
                format!(
                    "{} consecutive sync failures (threshold {})",
                    stats.consecutive_failures, self.config.consecutive_failure_threshold
                ),
            ));
        }

        if stats.success_rate < self.config.min_success_rate {
            conditions.push((
                AlertType::LowSuccessRate,
                format!(
                    "Success rate {:.1}% is below {:.1}%",
                    stats.success_rate, self.config.min_success_rate
                ),
            ));
        }

        conditions
    }
}

/// Aggregate runs ordered newest first
fn summarize(runs: &[SyncRun], window_hours: u32) -> HealthStats {
    let count = |status: RunStatus| runs.iter().filter(|r| r.status == status).count();
    let completed = count(RunStatus::Completed);
    let failed = count(RunStatus::Failed);
    let timed_out = count(RunStatus::Timeout);
    let cancelled = count(RunStatus::Cancelled);
    let finished = completed + failed + timed_out + cancelled;

    let success_rate = if finished == 0 {
        100.0
    } else {
        completed as f64 * 100.0 / finished as f64
    };

    let durations: Vec<i64> = runs
        .iter()
        .filter(|r| r.status == RunStatus::Completed)
        .filter_map(|r| r.duration())
        .map(|d| d.num_milliseconds())
        .collect();
    let avg_duration_ms = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<i64>() / durations.len() as i64)
    };

    let consecutive_failures = runs
        .iter()
        .filter(|r| r.status.is_terminal())
        .take_while(|r| r.status != RunStatus::Completed)
        .count();

    HealthStats {
        window_hours,
        total_runs: runs.len(),
        completed,
        failed,
        timed_out,
        cancelled,
        in_progress: count(RunStatus::Started),
        success_rate,
        avg_duration_ms,
        consecutive_failures,
        last_success_at: None,
        warnings: Vec::new(),
    }
}
