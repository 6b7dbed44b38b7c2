//! Status command implementation
//!
//! Lists recent sync runs from the run history.

use super::{connect_stores, load_or_report, EXIT_FATAL, EXIT_OK};
use crate::domain::{RunStatus, SyncRun};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Number of runs to show
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,

    /// Print runs as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(limit = self.limit, "Listing recent sync runs");

        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let stores = match connect_stores(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        let runs = match stores.runs.recent_runs(self.limit).await {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Failed to load run history");
                println!("   Error: {}", e);
                return Ok(EXIT_FATAL);
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&runs)?);
            return Ok(EXIT_OK);
        }

        println!("📊 Sync Status");
        println!();

        if runs.is_empty() {
            println!("No sync history found.");
            println!("Run 'catalog-sync sync' to start a sync.");
            return Ok(EXIT_OK);
        }

        println!("Last {} run(s):", runs.len());
        println!();
        println!(
            "{:<38} {:<11} {:<14} {:<21} {:<10} {:<8}",
            "Run ID", "Type", "Status", "Started", "Duration", "Items"
        );
        println!("{}", "-".repeat(106));
        for run in &runs {
            println!("{}", format_row(run));
            if let Some(error) = &run.error_message {
                println!("    ↳ {error}");
            }
        }
        println!();
        Ok(EXIT_OK)
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Started => "🔄 Started",
        RunStatus::Completed => "✅ Completed",
        RunStatus::Failed => "❌ Failed",
        RunStatus::Timeout => "⌛ Timeout",
        RunStatus::Cancelled => "⏹️  Cancelled",
    }
}

fn format_row(run: &SyncRun) -> String {
    let duration = run
        .duration()
        .map(|d| format!("{:.1}s", d.num_milliseconds() as f64 / 1000.0))
        .unwrap_or_else(|| "-".to_string());
    let items = run
        .item_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<38} {:<11} {:<14} {:<21} {:<10} {:<8}",
        run.id.to_string(),
        run.sync_type.as_str(),
        status_label(run.status),
        run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        duration,
        items
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SyncType;

    #[test]
    fn test_row_for_completed_run() {
        let mut run = SyncRun::new(SyncType::Scheduled);
        run.mark_completed(12).unwrap();

        let row = format_row(&run);
        assert!(row.contains("scheduled"));
        assert!(row.contains("Completed"));
        assert!(row.trim_end().ends_with("12"));
    }

    #[test]
    fn test_row_for_running_run() {
        let run = SyncRun::new(SyncType::OnDemand);
        let row = format_row(&run);
        assert!(row.contains("on_demand"));
        assert!(row.contains("Started"));
        assert!(row.trim_end().ends_with('-'));
    }
}
