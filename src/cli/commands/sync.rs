//! Sync command implementation
//!
//! Starts a bulk export, waits for it, ingests the results and rebuilds the
//! catalog. With `--no-wait` it returns as soon as the job is accepted and the
//! `complete` command (or the completion webhook) finishes the run.

use super::{
    connect_remote, connect_stores, exit_code_for, load_or_report, print_response, EXIT_CONFIG,
};
use crate::core::sync::{SyncOptions, SyncOrchestrator, SyncOutcome};
use crate::domain::SyncType;
use clap::Args;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Return once the bulk operation is accepted
    #[arg(long)]
    pub no_wait: bool,

    /// Override sync.max_wait_seconds
    #[arg(long, value_name = "SECONDS")]
    pub max_wait: Option<u64>,

    /// Record the run as scheduled rather than on-demand
    #[arg(long)]
    pub scheduled: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    fn options(&self) -> SyncOptions {
        SyncOptions {
            sync_type: if self.scheduled {
                SyncType::Scheduled
            } else {
                SyncType::OnDemand
            },
            max_wait: self.max_wait.map(Duration::from_secs),
            wait_for_completion: !self.no_wait,
        }
    }

    /// Execute the sync command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting sync command");

        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let remote = match connect_remote(&config) {
            Ok(r) => r,
            Err(code) => return Ok(code),
        };
        let stores = match connect_stores(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        let orchestrator = match SyncOrchestrator::new(&config, remote, stores) {
            Ok(o) => o.with_shutdown(shutdown_signal),
            Err(e) => {
                tracing::error!(error = %e, "Failed to prepare sync");
                println!("❌ Failed to prepare sync");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if !self.json {
            println!("🚀 Starting catalog sync...");
            println!();
        }

        let response = orchestrator.run_full_sync(self.options()).await;
        print_response(&response, self.json)?;

        if response.outcome == SyncOutcome::Interrupted && !self.json {
            println!();
            println!("   The run stays open until the completion callback arrives");
            println!("   or the orphan sweep times it out.");
        }

        Ok(exit_code_for(&response))
    }
}
