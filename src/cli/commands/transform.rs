//! Transform command implementation
//!
//! Rebuilds the canonical catalog from the current staging data without
//! starting a remote job.

use super::{connect_stores, load_or_report, EXIT_FATAL, EXIT_OK};
use crate::core::transform::{TransformOptions, TransformStage};
use clap::Args;

/// Arguments for the transform command
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Do not snapshot the catalog before rebuilding it
    #[arg(long)]
    pub skip_backup: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl TransformArgs {
    /// Execute the transform command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(skip_backup = self.skip_backup, "Starting standalone transform");

        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let stores = match connect_stores(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        let stage = TransformStage::new(stores.staging, stores.catalog, config.transform);
        let options = TransformOptions {
            skip_backup: self.skip_backup,
        };

        let summary = match stage.run(options).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Transform failed");
                println!("❌ Transform failed; the previous catalog is unchanged");
                println!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(EXIT_OK);
        }

        println!("📊 Transform Summary:");
        println!("  Catalog items written: {}", summary.processed);
        println!("  Unmatched classification tokens: {}", summary.skipped);
        println!("  Ineligible staging rows: {}", summary.ineligible);
        println!("  Duplicates dropped: {}", summary.duplicates);
        if let Some(backup) = &summary.backup_ref {
            println!("  Snapshot: {backup}");
        }
        println!();
        println!("✅ Catalog rebuilt");
        Ok(EXIT_OK)
    }
}
