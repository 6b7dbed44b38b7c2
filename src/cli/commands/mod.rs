//! CLI command implementations
//!
//! Every command returns the process exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Sync failed, interrupted, or health alert raised |
//! | 2 | Configuration error |
//! | 3 | Sync already in progress |
//! | 4 | Connection error |
//! | 5 | Fatal error |

pub mod complete;
pub mod health;
pub mod init;
pub mod query;
pub mod status;
pub mod sync;
pub mod transform;
pub mod validate;

use crate::adapters::database::{create_stores, Stores};
use crate::adapters::shopify::ShopifyClient;
use crate::config::{load_config, SyncConfig};
use crate::core::sync::{SyncOutcome, SyncResponse};
use std::sync::Arc;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_IN_PROGRESS: i32 = 3;
pub const EXIT_CONNECTION: i32 = 4;
pub const EXIT_FATAL: i32 = 5;

/// Load configuration, printing the failure
fn load_or_report(config_path: &str) -> Result<SyncConfig, i32> {
    load_config(config_path).map_err(|e| {
        tracing::error!(config_path = %config_path, error = %e, "Failed to load configuration");
        println!("❌ Failed to load configuration file");
        println!("   Error: {e}");
        EXIT_CONFIG
    })
}

/// Connect to PostgreSQL, printing the failure
async fn connect_stores(config: &SyncConfig) -> Result<Stores, i32> {
    create_stores(config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to connect to database");
        println!("❌ Failed to connect to database");
        println!("   Error: {e}");
        EXIT_CONNECTION
    })
}

/// Build the remote API client, printing the failure
fn connect_remote(config: &SyncConfig) -> Result<Arc<ShopifyClient>, i32> {
    ShopifyClient::new(&config.shopify).map(Arc::new).map_err(|e| {
        tracing::error!(error = %e, "Failed to create remote API client");
        println!("❌ Failed to create remote API client");
        println!("   Error: {e}");
        EXIT_CONFIG
    })
}

/// Exit code for a sync or completion response
pub fn exit_code_for(response: &SyncResponse) -> i32 {
    match response.outcome {
        SyncOutcome::Completed | SyncOutcome::Started | SyncOutcome::Pending => EXIT_OK,
        SyncOutcome::AlreadyRunning => EXIT_IN_PROGRESS,
        SyncOutcome::Failed
        | SyncOutcome::TimedOut
        | SyncOutcome::Cancelled
        | SyncOutcome::Interrupted
        | SyncOutcome::Rejected => EXIT_FAILED,
    }
}

/// Print a response for humans, or as JSON
fn print_response(response: &SyncResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    let icon = match response.outcome {
        SyncOutcome::Completed | SyncOutcome::Started => "✅",
        SyncOutcome::AlreadyRunning | SyncOutcome::Pending => "⏳",
        SyncOutcome::Interrupted => "⚠️ ",
        _ => "❌",
    };
    println!("{icon} {}", response.message);
    if let Some(run_id) = response.run_id {
        println!("  Run: {run_id}");
    }
    if let Some(operation_id) = &response.operation_id {
        println!("  Bulk operation: {operation_id}");
    }
    if let Some(status) = response.status {
        println!("  Status: {status}");
    }
    if let Some(processed) = response.processed_count {
        println!("  Records ingested: {processed}");
    }
    if let Some(items) = response.item_count {
        println!("  Catalog items: {items}");
    }
    if let Some(error) = &response.error {
        println!("  Error: {error}");
    }
    Ok(())
}
