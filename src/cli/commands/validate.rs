//! Validate config command implementation
//!
//! Loads and validates a configuration file and prints a summary with
//! credentials redacted.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::config::{load_config, redact_connection_string, SyncConfig};
use crate::core::query::QuerySource;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        // A broken baseline or mapping set only surfaces when the query is built
        if let Err(e) = QuerySource::from_config(&config.query).and_then(|s| s.resolve()) {
            println!("❌ Query configuration is invalid");
            println!("   Error: {e}");
            return Ok(EXIT_CONFIG);
        }

        println!();
        print_summary(&config);
        Ok(EXIT_OK)
    }
}

fn print_summary(config: &SyncConfig) {
    println!("Configuration Summary:");
    println!("  Environment: {:?}", config.environment);
    println!("  Log Level: {}", config.application.log_level);
    println!("  Shop: {}", config.shopify.shop_url);
    println!("  API Version: {}", config.shopify.api_version);
    println!(
        "  Retry: {} attempts, {}ms initial delay",
        config.shopify.retry.max_attempts, config.shopify.retry.initial_delay_ms
    );
    println!(
        "  PostgreSQL: {}",
        redact_connection_string(config.postgresql.connection_string.expose_secret().as_ref())
    );
    println!(
        "  Lease / Orphan: {} / {} minutes",
        config.sync.lease_minutes, config.sync.orphan_minutes
    );
    println!(
        "  Poll: every {}s, up to {}s",
        config.sync.poll_interval_seconds, config.sync.max_wait_seconds
    );
    if config.query.field_mappings.is_empty() {
        println!("  Query: built-in");
    } else {
        println!(
            "  Query: generated from {} field mapping(s), baseline {}",
            config.query.field_mappings.len(),
            config.query.baseline_path.as_deref().unwrap_or("none")
        );
    }
    println!(
        "  Classification: '{}' (marker '{}', excluding '{}')",
        config.transform.classification_field,
        config.transform.mode_marker,
        config.transform.exclusion_keyword
    );
    println!(
        "  Health: {}h window, {} consecutive failures, {:.0}% minimum success",
        config.health.window_hours,
        config.health.consecutive_failure_threshold,
        config.health.min_success_rate
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let args = ValidateArgs {};
        let code = args.execute("/nonexistent/catalog-sync.toml").await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
