//! Init command implementation
//!
//! This module implements the `init` command for generating a starter
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::core::query::default_field_mappings;
use clap::Args;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "catalog-sync.toml")]
    pub output: String,

    /// Include every option with comments and the default field mappings
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing catalog-sync configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - SHOPIFY_ACCESS_TOKEN");
                println!("     - DATABASE_URL");
                println!("  3. Validate configuration: catalog-sync validate-config");
                println!("  4. Run a sync: catalog-sync sync");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# catalog-sync configuration

environment = "production"

[application]
log_level = "info"

[shopify]
shop_url = "https://example.myshopify.com"
access_token = "${SHOPIFY_ACCESS_TOKEN}"

[postgresql]
connection_string = "${DATABASE_URL}"

[logging]
local_enabled = true
local_path = "/var/log/catalog-sync"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with every section and comments
    fn generate_config_with_examples() -> String {
        let mut config = String::from(
            r#"# catalog-sync configuration
#
# Values of the form ${VAR} are read from the environment (or .env).
# Any key can also be overridden with CATALOG_SYNC_<SECTION>_<KEY>.

# development | staging | production
# Production requires an https:// shop URL.
environment = "production"

[application]
# trace, debug, info, warn, error
log_level = "info"

# ============================================================================
# Remote platform
# ============================================================================
[shopify]
shop_url = "https://example.myshopify.com"
access_token = "${SHOPIFY_ACCESS_TOKEN}"
api_version = "2024-10"
timeout_seconds = 60

# Retries apply to connection errors, timeouts, 429, 5xx and throttling
[shopify.retry]
max_attempts = 4
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0
jitter_ratio = 0.25

# ============================================================================
# Run lifecycle
# ============================================================================
[sync]
# A started run younger than this blocks new runs
lease_minutes = 15
# A started run older than this is swept to timeout
orphan_minutes = 30
poll_interval_seconds = 3
max_wait_seconds = 1800
# Ingestion progress and checkpoint cadence, in records
progress_interval = 100
checkpoint_interval = 5000

# ============================================================================
# Canonical rebuild
# ============================================================================
[transform]
key_delimiter = "-"
classification_field = "tags"
exclusion_keyword = "Archived"
mode_marker = "PreOrder"
required_pricing_fields = ["price"]
backup_before_rebuild = true

# ============================================================================
# Storage
# ============================================================================
[postgresql]
connection_string = "${DATABASE_URL}"
max_connections = 10
connection_timeout_seconds = 30
statement_timeout_seconds = 120

# ============================================================================
# Health alerts
# ============================================================================
[health]
window_hours = 24
consecutive_failure_threshold = 3
min_success_rate = 80.0

[logging]
local_enabled = true
local_path = "/var/log/catalog-sync"
# daily or hourly
local_rotation = "daily"
local_max_size_mb = 100

# ============================================================================
# Query generation
# ============================================================================
# Without field mappings the built-in query is submitted as-is. With them, the
# query is generated and, when baseline_path is set, must match that file
# line for line before it is submitted.
[query]
# baseline_path = "queries/baseline.graphql"
expected_metafield_count = 10
"#,
        );

        for mapping in default_field_mappings() {
            let _ = write!(
                config,
                "\n[[query.field_mappings]]\npath = \"{}\"\ntype = \"metafield\"\nsort_order = {}\n",
                mapping.path, mapping.sort_order
            );
            if let (Some(namespace), Some(key)) =
                (&mapping.metafield_namespace, &mapping.metafield_key)
            {
                let _ = write!(
                    config,
                    "metafield_namespace = \"{namespace}\"\nmetafield_key = \"{key}\"\n"
                );
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn with_credentials(template: &str) -> String {
        template
            .replace("${SHOPIFY_ACCESS_TOKEN}", "shpat_test")
            .replace("${DATABASE_URL}", "postgresql://sync:pw@localhost:5432/catalog")
    }

    #[test]
    fn test_minimal_config_is_loadable() {
        let config =
            load_config_from_str(&with_credentials(&InitArgs::generate_minimal_config())).unwrap();
        assert_eq!(config.shopify.shop_url, "https://example.myshopify.com");
        assert!(config.query.field_mappings.is_empty());
    }

    #[test]
    fn test_example_config_is_loadable() {
        let config =
            load_config_from_str(&with_credentials(&InitArgs::generate_config_with_examples()))
                .unwrap();
        assert_eq!(config.query.field_mappings.len(), 10);
        assert_eq!(config.query.field_mappings, default_field_mappings());
        assert_eq!(config.sync.lease_minutes, 15);
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog-sync.toml");
        fs::write(&path, "# existing").unwrap();

        let args = InitArgs {
            output: path.display().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
        assert_eq!(fs::read_to_string(&path).unwrap(), "# existing");
    }
}
