//! Configuration management.
//!
//! TOML-based configuration with `${VAR_NAME}` substitution, `CATALOG_SYNC_*`
//! environment overrides, serde defaults for optional settings and validation
//! on load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use catalog_sync::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("catalog-sync.toml")?;
//! println!("Shop: {}", config.shopify.shop_url);
//! println!("Lease: {} minutes", config.sync.lease_minutes);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level
//! - [`ShopifyConfig`] - remote endpoint, token, retry policy
//! - [`SyncSettingsConfig`] - lease, orphan threshold, poll cadence
//! - [`QueryConfig`] - field mappings and baseline query
//! - [`TransformConfig`] - eligibility and fan-out rules
//! - [`PostgreSQLConfig`] - run history, staging and catalog storage
//! - [`HealthConfig`] - alert thresholds
//! - [`LoggingConfig`] - file logging
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [shopify]
//! shop_url = "https://example.myshopify.com"
//! access_token = "${SHOPIFY_ACCESS_TOKEN}"
//!
//! [postgresql]
//! connection_string = "${DATABASE_URL}"
//!
//! [[query.field_mappings]]
//! path = "season"
//! type = "metafield"
//! sort_order = 1
//! metafield_namespace = "custom"
//! metafield_key = "season"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, Environment, HealthConfig, LoggingConfig, PostgreSQLConfig, QueryConfig,
    RetryConfig, ShopifyConfig, SyncConfig, SyncSettingsConfig, TransformConfig,
};
pub use secret::{redact_connection_string, secret_string, SecretString, SecretValue};
