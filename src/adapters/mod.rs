//! External system integrations.
//!
//! - [`shopify`] - remote bulk operation API (GraphQL) with retry policy
//! - [`database`] - storage traits and the store factory
//! - [`postgresql`] - PostgreSQL implementation of the storage traits
//! - [`memory`] - in-memory implementation of the storage traits
//!
//! Adapters isolate third-party clients behind traits so the sync engine can
//! be exercised with scripted fakes and the in-memory store.
//!
//! ```rust,no_run
//! use catalog_sync::adapters::database::create_stores;
//! use catalog_sync::adapters::shopify::ShopifyClient;
//! use catalog_sync::config::load_config;
//!
//! # async fn example() -> catalog_sync::domain::Result<()> {
//! let config = load_config("catalog-sync.toml")?;
//! let remote = ShopifyClient::new(&config.shopify)?;
//! let stores = create_stores(&config).await?;
//! # let _ = (remote, stores);
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod memory;
pub mod postgresql;
pub mod shopify;
