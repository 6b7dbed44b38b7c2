//! Core sync engine.
//!
//! # Modules
//!
//! - [`sync`] - Run orchestration, completion callbacks and the orphan sweep
//! - [`guard`] - Local lease plus remote status concurrency check
//! - [`query`] - Bulk query generation and baseline validation
//! - [`ingest`] - Streaming NDJSON decoding
//! - [`reconcile`] - Idempotent staging upserts
//! - [`transform`] - Canonical catalog rebuild
//! - [`health`] - Run-history statistics and alerting
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_sync::adapters::database::create_stores;
//! use catalog_sync::adapters::shopify::ShopifyClient;
//! use catalog_sync::config::load_config;
//! use catalog_sync::core::health::HealthMonitor;
//! use catalog_sync::core::sync::{SyncOptions, SyncOrchestrator};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("catalog-sync.toml")?;
//! let stores = create_stores(&config).await?;
//! let remote = Arc::new(ShopifyClient::new(&config.shopify)?);
//!
//! let orchestrator = SyncOrchestrator::new(&config, remote, stores.clone())?;
//! let response = orchestrator.run_full_sync(SyncOptions::default()).await;
//! println!("{}", response.message);
//!
//! let monitor = HealthMonitor::new(stores.runs.clone(), config.health.clone());
//! let decision = monitor.check_and_alert().await?;
//! println!("alert: {}", decision.should_alert);
//! # Ok(())
//! # }
//! ```

pub mod guard;
pub mod health;
pub mod ingest;
pub mod query;
pub mod reconcile;
pub mod sync;
pub mod transform;
