// Catalog Sync - Bulk catalog synchronization engine
// Copyright (c) 2025 Catalog Sync Contributors
// Licensed under the MIT License

//! # catalog-sync - bulk catalog synchronization
//!
//! catalog-sync mirrors a remote commerce catalog into PostgreSQL. It starts
//! an asynchronous bulk export on the remote platform, waits for it, streams
//! the NDJSON result into staging tables and rebuilds a canonical catalog
//! table from staging.
//!
//! ## Overview
//!
//! - **Query generation**: the bulk query is built from ordered field
//!   mappings and proven line-by-line against a known-good baseline
//! - **Run lifecycle**: every attempt is a persisted run with a
//!   `started → completed | failed | timeout | cancelled` state machine
//! - **Concurrency guard**: a local lease plus the remote platform's current
//!   job keep two syncs from overlapping
//! - **Streaming ingestion**: results are parsed record by record from a
//!   chunked download and upserted, never buffered whole
//! - **Canonical rebuild**: staging rows are filtered, fanned out over
//!   classification tokens, deduplicated and swapped in atomically
//! - **Health**: run history reduces to statistics and a single alert
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Sync engine (query, guard, ingest, reconcile, transform, health)
//! - [`adapters`] - Remote API client and storage backends
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog_sync::adapters::database::create_stores;
//! use catalog_sync::adapters::shopify::ShopifyClient;
//! use catalog_sync::config::load_config;
//! use catalog_sync::core::sync::{SyncOptions, SyncOrchestrator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("catalog-sync.toml")?;
//!     let remote = Arc::new(ShopifyClient::new(&config.shopify)?);
//!     let stores = create_stores(&config).await?;
//!
//!     let orchestrator = SyncOrchestrator::new(&config, remote, stores)?;
//!     let response = orchestrator.run_full_sync(SyncOptions::default()).await;
//!
//!     println!("{}: {:?} items", response.message, response.item_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`] with [`domain::SyncError`]. The
//! orchestrator is the exception: it records failures on the run and always
//! hands back a [`core::sync::SyncResponse`].
//!
//! ## Testing
//!
//! [`adapters::memory::InMemoryStore`] implements every storage trait and the
//! remote API sits behind [`adapters::shopify::BulkOperationApi`], so the
//! whole engine runs in tests without PostgreSQL or HTTP.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
