//! PostgreSQL storage
//!
//! Run history, staging tables and the canonical catalog live in one
//! PostgreSQL database. The schema is applied from `migrations/` by
//! [`PostgreSQLClient::ensure_schema`].

pub mod adapter;
pub mod client;
pub(crate) mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
