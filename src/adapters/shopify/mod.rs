//! Remote platform integration
//!
//! - [`api`] - the [`BulkOperationApi`] trait the engine depends on
//! - [`client`] - GraphQL Admin API implementation over `reqwest`
//! - [`models`] - request documents and response wire types
//! - [`retry`] - the retry policy shared by every remote call

pub mod api;
pub mod client;
pub mod models;
pub mod retry;

pub use api::{BulkOperationApi, ByteStream};
pub use client::ShopifyClient;
pub use retry::RetryPolicy;
