//! GraphQL Admin API client for bulk operations
//!
//! Every call goes through the shared [`RetryPolicy`]; the client itself keeps
//! no job state.

use super::api::{BulkOperationApi, ByteStream};
use super::models::{
    CurrentBulkOperationData, GraphQlRequest, GraphQlResponse, NodeData, RunBulkQueryData,
    CURRENT_BULK_OPERATION_QUERY, POLL_BULK_OPERATION_QUERY, RUN_BULK_QUERY_MUTATION,
};
use super::retry::RetryPolicy;
use crate::config::{SecretString, ShopifyConfig};
use crate::domain::errors::RemoteError;
use crate::domain::{OperationId, RemoteJobHandle, Result, SyncError};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote job client backed by `reqwest`
///
/// # Example
///
/// ```no_run
/// use catalog_sync::adapters::shopify::{BulkOperationApi, ShopifyClient};
/// use catalog_sync::config::load_config;
///
/// # async fn example() -> catalog_sync::domain::Result<()> {
/// let config = load_config("catalog-sync.toml")?;
/// let client = ShopifyClient::new(&config.shopify)?;
/// let current = client.current_operation().await?;
/// println!("{:?}", current.map(|job| job.status));
/// # Ok(())
/// # }
/// ```
pub struct ShopifyClient {
    endpoint: String,
    access_token: SecretString,
    client: Client,
    download_client: Client,
    retry: RetryPolicy,
}

impl ShopifyClient {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: &ShopifyConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        // Result files can take minutes to stream, so only the connect phase is bounded
        let download_client = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.graphql_endpoint(),
            access_token: config.access_token.clone(),
            client,
            download_client,
            retry: RetryPolicy::from_config(&config.retry),
        })
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let body = GraphQlRequest { query, variables };
        let token: &str = self.access_token.expose_secret().as_ref();

        let data = self
            .retry
            .run(operation_name, || async {
                let response = self
                    .client
                    .post(&self.endpoint)
                    .header(ACCESS_TOKEN_HEADER, token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(map_transport_error)?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(RemoteError::from_status(status.as_u16(), text));
                }

                response
                    .json::<GraphQlResponse<T>>()
                    .await
                    .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?
                    .into_data()
            })
            .await?;

        Ok(data)
    }
}

fn map_transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout(e.to_string())
    } else {
        RemoteError::Connection(e.to_string())
    }
}

#[async_trait]
impl BulkOperationApi for ShopifyClient {
    async fn start_bulk_query(&self, query: &str) -> Result<RemoteJobHandle> {
        tracing::debug!(query_len = query.len(), "Submitting bulk query");

        let data: RunBulkQueryData = self
            .graphql(
                "bulkOperationRunQuery",
                RUN_BULK_QUERY_MUTATION,
                json!({ "query": query }),
            )
            .await?;
        let payload = data.bulk_operation_run_query;

        if !payload.user_errors.is_empty() {
            let message = payload
                .user_errors
                .iter()
                .map(|e| e.describe())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(RemoteError::UserErrors(message).into());
        }

        let handle = payload
            .bulk_operation
            .ok_or_else(|| {
                RemoteError::InvalidResponse("bulkOperationRunQuery returned no operation".into())
            })?
            .into_handle()?;

        tracing::info!(
            operation_id = %handle.operation_id,
            status = %handle.status,
            "Bulk operation accepted"
        );
        Ok(handle)
    }

    async fn poll_status(&self, operation_id: &OperationId) -> Result<RemoteJobHandle> {
        let data: NodeData = self
            .graphql(
                "pollBulkOperation",
                POLL_BULK_OPERATION_QUERY,
                json!({ "id": operation_id.as_str() }),
            )
            .await?;

        let handle = data
            .node
            .ok_or_else(|| {
                RemoteError::InvalidResponse(format!("Bulk operation {operation_id} not found"))
            })?
            .into_handle()?;

        tracing::debug!(
            operation_id = %handle.operation_id,
            status = %handle.status,
            object_count = handle.object_count,
            "Polled bulk operation"
        );
        Ok(handle)
    }

    async fn current_operation(&self) -> Result<Option<RemoteJobHandle>> {
        let data: CurrentBulkOperationData = self
            .graphql(
                "currentBulkOperation",
                CURRENT_BULK_OPERATION_QUERY,
                json!({}),
            )
            .await?;

        Ok(data
            .current_bulk_operation
            .map(|node| node.into_handle())
            .transpose()?)
    }

    async fn download_results(&self, url: &str) -> Result<ByteStream> {
        // Only the request is retried; a stream broken mid-body fails the run
        let response = self
            .retry
            .run("downloadResults", || async {
                let response = self
                    .download_client
                    .get(url)
                    .send()
                    .await
                    .map_err(map_transport_error)?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(RemoteError::from_status(status.as_u16(), text));
                }
                Ok(response)
            })
            .await?;

        tracing::info!(
            content_length = ?response.content_length(),
            "Streaming bulk operation results"
        );

        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| SyncError::Remote(map_transport_error(e)))
        });
        Ok(Box::pin(stream))
    }
}
