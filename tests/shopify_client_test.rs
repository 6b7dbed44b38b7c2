//! Integration tests for the GraphQL client against a mock HTTP server

use catalog_sync::adapters::shopify::{BulkOperationApi, ShopifyClient};
use catalog_sync::config::{secret_string, RetryConfig, ShopifyConfig};
use catalog_sync::domain::{OperationId, RemoteError, RemoteJobStatus, SyncError};
use futures::StreamExt;
use mockito::{Matcher, Server};

const GRAPHQL_PATH: &str = "/admin/api/2024-10/graphql.json";

fn client(server: &Server, max_attempts: usize) -> ShopifyClient {
    let config = ShopifyConfig {
        shop_url: server.url(),
        access_token: secret_string("shpat_test".to_string()),
        api_version: "2024-10".to_string(),
        timeout_seconds: 5,
        retry: RetryConfig {
            max_attempts,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
            jitter_ratio: 0.0,
        },
    };
    ShopifyClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_start_bulk_query_returns_handle() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GRAPHQL_PATH)
        .match_header("x-shopify-access-token", "shpat_test")
        .match_body(Matcher::Regex("bulkOperationRunQuery".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"data":{"bulkOperationRunQuery":{"bulkOperation":{"id":"gid://shopify/BulkOperation/1","status":"CREATED","errorCode":null,"objectCount":"0","url":null},"userErrors":[]}}}"#,
        )
        .create_async()
        .await;

    let handle = client(&server, 3)
        .start_bulk_query("{ productVariants { edges { node { id } } } }")
        .await
        .unwrap();

    assert_eq!(handle.operation_id.as_str(), "gid://shopify/BulkOperation/1");
    assert_eq!(handle.status, RemoteJobStatus::Created);
    assert_eq!(handle.result_url, None);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_user_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GRAPHQL_PATH)
        .with_status(200)
        .with_body(
            r#"{"data":{"bulkOperationRunQuery":{"bulkOperation":null,"userErrors":[{"field":["query"],"message":"Invalid bulk query"}]}}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let err = client(&server, 3)
        .start_bulk_query("{ bad }")
        .await
        .unwrap_err();

    match err {
        SyncError::Remote(RemoteError::UserErrors(message)) => {
            assert_eq!(message, "query: Invalid bulk query");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_retried_until_budget_spent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GRAPHQL_PATH)
        .with_status(503)
        .with_body("Service Unavailable")
        .expect(3)
        .create_async()
        .await;

    let err = client(&server, 3).current_operation().await.unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(
        err,
        SyncError::Remote(RemoteError::Transient { status: 503, .. })
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_errors_fail_fast() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GRAPHQL_PATH)
        .with_status(401)
        .with_body("Invalid API key or access token")
        .expect(1)
        .create_async()
        .await;

    let err = client(&server, 4).current_operation().await.unwrap_err();

    assert!(!err.is_retryable());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_throttled_graphql_error_is_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GRAPHQL_PATH)
        .with_status(200)
        .with_body(r#"{"errors":[{"message":"Throttled","extensions":{"code":"THROTTLED"}}]}"#)
        .expect(2)
        .create_async()
        .await;

    let err = client(&server, 2).current_operation().await.unwrap_err();

    assert!(err.is_retryable());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_poll_status_parses_completed_job() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", GRAPHQL_PATH)
        .match_body(Matcher::PartialJsonString(
            r#"{"variables":{"id":"gid://shopify/BulkOperation/7"}}"#.to_string(),
        ))
        .with_status(200)
        .with_body(
            r#"{"data":{"node":{"id":"gid://shopify/BulkOperation/7","status":"COMPLETED","errorCode":null,"objectCount":"1204","url":"https://storage.example.com/7.jsonl"}}}"#,
        )
        .create_async()
        .await;

    let handle = client(&server, 1)
        .poll_status(&OperationId::new("gid://shopify/BulkOperation/7").unwrap())
        .await
        .unwrap();

    assert_eq!(handle.status, RemoteJobStatus::Completed);
    assert_eq!(handle.object_count, 1204);
    assert_eq!(
        handle.result_url.as_deref(),
        Some("https://storage.example.com/7.jsonl")
    );
}

#[tokio::test]
async fn test_failed_job_keeps_error_code() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", GRAPHQL_PATH)
        .with_status(200)
        .with_body(
            r#"{"data":{"node":{"id":"gid://shopify/BulkOperation/7","status":"FAILED","errorCode":"ACCESS_DENIED","objectCount":"0","url":null}}}"#,
        )
        .create_async()
        .await;

    let handle = client(&server, 1)
        .poll_status(&OperationId::new("gid://shopify/BulkOperation/7").unwrap())
        .await
        .unwrap();

    assert_eq!(handle.status, RemoteJobStatus::Failed);
    assert_eq!(handle.error_code.as_deref(), Some("ACCESS_DENIED"));
}

#[tokio::test]
async fn test_no_current_operation() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", GRAPHQL_PATH)
        .with_status(200)
        .with_body(r#"{"data":{"currentBulkOperation":null}}"#)
        .create_async()
        .await;

    assert!(client(&server, 1).current_operation().await.unwrap().is_none());
}

#[tokio::test]
async fn test_download_streams_result_body() {
    let mut server = Server::new_async().await;
    let body = "{\"id\":\"gid://shopify/ProductVariant/1\"}\n{\"id\":\"gid://shopify/ProductVariant/2\"}\n";
    server
        .mock("GET", "/results/7.jsonl")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let url = format!("{}/results/7.jsonl", server.url());
    let mut stream = client(&server, 1).download_results(&url).await.unwrap();

    let mut received = Vec::new();
    while let Some(chunk) = stream.next().await {
        received.extend(chunk.unwrap());
    }
    assert_eq!(String::from_utf8(received).unwrap(), body);
}

#[tokio::test]
async fn test_download_not_found_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/results/expired.jsonl")
        .with_status(404)
        .create_async()
        .await;

    let url = format!("{}/results/expired.jsonl", server.url());
    assert!(client(&server, 1).download_results(&url).await.is_err());
}
