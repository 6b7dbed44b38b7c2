//! GraphQL wire types for the bulk operation API

use crate::domain::errors::RemoteError;
use crate::domain::{OperationId, RemoteJobHandle, RemoteJobStatus};
use serde::{Deserialize, Deserializer, Serialize};

pub const RUN_BULK_QUERY_MUTATION: &str = r#"mutation RunBulkQuery($query: String!) {
  bulkOperationRunQuery(query: $query) {
    bulkOperation { id status errorCode objectCount url }
    userErrors { field message }
  }
}"#;

pub const POLL_BULK_OPERATION_QUERY: &str = r#"query PollBulkOperation($id: ID!) {
  node(id: $id) {
    ... on BulkOperation { id status errorCode objectCount url }
  }
}"#;

pub const CURRENT_BULK_OPERATION_QUERY: &str = r#"query CurrentBulkOperation {
  currentBulkOperation { id status errorCode objectCount url }
}"#;

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorItem>,
}

impl<T> GraphQlResponse<T> {
    /// `data`, or the joined top-level error messages
    pub fn into_data(self) -> Result<T, RemoteError> {
        if !self.errors.is_empty() {
            let throttled = self.errors.iter().any(GraphQlErrorItem::is_throttled);
            let message = self
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            if throttled {
                return Err(RemoteError::Transient {
                    status: 429,
                    message,
                });
            }
            return Err(RemoteError::GraphQl(message));
        }
        self.data
            .ok_or_else(|| RemoteError::InvalidResponse("response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphQlErrorItem {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

impl GraphQlErrorItem {
    /// Cost-based rate limiting is reported as a 200 with a THROTTLED error
    pub fn is_throttled(&self) -> bool {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(|code| code.as_str())
            == Some("THROTTLED")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunBulkQueryData {
    pub bulk_operation_run_query: RunBulkQueryPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunBulkQueryPayload {
    pub bulk_operation: Option<BulkOperationNode>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl UserError {
    pub fn describe(&self) -> String {
        match &self.field {
            Some(path) if !path.is_empty() => format!("{}: {}", path.join("."), self.message),
            _ => self.message.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NodeData {
    pub node: Option<BulkOperationNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentBulkOperationData {
    pub current_bulk_operation: Option<BulkOperationNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationNode {
    pub id: String,
    pub status: RemoteJobStatus,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub object_count: u64,
    #[serde(default)]
    pub url: Option<String>,
}

impl BulkOperationNode {
    pub fn into_handle(self) -> Result<RemoteJobHandle, RemoteError> {
        let operation_id = OperationId::new(self.id).map_err(RemoteError::InvalidResponse)?;
        // A result URL is only meaningful once the job has completed
        let result_url = match self.status {
            RemoteJobStatus::Completed => self.url.filter(|u| !u.is_empty()),
            _ => None,
        };
        Ok(RemoteJobHandle {
            operation_id,
            status: self.status,
            object_count: self.object_count,
            result_url,
            error_code: self.error_code,
        })
    }
}

/// Counts arrive as strings (`UnsignedInt64`) or numbers depending on API version
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
        Null(()),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Count::Null(()) => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_parses_string_count() {
        let node: BulkOperationNode = serde_json::from_str(
            r#"{"id":"gid://shopify/BulkOperation/1","status":"COMPLETED","errorCode":null,"objectCount":"1234","url":"https://storage.example.com/r.jsonl"}"#,
        )
        .unwrap();
        let handle = node.into_handle().unwrap();
        assert_eq!(handle.object_count, 1234);
        assert_eq!(handle.result_url.as_deref(), Some("https://storage.example.com/r.jsonl"));
    }

    #[test]
    fn test_url_dropped_unless_completed() {
        let node: BulkOperationNode = serde_json::from_str(
            r#"{"id":"gid://shopify/BulkOperation/1","status":"RUNNING","objectCount":10,"url":"https://x"}"#,
        )
        .unwrap();
        assert!(node.into_handle().unwrap().result_url.is_none());
    }

    #[test]
    fn test_graphql_errors_take_precedence() {
        let response: GraphQlResponse<NodeData> = serde_json::from_str(
            r#"{"data":null,"errors":[{"message":"Throttled"},{"message":"Try later"}]}"#,
        )
        .unwrap();
        match response.into_data() {
            Err(RemoteError::GraphQl(msg)) => assert_eq!(msg, "Throttled; Try later"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_throttled_error_is_transient() {
        let response: GraphQlResponse<NodeData> = serde_json::from_str(
            r#"{"errors":[{"message":"Throttled","extensions":{"code":"THROTTLED"}}]}"#,
        )
        .unwrap();
        let err = response.into_data().unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_user_error_describe() {
        let err = UserError {
            field: Some(vec!["query".to_string()]),
            message: "Invalid bulk query".to_string(),
        };
        assert_eq!(err.describe(), "query: Invalid bulk query");
    }
}
