//! Domain identifier types with validation
//!
//! Newtype wrappers so external record ids, remote operation ids and local run
//! ids can't be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable external identifier of a remote record
///
/// Remote ids look like `gid://shopify/ProductVariant/555`; the segment before
/// the numeric tail names the resource type.
///
/// # Examples
///
/// ```
/// use catalog_sync::domain::ids::ExternalId;
/// use std::str::FromStr;
///
/// let id = ExternalId::from_str("gid://shopify/ProductVariant/555").unwrap();
/// assert_eq!(id.resource_type(), Some("ProductVariant"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalId(String);

impl ExternalId {
    /// Creates a new ExternalId, rejecting blank strings
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("External ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the external ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Resource type segment, e.g. `ProductVariant`
    ///
    /// Any scheme prefix and query string are ignored, so both
    /// `gid://shopify/InventoryLevel/9?inventory_item_id=1` and
    /// `ext://ProductVariant/555` resolve.
    pub fn resource_type(&self) -> Option<&str> {
        let without_query = self.0.split('?').next().unwrap_or(&self.0);
        let path = match without_query.find("://") {
            Some(pos) => &without_query[pos + 3..],
            None => without_query,
        };
        let mut segments = path.rsplit('/');
        let _tail = segments.next()?;
        segments.next().filter(|s| !s.is_empty())
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a remote bulk operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(String);

impl OperationId {
    /// Creates a new OperationId
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Operation ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the operation ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OperationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Local sync run identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh random run id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid run ID '{s}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_id_rejects_blank() {
        assert!(ExternalId::new("").is_err());
        assert!(ExternalId::new("   ").is_err());
    }

    #[test]
    fn test_resource_type_gid() {
        let id = ExternalId::new("gid://shopify/ProductVariant/555").unwrap();
        assert_eq!(id.resource_type(), Some("ProductVariant"));
    }

    #[test]
    fn test_resource_type_short_scheme() {
        let id = ExternalId::new("ext://ProductVariant/555").unwrap();
        assert_eq!(id.resource_type(), Some("ProductVariant"));
    }

    #[test]
    fn test_resource_type_ignores_query() {
        let id = ExternalId::new("gid://shopify/InventoryLevel/77?inventory_item_id=9").unwrap();
        assert_eq!(id.resource_type(), Some("InventoryLevel"));
    }

    #[test]
    fn test_resource_type_missing() {
        let id = ExternalId::new("555").unwrap();
        assert_eq!(id.resource_type(), None);
    }

    #[test]
    fn test_run_id_round_trip() {
        let id = RunId::generate();
        let parsed = RunId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(RunId::from_str("not-a-uuid").is_err());
    }
}
