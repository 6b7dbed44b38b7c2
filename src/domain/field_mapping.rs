//! Field mapping configuration that drives query generation

use serde::{Deserialize, Serialize};

/// Kind of field a mapping refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Scalar,
    Object,
    Connection,
    Metafield,
}

/// One entry of the ordered field mapping list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Field path; for metafields this is the alias used in the query
    pub path: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    pub sort_order: i32,

    /// Disabled entries are ignored by the generator
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub metafield_namespace: Option<String>,

    #[serde(default)]
    pub metafield_key: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl FieldMapping {
    /// Convenience constructor for a metafield entry
    pub fn metafield(
        path: impl Into<String>,
        sort_order: i32,
        namespace: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            field_type: FieldType::Metafield,
            sort_order,
            enabled: true,
            metafield_namespace: Some(namespace.into()),
            metafield_key: Some(key.into()),
        }
    }

    /// Convenience constructor for a plain scalar entry
    pub fn scalar(path: impl Into<String>, sort_order: i32) -> Self {
        Self {
            path: path.into(),
            field_type: FieldType::Scalar,
            sort_order,
            enabled: true,
            metafield_namespace: None,
            metafield_key: None,
        }
    }

    pub fn is_metafield(&self) -> bool {
        self.field_type == FieldType::Metafield
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_toml() {
        let toml_str = r#"
path = "season"
type = "metafield"
sort_order = 3
metafield_namespace = "custom"
metafield_key = "season"
"#;
        let mapping: FieldMapping = toml::from_str(toml_str).unwrap();
        assert!(mapping.is_metafield());
        assert!(mapping.enabled);
        assert_eq!(mapping.metafield_key.as_deref(), Some("season"));
    }
}
