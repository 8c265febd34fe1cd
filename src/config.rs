use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

lazy_static! {
    static ref SQL_IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Returns true when `name` can be interpolated into SQL text as a bare identifier.
pub fn is_sql_identifier(name: &str) -> bool {
    SQL_IDENTIFIER.is_match(name)
}

fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if is_sql_identifier(name) {
        Ok(())
    } else {
        Err(ValidationError::new("sql_identifier"))
    }
}

/// Physical layout of the entity-attribute store plus compiler limits.
///
/// Every table stores entity rows in one generic entity table; each attribute
/// lives in its own table whose rows carry the owning entity pk, an attribute
/// instance id, an optional parent attribute id, a collection path and the value.
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompilerConfig {
    /// Database schema that owns every table (empty = unqualified table names)
    #[validate(custom(function = "validate_optional_identifier"))]
    pub schema_name: String,

    /// Generic entity table
    #[validate(custom(function = "validate_identifier"))]
    pub entity_table: String,

    #[validate(custom(function = "validate_identifier"))]
    pub entity_pk_column: String,

    #[validate(custom(function = "validate_identifier"))]
    pub entity_identity_column: String,

    #[validate(custom(function = "validate_identifier"))]
    pub entity_type_id_column: String,

    /// Column in every attribute table referencing the owning entity pk
    #[validate(custom(function = "validate_identifier"))]
    pub attribute_entity_pk_column: String,

    /// Column holding the attribute value (referenced entity pk for associations)
    #[validate(custom(function = "validate_identifier"))]
    pub attribute_value_column: String,

    /// Hierarchical path column of collection elements
    #[validate(custom(function = "validate_identifier"))]
    pub collection_path_column: String,

    /// Label of the collection root in stored paths (`top`, `top.0`, `top.0.1`)
    #[validate(custom(function = "validate_identifier"))]
    pub collection_path_top_label: String,

    /// Longest reference chain accepted before the path is reported as inconsistent
    #[validate(range(
        min = 1,
        max = 64,
        message = "Max path depth must be between 1 and 64"
    ))]
    pub max_path_depth: u32,
}

fn validate_optional_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        Ok(())
    } else {
        validate_identifier(name)
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            schema_name: String::new(),
            entity_table: "entities".to_string(),
            entity_pk_column: "entity_pk".to_string(),
            entity_identity_column: "entity_identity".to_string(),
            entity_type_id_column: "entity_type_id".to_string(),
            attribute_entity_pk_column: "entity_pk".to_string(),
            attribute_value_column: "qname_value".to_string(),
            collection_path_column: "collection_path".to_string(),
            collection_path_top_label: "top".to_string(),
            max_path_depth: 16,
        }
    }
}

impl CompilerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            schema_name: env::var("ENTITY_SQL_SCHEMA").unwrap_or(defaults.schema_name),
            entity_table: env::var("ENTITY_SQL_ENTITY_TABLE").unwrap_or(defaults.entity_table),
            entity_pk_column: env::var("ENTITY_SQL_ENTITY_PK_COLUMN")
                .unwrap_or(defaults.entity_pk_column),
            entity_identity_column: env::var("ENTITY_SQL_ENTITY_IDENTITY_COLUMN")
                .unwrap_or(defaults.entity_identity_column),
            entity_type_id_column: env::var("ENTITY_SQL_ENTITY_TYPE_ID_COLUMN")
                .unwrap_or(defaults.entity_type_id_column),
            attribute_entity_pk_column: env::var("ENTITY_SQL_ATTRIBUTE_ENTITY_PK_COLUMN")
                .unwrap_or(defaults.attribute_entity_pk_column),
            attribute_value_column: env::var("ENTITY_SQL_ATTRIBUTE_VALUE_COLUMN")
                .unwrap_or(defaults.attribute_value_column),
            collection_path_column: env::var("ENTITY_SQL_COLLECTION_PATH_COLUMN")
                .unwrap_or(defaults.collection_path_column),
            collection_path_top_label: env::var("ENTITY_SQL_COLLECTION_TOP_LABEL")
                .unwrap_or(defaults.collection_path_top_label),
            max_path_depth: parse_env_var("ENTITY_SQL_MAX_PATH_DEPTH", "16")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text; missing keys keep their defaults
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content.to_string(),
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Table name qualified with the configured schema
    pub fn qualified_table(&self, table: &str) -> String {
        if self.schema_name.is_empty() {
            table.to_string()
        } else {
            format!("{}.{}", self.schema_name, table)
        }
    }

    /// `lquery` pattern matching every stored path strictly below the collection root
    pub fn below_top_pattern(&self) -> String {
        format!("{}.*{{1,}}", self.collection_path_top_label)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.entity_table, "entities");
        assert_eq!(config.max_path_depth, 16);
        assert_eq!(config.below_top_pattern(), "top.*{1,}");
    }

    #[test]
    fn test_invalid_path_depth() {
        let config = CompilerConfig {
            max_path_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_identifier_rejects_injection() {
        let config = CompilerConfig {
            entity_table: "entities; DROP TABLE x".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_qualified_table() {
        let config = CompilerConfig {
            schema_name: "store".to_string(),
            ..Default::default()
        };
        assert_eq!(config.qualified_table("entities"), "store.entities");
        assert_eq!(CompilerConfig::default().qualified_table("entities"), "entities");
    }

    #[test]
    fn test_yaml_partial_overrides() {
        let config = CompilerConfig::from_yaml_str("schema_name: idx\nmax_path_depth: 4\n").unwrap();
        assert_eq!(config.schema_name, "idx");
        assert_eq!(config.max_path_depth, 4);
        assert_eq!(config.attribute_value_column, "qname_value");
    }

    #[test]
    #[serial]
    fn test_from_env_bad_depth() {
        env::set_var("ENTITY_SQL_MAX_PATH_DEPTH", "deep");
        let result = CompilerConfig::from_env();
        env::remove_var("ENTITY_SQL_MAX_PATH_DEPTH");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        env::set_var("ENTITY_SQL_SCHEMA", "indexing");
        let config = CompilerConfig::from_env();
        env::remove_var("ENTITY_SQL_SCHEMA");
        assert_eq!(config.unwrap().schema_name, "indexing");
    }
}
