//! # Schema Catalog Error Types
//!
//! Errors raised while loading or validating the storage schema catalog.
//! Lookup misses during compilation are not reported here; the compiler
//! turns them into `QueryCompileError::SchemaInconsistency`.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaCatalogError {
    #[error("Invalid table mapping: `{table}` is not a valid SQL identifier")]
    InvalidTableName { table: String },
    #[error("Invalid column mapping: `{column}` is not a valid SQL identifier")]
    InvalidColumnName { column: String },
    #[error("Duplicate attribute `{attribute}`")]
    DuplicateAttribute { attribute: String },
    #[error("Failed to read catalog file: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse catalog: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid catalog: {message}")]
    InvalidConfig { message: String },
}

impl SchemaCatalogError {
    /// Create an InvalidConfig error with context information
    ///
    /// # Example
    /// ```ignore
    /// SchemaCatalogError::config_error_with_context(
    ///     "super type `Party` is not declared",
    ///     "While resolving entity type `Customer`"
    /// )
    /// ```
    pub fn config_error_with_context(
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        SchemaCatalogError::InvalidConfig {
            message: format!("{}\n  Context: {}", message.into(), context.into()),
        }
    }
}
