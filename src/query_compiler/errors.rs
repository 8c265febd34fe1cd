use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryCompileError {
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),
    #[error("Schema inconsistency: {0}")]
    SchemaInconsistency(String),
    #[error("Unresolved variable `{0}` (bind variables before compiling)")]
    UnresolvedVariable(String),
}

impl QueryCompileError {
    /// Create a SchemaInconsistency error with context information
    pub fn schema_error_with_context(
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        let msg = message.into();
        let ctx = context.into();
        QueryCompileError::SchemaInconsistency(format!("{}\n  Context: {}", msg, ctx))
    }

    /// Create an UnsupportedPredicate error with context information
    pub fn unsupported_with_context(
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        let msg = message.into();
        let ctx = context.into();
        QueryCompileError::UnsupportedPredicate(format!("{} ({})", msg, ctx))
    }
}

pub type CompileResult<T> = Result<T, QueryCompileError>;
