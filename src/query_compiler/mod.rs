//! Object-query predicate to SQL compiler.
//!
//! Entry points are [`compile_query`] and [`compile_count`]. A compile call
//! reads the schema through [`SchemaMetadata`] and the table layout through
//! [`CompilerConfig`], and owns its alias counter; nothing is shared between
//! calls.

pub mod assembler;
pub mod errors;
pub mod operator_table;
pub mod order_by;
pub mod path_traversal;
pub mod predicate_translator;
mod quantifier;

#[cfg(test)]
mod tests;

pub use assembler::{compile_count, compile_query, CompiledQuery};
pub use errors::{CompileResult, QueryCompileError};
pub use path_traversal::TableAliasCounter;

use crate::config::CompilerConfig;
use crate::query_model::{BooleanExpression, OrderBySpec};
use crate::schema_catalog::SchemaMetadata;

/// Schema and table layout a compile call reads from.
#[derive(Clone, Copy)]
pub struct CompileContext<'a> {
    pub schema: &'a dyn SchemaMetadata,
    pub config: &'a CompilerConfig,
}

impl<'a> CompileContext<'a> {
    pub fn new(schema: &'a dyn SchemaMetadata, config: &'a CompilerConfig) -> Self {
        CompileContext { schema, config }
    }
}

/// What to select: entities of `result_type` matching `predicate`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub result_type: String,
    pub predicate: Option<BooleanExpression>,
    pub order_by: Vec<OrderBySpec>,
    /// Rows to skip
    pub first_result: Option<u64>,
    pub max_results: Option<u64>,
}

impl QueryRequest {
    pub fn new(result_type: impl Into<String>) -> Self {
        QueryRequest {
            result_type: result_type.into(),
            predicate: None,
            order_by: Vec::new(),
            first_result: None,
            max_results: None,
        }
    }

    pub fn with_predicate(mut self, predicate: BooleanExpression) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn order_by(mut self, spec: OrderBySpec) -> Self {
        self.order_by.push(spec);
        self
    }

    pub fn first_result(mut self, first: u64) -> Self {
        self.first_result = Some(first);
        self
    }

    pub fn max_results(mut self, max: u64) -> Self {
        self.max_results = Some(max);
        self
    }
}
