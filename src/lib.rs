//! Entity SQL Query - object-query predicates compiled to SQL
//!
//! Entities live in one entity table (pk, identity, physical type id); every
//! attribute lives in its own attribute table keyed by entity pk. This crate
//! compiles a boolean predicate tree over such entities into one parameterised
//! SQL statement:
//! - Attribute and association path traversal into joins
//! - Negation handled by polarity (join style and operator tables, De Morgan)
//! - Collection quantifiers (contains, contains-all via relational division)
//! - Ordering, pagination and count queries
//! - YAML schema catalog and environment/YAML configuration

pub mod config;
pub mod query_compiler;
pub mod query_model;
pub mod render_sql;
pub mod schema_catalog;

pub use config::CompilerConfig;
pub use query_compiler::{
    compile_count, compile_query, CompileContext, CompiledQuery, QueryCompileError, QueryRequest,
};
pub use schema_catalog::{EntitySchema, SchemaMetadata};
