//! Query Assembler
//!
//! Wraps the compiled predicate in the outer statement:
//!
//! ```sql
//! SELECT DISTINCT t0.entity_pk, t0.entity_identity[, sort columns]
//! FROM entities t0 <order-by joins>
//! WHERE t0.entity_type_id IN (...)
//!   [AND (t0.entity_pk, t0.entity_identity) IN (<predicate>)]
//! ORDER BY ... LIMIT n OFFSET m
//! ```

use serde::Serialize;

use super::errors::{CompileResult, QueryCompileError};
use super::order_by::compile_order_by;
use super::path_traversal::TableAliasCounter;
use super::predicate_translator::PredicateTranslator;
use super::{CompileContext, QueryRequest};
use crate::query_model::{SqlType, Value};
use crate::render_sql::{qualified_column, BoundParameter, Condition, SelectStatement, ToSql};

/// Final SQL text with its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub parameters: Vec<Value>,
    pub parameter_types: Vec<SqlType>,
}

impl CompiledQuery {
    fn from_statement(select: &SelectStatement) -> Self {
        let (parameters, parameter_types): (Vec<Value>, Vec<SqlType>) = select
            .parameters()
            .into_iter()
            .map(|BoundParameter { value, sql_type }| (value, sql_type))
            .unzip();
        CompiledQuery {
            sql: select.to_sql(),
            parameters,
            parameter_types,
        }
    }

    /// Numeric SQL type codes, parallel to `parameters`.
    pub fn type_codes(&self) -> Vec<i32> {
        self.parameter_types.iter().map(SqlType::code).collect()
    }

    /// Pretty JSON dump for logs and debugging endpoints.
    pub fn to_diagnostic_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    Rows,
    Count,
}

/// Compile a row query: distinct `(entity pk, identity)` pairs, ordered and paginated.
pub fn compile_query(ctx: &CompileContext<'_>, request: &QueryRequest) -> CompileResult<CompiledQuery> {
    assemble(ctx, request, Projection::Rows)
}

/// Compile `SELECT COUNT(DISTINCT t0.entity_pk)` over the same restriction;
/// ordering and pagination are ignored.
pub fn compile_count(ctx: &CompileContext<'_>, request: &QueryRequest) -> CompileResult<CompiledQuery> {
    assemble(ctx, request, Projection::Count)
}

fn assemble(
    ctx: &CompileContext<'_>,
    request: &QueryRequest,
    projection: Projection,
) -> CompileResult<CompiledQuery> {
    let config = ctx.config;
    let type_ids = ctx
        .schema
        .concrete_type_ids(&request.result_type)
        .ok_or_else(|| {
            QueryCompileError::schema_error_with_context(
                format!("unknown result type `{}`", request.result_type),
                "no concrete type ids registered",
            )
        })?;
    log::debug!(
        "compiling query over `{}` (type ids {:?})",
        request.result_type,
        type_ids
    );

    let translator = PredicateTranslator::new(ctx, &type_ids);
    let mut counter = TableAliasCounter::new();
    let root = counter.next_alias();
    let pk = qualified_column(&root, &config.entity_pk_column);
    let identity = qualified_column(&root, &config.entity_identity_column);

    let mut select = SelectStatement::new(config.qualified_table(&config.entity_table), root.clone());
    select.filters.push(translator.type_filter(&root));

    if let Some(predicate) = &request.predicate {
        if let Some(restriction) = translator.compile(predicate, false, &mut counter)? {
            select.filters.push(Condition {
                sql: format!("({}, {}) IN ({})", pk, identity, restriction.to_sql()),
                parameters: restriction.parameters(),
            });
        } else {
            log::debug!("predicate is vacuous, no restriction added");
        }
    }

    match projection {
        Projection::Count => {
            select.select = vec![format!("COUNT(DISTINCT {})", pk)];
        }
        Projection::Rows => {
            select.distinct = true;
            select.select = vec![pk, identity];
            let offset = request.first_result.filter(|first| *first > 0);
            let paginated = offset.is_some() || request.max_results.is_some();
            compile_order_by(
                ctx,
                &request.order_by,
                &root,
                paginated,
                &mut counter,
                &mut select,
            )?;
            select.limit = request.max_results;
            select.offset = offset;
        }
    }

    let compiled = CompiledQuery::from_statement(&select);
    log::info!(
        "compiled {:?} query over `{}` with {} parameter(s) and {} table alias(es)",
        projection,
        request.result_type,
        compiled.parameters.len(),
        counter.issued()
    );
    log::debug!("SQL: {}", compiled.sql);
    Ok(compiled)
}
