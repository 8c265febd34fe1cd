use std::collections::HashSet;

use super::errors::{CompileResult, QueryCompileError};
use super::path_traversal::{property_path_fans_out, traverse_property_path, TableAliasCounter};
use super::CompileContext;
use crate::query_model::{OrderBySpec, PropertyReference, SortDirection};
use crate::render_sql::{qualified_column, JoinType, OrderByItem, OrderByOrder, SelectStatement};

/// Add ORDER BY items (and the LEFT JOINs that reach the sort values) to the
/// outer statement rooted at `root_alias`.
///
/// Sort values must be single-valued per root entity: paths through a
/// many-association or a collection are rejected.
///
/// Only the first spec per property counts. Sort columns are appended to the
/// select list since `SELECT DISTINCT` needs them there. With no usable spec
/// and pagination requested, rows are ordered by identity so pages are stable.
pub fn compile_order_by(
    ctx: &CompileContext<'_>,
    specs: &[OrderBySpec],
    root_alias: &str,
    paginated: bool,
    counter: &mut TableAliasCounter,
    select: &mut SelectStatement,
) -> CompileResult<()> {
    let mut seen: HashSet<&PropertyReference> = HashSet::new();

    for spec in specs {
        if !seen.insert(&spec.property) {
            log::warn!("ignoring repeated order-by on `{}`", spec.property);
            continue;
        }
        if property_path_fans_out(ctx, &spec.property)? {
            return Err(QueryCompileError::unsupported_with_context(
                format!("cannot order by multi-valued path `{}`", spec.property),
                "order by a property reached through single-valued hops",
            ));
        }
        let target = traverse_property_path(
            ctx,
            &spec.property,
            root_alias,
            counter,
            JoinType::Left,
            &mut select.joins,
        )?;
        if target.is_collection() {
            return Err(QueryCompileError::unsupported_with_context(
                format!("cannot order by collection property `{}`", spec.property),
                "order by a scalar property",
            ));
        }
        push_order(select, target.value_column, spec.direction);
    }

    if select.order_by.is_empty() && paginated {
        log::debug!("paginated query without order, ordering by identity");
        let identity = qualified_column(root_alias, &ctx.config.entity_identity_column);
        push_order(select, identity, SortDirection::Ascending);
    }
    Ok(())
}

fn push_order(select: &mut SelectStatement, expression: String, direction: SortDirection) {
    if !select.select.contains(&expression) {
        select.select.push(expression.clone());
    }
    let order = match direction {
        SortDirection::Ascending => OrderByOrder::Asc,
        SortDirection::Descending => OrderByOrder::Desc,
    };
    select.order_by.push(OrderByItem { expression, order });
}
