//! Path Traversal
//!
//! Turns property and association reference chains into attribute-table joins.
//!
//! Join keys:
//! - first property hop: `attr.entity_pk = <owner entity pk>`
//! - nested value-object hop: `child.entity_pk = parent.entity_pk AND
//!   child.<parent_join_column> = parent.<child_join_column>`
//! - association hop: `assoc.entity_pk = <owner entity pk>`, where the owner of
//!   every hop after the first is the previous hop's referenced pk (its value column)
//! - final referenced entity: `entities.entity_pk = assoc.<value column>`
//!
//! The identity pseudo-attribute is never joined; it is read from the entity
//! table of its owner.

use super::errors::{CompileResult, QueryCompileError};
use super::CompileContext;
use crate::query_model::{AssociationKind, AssociationReference, PropertyReference, QualifiedName};
use crate::render_sql::{qualified_column, Join, JoinType};
use crate::schema_catalog::AttributeInfo;

/// Table alias source for one compiled statement.
///
/// Aliases are handed out in traversal order and never reused.
#[derive(Debug, Default)]
pub struct TableAliasCounter {
    next: usize,
}

impl TableAliasCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_alias(&mut self) -> String {
        let alias = format!("t{}", self.next);
        self.next += 1;
        alias
    }

    /// Number of aliases handed out so far.
    pub fn issued(&self) -> usize {
        self.next
    }
}

/// Where an association chain ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationTarget {
    /// Alias of the last association table
    pub association_alias: String,
    /// Alias of the referenced entity table, when it was requested
    pub entity_alias: Option<String>,
    /// Column holding the referenced entity pk
    pub reference_column: String,
}

/// Where the value of a property lives after traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTarget {
    pub table_alias: String,
    /// Fully qualified value column (`t3.qname_value`, `t0.entity_identity`)
    pub value_column: String,
    /// `None` for the identity pseudo-attribute
    pub attribute: Option<AttributeInfo>,
    pub name: QualifiedName,
}

impl PropertyTarget {
    pub fn is_collection(&self) -> bool {
        self.attribute
            .as_ref()
            .map(AttributeInfo::is_collection)
            .unwrap_or(false)
    }
}

pub(crate) fn lookup_attribute<'c>(
    ctx: &'c CompileContext<'_>,
    name: &QualifiedName,
) -> CompileResult<&'c AttributeInfo> {
    ctx.schema.attribute_info(name).ok_or_else(|| {
        QueryCompileError::schema_error_with_context(
            format!("no attribute table mapped for `{}`", name),
            "while resolving a reference path",
        )
    })
}

/// True when a hop before the last one can match several rows per root
/// entity. Join style alone cannot negate a leaf over such a path.
pub fn association_path_fans_out(association: &AssociationReference) -> bool {
    let hops = association.chain();
    match hops.split_last() {
        Some((_, before)) => before.iter().any(|hop| hop.kind == AssociationKind::Many),
        None => false,
    }
}

/// Like [`association_path_fans_out`], for the hops leading to a property
/// value: any many-association, or any collection hop above the last one.
pub fn property_path_fans_out(
    ctx: &CompileContext<'_>,
    property: &PropertyReference,
) -> CompileResult<bool> {
    let (hops, association) = property.chain();
    if let Some(association) = association {
        if association
            .chain()
            .iter()
            .any(|hop| hop.kind == AssociationKind::Many)
        {
            return Ok(true);
        }
    }
    let before_last = match hops.split_last() {
        Some((_, before)) => before,
        None => return Ok(false),
    };
    for hop in before_last {
        if !hop.name.is_identity() && lookup_attribute(ctx, &hop.name)?.is_collection() {
            return Ok(true);
        }
    }
    Ok(false)
}

fn check_depth(ctx: &CompileContext<'_>, depth: usize, path: &dyn std::fmt::Display) -> CompileResult<()> {
    if depth > ctx.config.max_path_depth as usize {
        return Err(QueryCompileError::schema_error_with_context(
            format!(
                "reference path `{}` has {} hops, more than the allowed {}",
                path, depth, ctx.config.max_path_depth
            ),
            "possible cyclic path declaration",
        ));
    }
    Ok(())
}

/// Join every association hop from `root_alias` to `association`.
///
/// When `include_final_entity_table` is set, the entity referenced by the
/// last hop is joined as well so its identity can be compared.
pub fn traverse_association_path(
    ctx: &CompileContext<'_>,
    association: &AssociationReference,
    root_alias: &str,
    counter: &mut TableAliasCounter,
    join_style: JoinType,
    include_final_entity_table: bool,
    joins: &mut Vec<Join>,
) -> CompileResult<AssociationTarget> {
    let hops = association.chain();
    check_depth(ctx, hops.len(), association)?;

    let config = ctx.config;
    let mut owner_pk = qualified_column(root_alias, &config.entity_pk_column);
    let mut last_alias = root_alias.to_string();

    for hop in hops {
        let info = lookup_attribute(ctx, &hop.name)?;
        let alias = counter.next_alias();
        joins.push(Join {
            table_name: config.qualified_table(&info.table_name),
            table_alias: alias.clone(),
            join_type: join_style,
            joining_on: vec![format!(
                "{} = {}",
                qualified_column(&alias, &config.attribute_entity_pk_column),
                owner_pk
            )],
        });
        log::debug!("association hop {} -> {} as {}", hop.name, info.table_name, alias);
        owner_pk = qualified_column(&alias, &config.attribute_value_column);
        last_alias = alias;
    }

    let entity_alias = if include_final_entity_table {
        let alias = counter.next_alias();
        joins.push(Join {
            table_name: config.qualified_table(&config.entity_table),
            table_alias: alias.clone(),
            join_type: join_style,
            joining_on: vec![format!(
                "{} = {}",
                qualified_column(&alias, &config.entity_pk_column),
                owner_pk
            )],
        });
        Some(alias)
    } else {
        None
    };

    Ok(AssociationTarget {
        association_alias: last_alias,
        entity_alias,
        reference_column: owner_pk,
    })
}

/// Join every hop needed to reach the value of `property`.
pub fn traverse_property_path(
    ctx: &CompileContext<'_>,
    property: &PropertyReference,
    root_alias: &str,
    counter: &mut TableAliasCounter,
    join_style: JoinType,
    joins: &mut Vec<Join>,
) -> CompileResult<PropertyTarget> {
    let (hops, association) = property.chain();
    let association_depth = association.map(|a| a.chain().len()).unwrap_or(0);
    check_depth(ctx, hops.len() + association_depth, property)?;

    let config = ctx.config;

    if let Some(position) = hops.iter().position(|h| h.name.is_identity()) {
        if position != 0 || hops.len() != 1 {
            return Err(QueryCompileError::unsupported_with_context(
                "identity can only be read directly from an entity",
                property.to_string(),
            ));
        }
        let entity_alias = match association {
            Some(association) => {
                let target = traverse_association_path(
                    ctx,
                    association,
                    root_alias,
                    counter,
                    join_style,
                    true,
                    joins,
                )?;
                target.entity_alias.unwrap_or_else(|| root_alias.to_string())
            }
            None => root_alias.to_string(),
        };
        return Ok(PropertyTarget {
            value_column: qualified_column(&entity_alias, &config.entity_identity_column),
            table_alias: entity_alias,
            attribute: None,
            name: property.name.clone(),
        });
    }

    let owner_pk = match association {
        Some(association) => {
            traverse_association_path(
                ctx,
                association,
                root_alias,
                counter,
                join_style,
                false,
                joins,
            )?
            .reference_column
        }
        None => qualified_column(root_alias, &config.entity_pk_column),
    };

    let mut parent: Option<(String, &AttributeInfo)> = None;
    for hop in &hops {
        let info = lookup_attribute(ctx, &hop.name)?;
        let alias = counter.next_alias();
        let entity_pk = qualified_column(&alias, &config.attribute_entity_pk_column);
        let joining_on = match &parent {
            None => vec![format!("{} = {}", entity_pk, owner_pk)],
            Some((parent_alias, parent_info)) => vec![
                format!(
                    "{} = {}",
                    entity_pk,
                    qualified_column(parent_alias, &config.attribute_entity_pk_column)
                ),
                format!(
                    "{} = {}",
                    qualified_column(&alias, &info.parent_join_column),
                    qualified_column(parent_alias, &parent_info.child_join_column)
                ),
            ],
        };
        joins.push(Join {
            table_name: config.qualified_table(&info.table_name),
            table_alias: alias.clone(),
            join_type: join_style,
            joining_on,
        });
        log::debug!("property hop {} -> {} as {}", hop.name, info.table_name, alias);
        parent = Some((alias, info));
    }

    match parent {
        Some((alias, info)) => Ok(PropertyTarget {
            value_column: qualified_column(&alias, &config.attribute_value_column),
            table_alias: alias,
            attribute: Some(info.clone()),
            name: property.name.clone(),
        }),
        None => Err(QueryCompileError::UnsupportedPredicate(format!(
            "empty property path `{}`",
            property
        ))),
    }
}
