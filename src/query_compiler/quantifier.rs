//! Collection quantifiers: Contains and ContainsAll.
//!
//! Collection elements live in the attribute table of the collection property,
//! one row per element, with a `collection_path` ltree locating the element
//! below the `top` label. Value-object elements keep their fields in child
//! attribute tables that hang off the element row.

use super::errors::{CompileResult, QueryCompileError};
use super::operator_table::join_style_for;
use super::path_traversal::{lookup_attribute, traverse_property_path, PropertyTarget, TableAliasCounter};
use super::predicate_translator::PredicateTranslator;
use crate::query_model::{PredicateKind, PropertyReference, QualifiedName, Value, ValueExpression};
use crate::render_sql::{qualified_column, Condition, Join, JoinType, SelectStatement, SetQuery};
use crate::schema_catalog::AttributeInfo;

/// Child joins already emitted for one collection sub-select, keyed by
/// (parent attribute, child attribute).
#[derive(Debug, Default)]
struct ChildJoins {
    aliases: Vec<((QualifiedName, QualifiedName), String)>,
}

impl ChildJoins {
    fn get(&self, parent: &QualifiedName, child: &QualifiedName) -> Option<&str> {
        self.aliases
            .iter()
            .find(|((p, c), _)| p == parent && c == child)
            .map(|(_, alias)| alias.as_str())
    }
}

/// The table an element (or nested value object) is read from.
struct ElementSource<'s> {
    alias: String,
    name: QualifiedName,
    info: &'s AttributeInfo,
}

impl<'a> PredicateTranslator<'a> {
    pub(super) fn compile_contains(
        &self,
        property: &PropertyReference,
        value: &ValueExpression,
        negation_active: bool,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<SetQuery> {
        let element = self.literal(value)?;
        if let Value::Collection(_) = element {
            return Err(QueryCompileError::unsupported_with_context(
                format!("contains on `{}` with a nested collection element", property),
                "use contains-all",
            ));
        }

        let (mut select, target) = self.collection_select(PredicateKind::Contains, property, counter)?;
        let info = self.collection_info(&target, property)?;
        let source = ElementSource {
            alias: target.table_alias.clone(),
            name: target.name.clone(),
            info,
        };
        let mut child_joins = ChildJoins::default();
        let condition =
            self.element_condition(&source, element, &mut select.joins, &mut child_joins, counter)?;
        select.filters.push(condition);
        let positive = SetQuery::select(select);

        if negation_active {
            Ok(self.complement(positive, counter))
        } else {
            Ok(positive)
        }
    }

    pub(super) fn compile_contains_all(
        &self,
        property: &PropertyReference,
        values: &ValueExpression,
        negation_active: bool,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<Option<SetQuery>> {
        let values = self.literal(values)?;
        let Value::Collection(items) = values else {
            return Err(QueryCompileError::UnsupportedPredicate(format!(
                "contains-all on `{}` needs a collection, got {}",
                property,
                values.kind_name()
            )));
        };

        let mut elements: Vec<&Value> = Vec::new();
        flatten_elements(items, &mut elements);
        let mut distinct: Vec<&Value> = Vec::with_capacity(elements.len());
        for element in elements {
            let mut seen = false;
            for kept in &distinct {
                if self.bound_equal(kept, element)? {
                    seen = true;
                    break;
                }
            }
            if !seen {
                distinct.push(element);
            }
        }

        if distinct.is_empty() {
            log::debug!("contains-all on `{}` with no elements is vacuous", property);
            return Ok(if negation_active {
                Some(self.empty_selection(counter))
            } else {
                None
            });
        }

        let (mut select, target) =
            self.collection_select(PredicateKind::ContainsAll, property, counter)?;
        let info = self.collection_info(&target, property)?;
        let source = ElementSource {
            alias: target.table_alias.clone(),
            name: target.name.clone(),
            info,
        };
        let mut child_joins = ChildJoins::default();
        let mut conditions = Vec::with_capacity(distinct.len());
        for element in &distinct {
            conditions.push(self.element_condition(
                &source,
                element,
                &mut select.joins,
                &mut child_joins,
                counter,
            )?);
        }

        let config = self.ctx.config;
        let root = select.from_alias.clone();
        select.group_by = vec![
            qualified_column(&root, &config.entity_pk_column),
            qualified_column(&root, &config.entity_identity_column),
        ];

        // Plain values count themselves; nulls and value objects count the
        // index of the element they matched.
        let count_values = distinct
            .iter()
            .all(|e| e.is_scalar() && !matches!(e, Value::Null));
        let required = distinct.len();
        select.having = Some(if count_values {
            Condition::raw(format!(
                "COUNT(DISTINCT {}) >= {}",
                target.value_column, required
            ))
        } else {
            let mut whens = Vec::with_capacity(conditions.len());
            let mut parameters = Vec::new();
            for (index, condition) in conditions.iter().enumerate() {
                whens.push(format!("WHEN {} THEN {}", condition.sql, index + 1));
                parameters.extend(condition.parameters.iter().cloned());
            }
            Condition {
                sql: format!(
                    "COUNT(DISTINCT CASE {} END) >= {}",
                    whens.join(" "),
                    required
                ),
                parameters,
            }
        });
        select.filters.push(Condition::any(conditions));
        let positive = SetQuery::select(select);

        if negation_active {
            Ok(Some(self.complement(positive, counter)))
        } else {
            Ok(Some(positive))
        }
    }

    /// Whether two elements match the same collection rows once bound, so
    /// `1` and `1.0`, or an enum constant and its persisted key, count once.
    fn bound_equal(&self, a: &Value, b: &Value) -> CompileResult<bool> {
        match (a, b) {
            (Value::Null, Value::Null) => Ok(true),
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            (Value::Composite { fields: left, .. }, Value::Composite { fields: right, .. }) => {
                if left.len() != right.len() {
                    return Ok(false);
                }
                for (name, value) in left {
                    let Some((_, other)) = right.iter().find(|(n, _)| n == name) else {
                        return Ok(false);
                    };
                    if !self.bound_equal(value, other)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Composite { .. }, _) | (_, Value::Composite { .. }) => Ok(false),
            (a, b) => Ok(same_bound_value(&self.bind(a)?.value, &self.bind(b)?.value)),
        }
    }

    /// Base sub-select joined to the collection table with the positive join style.
    fn collection_select(
        &self,
        kind: PredicateKind,
        property: &PropertyReference,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<(SelectStatement, PropertyTarget)> {
        let join_style = join_style_for(kind, false)?;
        let (mut select, root) = self.base_select(counter);
        let target =
            traverse_property_path(self.ctx, property, &root, counter, join_style, &mut select.joins)?;
        Ok((select, target))
    }

    fn collection_info(
        &self,
        target: &PropertyTarget,
        property: &PropertyReference,
    ) -> CompileResult<&'a AttributeInfo> {
        let info = lookup_attribute(self.ctx, &target.name)?;
        if !info.is_collection() {
            return Err(QueryCompileError::unsupported_with_context(
                format!("`{}` is not a collection property", property),
                "use a comparison",
            ));
        }
        Ok(info)
    }

    /// Condition matching one collection row against `element`.
    fn element_condition(
        &self,
        source: &ElementSource<'_>,
        element: &Value,
        joins: &mut Vec<Join>,
        child_joins: &mut ChildJoins,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<Condition> {
        let config = self.ctx.config;
        let below_top = Condition::raw(format!(
            "{} ~ '{}'",
            qualified_column(&source.alias, &config.collection_path_column),
            config.below_top_pattern()
        ));
        let value_column = qualified_column(&source.alias, &config.attribute_value_column);

        let matched = match element {
            Value::Collection(_) => {
                return Err(QueryCompileError::UnsupportedPredicate(format!(
                    "nested collection element in `{}`",
                    source.name
                )))
            }
            Value::Composite { fields, .. } => {
                self.composite_condition(source, fields, joins, child_joins, counter)?
            }
            scalar => Some(self.scalar_condition(&value_column, scalar)?),
        };

        Ok(match matched {
            Some(matched) => Condition::all(vec![below_top, matched]),
            None => below_top,
        })
    }

    fn scalar_condition(&self, column: &str, value: &Value) -> CompileResult<Condition> {
        match value {
            Value::Null => Ok(Condition::is_null(column)),
            value => Ok(Condition::binary(column, "=", self.bind(value)?)),
        }
    }

    /// Conditions on the fields of a value object, each read from a child
    /// attribute table joined once per (parent, child) pair.
    fn composite_condition(
        &self,
        parent: &ElementSource<'_>,
        fields: &[(QualifiedName, Value)],
        joins: &mut Vec<Join>,
        child_joins: &mut ChildJoins,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<Option<Condition>> {
        let config = self.ctx.config;
        let mut conditions = Vec::with_capacity(fields.len());

        for (field, value) in fields {
            let info = lookup_attribute(self.ctx, field)?;
            if info.is_collection() || matches!(value, Value::Collection(_)) {
                return Err(QueryCompileError::unsupported_with_context(
                    format!("collection field `{}` inside a value object", field),
                    parent.name.to_string(),
                ));
            }

            let alias = match child_joins.get(&parent.name, field) {
                Some(alias) => alias.to_string(),
                None => {
                    let alias = counter.next_alias();
                    joins.push(Join {
                        table_name: config.qualified_table(&info.table_name),
                        table_alias: alias.clone(),
                        join_type: JoinType::Left,
                        joining_on: vec![
                            format!(
                                "{} = {}",
                                qualified_column(&alias, &config.attribute_entity_pk_column),
                                qualified_column(&parent.alias, &config.attribute_entity_pk_column)
                            ),
                            format!(
                                "{} = {}",
                                qualified_column(&alias, &info.parent_join_column),
                                qualified_column(&parent.alias, &parent.info.child_join_column)
                            ),
                        ],
                    });
                    child_joins
                        .aliases
                        .push(((parent.name.clone(), field.clone()), alias.clone()));
                    alias
                }
            };

            match value {
                Value::Composite { fields: nested, .. } => {
                    let source = ElementSource {
                        alias,
                        name: field.clone(),
                        info,
                    };
                    if let Some(condition) =
                        self.composite_condition(&source, nested, joins, child_joins, counter)?
                    {
                        conditions.push(condition);
                    }
                }
                scalar => conditions.push(self.scalar_condition(
                    &qualified_column(&alias, &config.attribute_value_column),
                    scalar,
                )?),
            }
        }

        Ok(if conditions.is_empty() {
            None
        } else {
            Some(Condition::all(conditions))
        })
    }
}

fn same_bound_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => *i as f64 == *f,
        _ => a == b,
    }
}

fn flatten_elements<'v>(items: &'v [Value], out: &mut Vec<&'v Value>) {
    for item in items {
        match item {
            Value::Collection(nested) => flatten_elements(nested, out),
            other => out.push(other),
        }
    }
}
