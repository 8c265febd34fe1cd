//! Predicate Translator
//!
//! Compiles a [`BooleanExpression`] into a [`SetQuery`] of `(entity pk, identity)`
//! rows. Every leaf becomes an independently aliased sub-select over the entity
//! table; connectives become set operations.
//!
//! A negated leaf whose path fans out (a many-association or a collection
//! above the last hop) compiles as the complement of its positive form.
//!
//! A `None` result is vacuous: it stands for every entity of the result type
//! and the caller adds no restriction.

use super::errors::{CompileResult, QueryCompileError};
use super::operator_table::{join_style_for, operator_for};
use super::path_traversal::{
    association_path_fans_out, property_path_fans_out, traverse_association_path,
    traverse_property_path, PropertyTarget, TableAliasCounter,
};
use super::CompileContext;
use crate::query_model::{
    AssociationReference, BooleanExpression, ComparisonOperator, PredicateKind,
    PropertyReference, Value, ValueExpression,
};
use crate::render_sql::{
    qualified_column, BoundParameter, Condition, SelectStatement, SetOperator, SetQuery,
};

pub struct PredicateTranslator<'a> {
    pub(super) ctx: &'a CompileContext<'a>,
    pub(super) type_ids: &'a [i32],
}

impl<'a> PredicateTranslator<'a> {
    pub fn new(ctx: &'a CompileContext<'a>, type_ids: &'a [i32]) -> Self {
        PredicateTranslator { ctx, type_ids }
    }

    /// `<alias>.entity_type_id IN (<ids>)`, or a false condition when the
    /// type has no concrete implementation.
    pub fn type_filter(&self, alias: &str) -> Condition {
        if self.type_ids.is_empty() {
            return Condition::raw("1 = 0");
        }
        let ids: Vec<String> = self.type_ids.iter().map(|id| id.to_string()).collect();
        Condition::raw(format!(
            "{} IN ({})",
            qualified_column(alias, &self.ctx.config.entity_type_id_column),
            ids.join(", ")
        ))
    }

    /// `SELECT DISTINCT tN.pk, tN.identity FROM entities tN WHERE <type filter>`
    pub fn base_select(&self, counter: &mut TableAliasCounter) -> (SelectStatement, String) {
        let config = self.ctx.config;
        let alias = counter.next_alias();
        let mut select =
            SelectStatement::new(config.qualified_table(&config.entity_table), alias.clone());
        select.distinct = true;
        select.select = vec![
            qualified_column(&alias, &config.entity_pk_column),
            qualified_column(&alias, &config.entity_identity_column),
        ];
        select.filters.push(self.type_filter(&alias));
        (select, alias)
    }

    /// A selection that matches nothing; the complement of a vacuous subtree.
    pub fn empty_selection(&self, counter: &mut TableAliasCounter) -> SetQuery {
        let (mut select, _) = self.base_select(counter);
        select.filters.push(Condition::raw("1 = 0"));
        SetQuery::select(select)
    }

    /// `(every entity of the type) EXCEPT (positive)`
    pub fn complement(&self, positive: SetQuery, counter: &mut TableAliasCounter) -> SetQuery {
        let (everything, _) = self.base_select(counter);
        SetQuery::compound(SetOperator::Except, SetQuery::select(everything), positive)
    }

    pub fn compile(
        &self,
        expr: &BooleanExpression,
        negation_active: bool,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<Option<SetQuery>> {
        match expr {
            BooleanExpression::Conjunction(operands) => {
                self.compile_connective(operands, true, negation_active, counter)
            }
            BooleanExpression::Disjunction(operands) => {
                self.compile_connective(operands, false, negation_active, counter)
            }
            BooleanExpression::Negation(operand) => self.compile(operand, !negation_active, counter),
            BooleanExpression::Comparison {
                property,
                operator,
                value,
            } => self
                .compile_comparison(property, *operator, value, negation_active, counter)
                .map(Some),
            BooleanExpression::Matches { property, pattern } => self
                .compile_matches(property, pattern, negation_active, counter)
                .map(Some),
            BooleanExpression::PropertyNull { property, is_null } => self
                .compile_property_null(property, *is_null, negation_active, counter)
                .map(Some),
            BooleanExpression::AssociationNull {
                association,
                is_null,
            } => self
                .compile_association_null(association, *is_null, negation_active, counter)
                .map(Some),
            BooleanExpression::ManyAssociationContains {
                association,
                entity,
            } => self
                .compile_many_association_contains(association, entity, negation_active, counter)
                .map(Some),
            BooleanExpression::Contains { property, value } => self
                .compile_contains(property, value, negation_active, counter)
                .map(Some),
            BooleanExpression::ContainsAll { property, values } => {
                self.compile_contains_all(property, values, negation_active, counter)
            }
        }
    }

    fn compile_connective(
        &self,
        operands: &[BooleanExpression],
        is_conjunction: bool,
        negation_active: bool,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<Option<SetQuery>> {
        // De Morgan: under negation AND complements to a union and OR to an intersection.
        let operator = if is_conjunction != negation_active {
            SetOperator::Intersect
        } else {
            SetOperator::Union
        };
        log::debug!(
            "compiling {} operands as {} (negated: {})",
            operands.len(),
            operator.keyword(),
            negation_active
        );

        let mut compiled = Vec::with_capacity(operands.len());
        for operand in operands {
            compiled.push(self.compile(operand, negation_active, counter)?);
        }

        let parts: Vec<SetQuery> = match operator {
            SetOperator::Intersect => compiled.into_iter().flatten().collect(),
            _ => {
                if compiled.iter().any(Option::is_none) {
                    return Ok(None);
                }
                compiled.into_iter().flatten().collect()
            }
        };

        if parts.is_empty() {
            return Ok(match operator {
                SetOperator::Intersect => None,
                _ => Some(self.empty_selection(counter)),
            });
        }

        Ok(parts
            .into_iter()
            .reduce(|left, right| SetQuery::compound(operator, left, right)))
    }

    /// Resolve a literal scalar and bind it; enum constants bind their persisted key.
    pub fn bind(&self, value: &Value) -> CompileResult<BoundParameter> {
        if !value.is_scalar() {
            return Err(QueryCompileError::UnsupportedPredicate(format!(
                "a {} cannot be bound to a single parameter",
                value.kind_name()
            )));
        }
        let sql_type = self.ctx.schema.sql_type_of(value).ok_or_else(|| {
            QueryCompileError::SchemaInconsistency(format!(
                "no SQL type known for {} value",
                value.kind_name()
            ))
        })?;
        let value = match value {
            Value::Enum { enum_type, variant } => {
                let key = self.ctx.schema.enum_key(enum_type, variant).ok_or_else(|| {
                    QueryCompileError::schema_error_with_context(
                        format!("no persisted key for {}.{}", enum_type, variant),
                        "while binding an enum constant",
                    )
                })?;
                Value::Int(key)
            }
            other => other.clone(),
        };
        Ok(BoundParameter { value, sql_type })
    }

    pub fn literal<'v>(&self, expr: &'v ValueExpression) -> CompileResult<&'v Value> {
        match expr {
            ValueExpression::Literal(value) => Ok(value),
            ValueExpression::Variable(name) => {
                Err(QueryCompileError::UnresolvedVariable(name.clone()))
            }
        }
    }

    fn scalar_target(
        &self,
        kind: PredicateKind,
        property: &PropertyReference,
        negation_active: bool,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<(SelectStatement, PropertyTarget)> {
        let join_style = join_style_for(kind, negation_active)?;
        let (mut select, root) = self.base_select(counter);
        let target =
            traverse_property_path(self.ctx, property, &root, counter, join_style, &mut select.joins)?;
        if target.is_collection() {
            return Err(QueryCompileError::unsupported_with_context(
                format!("{:?} on collection property `{}`", kind, property),
                "use contains or contains-all",
            ));
        }
        Ok((select, target))
    }

    fn compare_condition(
        &self,
        kind: PredicateKind,
        column: &str,
        parameter: BoundParameter,
        negation_active: bool,
    ) -> CompileResult<Condition> {
        let operator = operator_for(kind, negation_active)?;
        let comparison = Condition::binary(column, operator, parameter);
        if negation_active {
            Ok(Condition::any(vec![Condition::is_null(column), comparison]))
        } else {
            Ok(comparison)
        }
    }

    fn compile_comparison(
        &self,
        property: &PropertyReference,
        operator: ComparisonOperator,
        value: &ValueExpression,
        negation_active: bool,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<SetQuery> {
        if negation_active && property_path_fans_out(self.ctx, property)? {
            let positive = self.compile_comparison(property, operator, value, false, counter)?;
            return Ok(self.complement(positive, counter));
        }
        let kind = PredicateKind::from(operator);
        let value = self.literal(value)?;
        if matches!(value, Value::Null) {
            return Err(QueryCompileError::unsupported_with_context(
                format!("comparison of `{}` against null", property),
                "use is-null or is-not-null",
            ));
        }
        let parameter = self.bind(value)?;
        let (mut select, target) = self.scalar_target(kind, property, negation_active, counter)?;
        select.filters.push(self.compare_condition(
            kind,
            &target.value_column,
            parameter,
            negation_active,
        )?);
        Ok(SetQuery::select(select))
    }

    fn compile_matches(
        &self,
        property: &PropertyReference,
        pattern: &ValueExpression,
        negation_active: bool,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<SetQuery> {
        if negation_active && property_path_fans_out(self.ctx, property)? {
            let positive = self.compile_matches(property, pattern, false, counter)?;
            return Ok(self.complement(positive, counter));
        }
        let pattern = self.literal(pattern)?;
        if !matches!(pattern, Value::Text(_)) {
            return Err(QueryCompileError::UnsupportedPredicate(format!(
                "matches on `{}` needs a text pattern, got {}",
                property,
                pattern.kind_name()
            )));
        }
        let parameter = self.bind(pattern)?;
        let kind = PredicateKind::Matches;
        let (mut select, target) = self.scalar_target(kind, property, negation_active, counter)?;
        select.filters.push(self.compare_condition(
            kind,
            &target.value_column,
            parameter,
            negation_active,
        )?);
        Ok(SetQuery::select(select))
    }

    fn compile_property_null(
        &self,
        property: &PropertyReference,
        is_null: bool,
        negation_active: bool,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<SetQuery> {
        if negation_active && property_path_fans_out(self.ctx, property)? {
            let positive = self.compile_property_null(property, is_null, false, counter)?;
            return Ok(self.complement(positive, counter));
        }
        let kind = if is_null {
            PredicateKind::PropertyIsNull
        } else {
            PredicateKind::PropertyIsNotNull
        };
        let join_style = join_style_for(kind, negation_active)?;
        let (mut select, root) = self.base_select(counter);
        let target =
            traverse_property_path(self.ctx, property, &root, counter, join_style, &mut select.joins)?;
        if is_null != negation_active {
            select.filters.push(Condition::is_null(&target.value_column));
        }
        Ok(SetQuery::select(select))
    }

    fn compile_association_null(
        &self,
        association: &AssociationReference,
        is_null: bool,
        negation_active: bool,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<SetQuery> {
        if negation_active && association_path_fans_out(association) {
            let positive = self.compile_association_null(association, is_null, false, counter)?;
            return Ok(self.complement(positive, counter));
        }
        let kind = if is_null {
            PredicateKind::AssociationIsNull
        } else {
            PredicateKind::AssociationIsNotNull
        };
        let join_style = join_style_for(kind, negation_active)?;
        let (mut select, root) = self.base_select(counter);
        let target = traverse_association_path(
            self.ctx,
            association,
            &root,
            counter,
            join_style,
            false,
            &mut select.joins,
        )?;
        if is_null != negation_active {
            select.filters.push(Condition::is_null(&target.reference_column));
        }
        Ok(SetQuery::select(select))
    }

    fn compile_many_association_contains(
        &self,
        association: &AssociationReference,
        entity: &ValueExpression,
        negation_active: bool,
        counter: &mut TableAliasCounter,
    ) -> CompileResult<SetQuery> {
        let identity = self.literal(entity)?;
        if !matches!(identity, Value::Text(_)) {
            return Err(QueryCompileError::UnsupportedPredicate(format!(
                "`{}` contains needs an entity identity, got {}",
                association,
                identity.kind_name()
            )));
        }
        let parameter = self.bind(identity)?;
        let join_style = join_style_for(PredicateKind::ManyAssociationContains, negation_active)?;

        let (mut select, root) = self.base_select(counter);
        let target = traverse_association_path(
            self.ctx,
            association,
            &root,
            counter,
            join_style,
            true,
            &mut select.joins,
        )?;
        let entity_alias = target
            .entity_alias
            .unwrap_or_else(|| target.association_alias.clone());
        select.filters.push(Condition::binary(
            &qualified_column(&entity_alias, &self.ctx.config.entity_identity_column),
            "=",
            parameter,
        ));
        let positive = SetQuery::select(select);

        if negation_active {
            Ok(self.complement(positive, counter))
        } else {
            Ok(positive)
        }
    }
}
