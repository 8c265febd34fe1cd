use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::reference::{AssociationReference, PropertyReference};
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// Leaf predicate kinds. Keys of the operator and join-style tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateKind {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Matches,
    PropertyIsNull,
    PropertyIsNotNull,
    AssociationIsNull,
    AssociationIsNotNull,
    ManyAssociationContains,
    Contains,
    ContainsAll,
}

impl From<ComparisonOperator> for PredicateKind {
    fn from(op: ComparisonOperator) -> Self {
        match op {
            ComparisonOperator::Eq => PredicateKind::Eq,
            ComparisonOperator::Ne => PredicateKind::Ne,
            ComparisonOperator::Gt => PredicateKind::Gt,
            ComparisonOperator::Ge => PredicateKind::Ge,
            ComparisonOperator::Lt => PredicateKind::Lt,
            ComparisonOperator::Le => PredicateKind::Le,
        }
    }
}

/// Right-hand side of a leaf predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueExpression {
    Literal(Value),
    /// Late-bound value, substituted by [`BooleanExpression::bind_variables`]
    Variable(String),
}

macro_rules! literal_from {
    ($($source:ty),*) => {
        $(
            impl From<$source> for ValueExpression {
                fn from(value: $source) -> Self {
                    ValueExpression::Literal(value.into())
                }
            }
        )*
    };
}

literal_from!(Value, &str, String, i64, f64, bool);

impl<T: Into<Value>> From<Vec<T>> for ValueExpression {
    fn from(items: Vec<T>) -> Self {
        ValueExpression::Literal(items.into())
    }
}

impl ValueExpression {
    pub fn variable(name: impl Into<String>) -> Self {
        ValueExpression::Variable(name.into())
    }

    fn bind(&self, bindings: &HashMap<String, Value>) -> ValueExpression {
        match self {
            ValueExpression::Variable(name) => match bindings.get(name) {
                Some(value) => ValueExpression::Literal(value.clone()),
                None => self.clone(),
            },
            ValueExpression::Literal(_) => self.clone(),
        }
    }
}

/// Object-query predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BooleanExpression {
    /// All operands hold; no operands is vacuously true
    Conjunction(Vec<BooleanExpression>),
    /// At least one operand holds
    Disjunction(Vec<BooleanExpression>),
    Negation(Box<BooleanExpression>),
    Comparison {
        property: PropertyReference,
        operator: ComparisonOperator,
        value: ValueExpression,
    },
    /// Regular-expression match on a textual property
    Matches {
        property: PropertyReference,
        pattern: ValueExpression,
    },
    PropertyNull {
        property: PropertyReference,
        is_null: bool,
    },
    AssociationNull {
        association: AssociationReference,
        is_null: bool,
    },
    /// The many-association contains the entity with the given identity
    ManyAssociationContains {
        association: AssociationReference,
        entity: ValueExpression,
    },
    /// The collection property contains the element
    Contains {
        property: PropertyReference,
        value: ValueExpression,
    },
    /// The collection property contains every element of the given collection
    ContainsAll {
        property: PropertyReference,
        values: ValueExpression,
    },
}

impl BooleanExpression {
    pub fn and(operands: Vec<BooleanExpression>) -> Self {
        BooleanExpression::Conjunction(operands)
    }

    pub fn or(operands: Vec<BooleanExpression>) -> Self {
        BooleanExpression::Disjunction(operands)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: BooleanExpression) -> Self {
        BooleanExpression::Negation(Box::new(operand))
    }

    pub fn compare(
        property: PropertyReference,
        operator: ComparisonOperator,
        value: impl Into<ValueExpression>,
    ) -> Self {
        BooleanExpression::Comparison {
            property,
            operator,
            value: value.into(),
        }
    }

    pub fn eq(property: PropertyReference, value: impl Into<ValueExpression>) -> Self {
        Self::compare(property, ComparisonOperator::Eq, value)
    }

    pub fn matches(property: PropertyReference, pattern: impl Into<ValueExpression>) -> Self {
        BooleanExpression::Matches {
            property,
            pattern: pattern.into(),
        }
    }

    pub fn is_null(property: PropertyReference) -> Self {
        BooleanExpression::PropertyNull {
            property,
            is_null: true,
        }
    }

    pub fn is_not_null(property: PropertyReference) -> Self {
        BooleanExpression::PropertyNull {
            property,
            is_null: false,
        }
    }

    pub fn association_is_null(association: AssociationReference) -> Self {
        BooleanExpression::AssociationNull {
            association,
            is_null: true,
        }
    }

    pub fn association_is_not_null(association: AssociationReference) -> Self {
        BooleanExpression::AssociationNull {
            association,
            is_null: false,
        }
    }

    /// `entity` is the identity of the associated entity.
    pub fn many_association_contains(
        association: AssociationReference,
        entity: impl Into<ValueExpression>,
    ) -> Self {
        BooleanExpression::ManyAssociationContains {
            association,
            entity: entity.into(),
        }
    }

    pub fn contains(property: PropertyReference, value: impl Into<ValueExpression>) -> Self {
        BooleanExpression::Contains {
            property,
            value: value.into(),
        }
    }

    pub fn contains_all(property: PropertyReference, values: impl Into<ValueExpression>) -> Self {
        BooleanExpression::ContainsAll {
            property,
            values: values.into(),
        }
    }

    /// Substitute every variable found in `bindings`. Unknown variables are
    /// left in place and rejected later by the compiler.
    pub fn bind_variables(&self, bindings: &HashMap<String, Value>) -> BooleanExpression {
        match self {
            BooleanExpression::Conjunction(operands) => BooleanExpression::Conjunction(
                operands.iter().map(|o| o.bind_variables(bindings)).collect(),
            ),
            BooleanExpression::Disjunction(operands) => BooleanExpression::Disjunction(
                operands.iter().map(|o| o.bind_variables(bindings)).collect(),
            ),
            BooleanExpression::Negation(operand) => {
                BooleanExpression::Negation(Box::new(operand.bind_variables(bindings)))
            }
            BooleanExpression::Comparison {
                property,
                operator,
                value,
            } => BooleanExpression::Comparison {
                property: property.clone(),
                operator: *operator,
                value: value.bind(bindings),
            },
            BooleanExpression::Matches { property, pattern } => BooleanExpression::Matches {
                property: property.clone(),
                pattern: pattern.bind(bindings),
            },
            BooleanExpression::ManyAssociationContains {
                association,
                entity,
            } => BooleanExpression::ManyAssociationContains {
                association: association.clone(),
                entity: entity.bind(bindings),
            },
            BooleanExpression::Contains { property, value } => BooleanExpression::Contains {
                property: property.clone(),
                value: value.bind(bindings),
            },
            BooleanExpression::ContainsAll { property, values } => {
                BooleanExpression::ContainsAll {
                    property: property.clone(),
                    values: values.bind(bindings),
                }
            }
            BooleanExpression::PropertyNull { .. } | BooleanExpression::AssociationNull { .. } => {
                self.clone()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBySpec {
    pub property: PropertyReference,
    pub direction: SortDirection,
}

impl OrderBySpec {
    pub fn ascending(property: PropertyReference) -> Self {
        OrderBySpec {
            property,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(property: PropertyReference) -> Self {
        OrderBySpec {
            property,
            direction: SortDirection::Descending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_model::QualifiedName;

    fn name() -> PropertyReference {
        PropertyReference::new(QualifiedName::new("Person", "name"))
    }

    #[test]
    fn test_bind_variables_replaces_known_only() {
        let expr = BooleanExpression::and(vec![
            BooleanExpression::eq(name(), ValueExpression::variable("who")),
            BooleanExpression::matches(name(), ValueExpression::variable("missing")),
        ]);
        let mut bindings = HashMap::new();
        bindings.insert("who".to_string(), Value::text("Bob"));

        let bound = expr.bind_variables(&bindings);
        let BooleanExpression::Conjunction(operands) = bound else {
            panic!("conjunction expected");
        };
        assert!(matches!(
            &operands[0],
            BooleanExpression::Comparison { value: ValueExpression::Literal(Value::Text(s)), .. } if s == "Bob"
        ));
        assert!(matches!(
            &operands[1],
            BooleanExpression::Matches { pattern: ValueExpression::Variable(v), .. } if v == "missing"
        ));
    }
}
