/// Predicate kind to SQL operator and join style.
///
/// Two tables per concern: one for positive context, one for a subtree under
/// an odd number of negations. Polarity correctness lives here: a negated
/// comparison must see rows with no stored value, so it gets `LEFT JOIN`; a
/// negated is-null becomes an inner join and needs no further condition.
use std::collections::HashMap;

use super::errors::{CompileResult, QueryCompileError};
use crate::query_model::PredicateKind;
use crate::render_sql::JoinType;

lazy_static::lazy_static! {
    static ref OPERATORS: HashMap<PredicateKind, &'static str> = {
        let mut m = HashMap::new();
        m.insert(PredicateKind::Eq, "=");
        m.insert(PredicateKind::Ne, "<>");
        m.insert(PredicateKind::Gt, ">");
        m.insert(PredicateKind::Ge, ">=");
        m.insert(PredicateKind::Lt, "<");
        m.insert(PredicateKind::Le, "<=");
        m.insert(PredicateKind::Matches, "~");
        m
    };

    static ref NEGATED_OPERATORS: HashMap<PredicateKind, &'static str> = {
        let mut m = HashMap::new();
        m.insert(PredicateKind::Eq, "<>");
        m.insert(PredicateKind::Ne, "=");
        m.insert(PredicateKind::Gt, "<=");
        m.insert(PredicateKind::Ge, "<");
        m.insert(PredicateKind::Lt, ">=");
        m.insert(PredicateKind::Le, ">");
        m.insert(PredicateKind::Matches, "!~");
        m
    };

    static ref JOIN_STYLES: HashMap<PredicateKind, JoinType> = {
        let mut m = HashMap::new();
        for kind in COMPARISON_KINDS {
            m.insert(kind, JoinType::Inner);
        }
        m.insert(PredicateKind::PropertyIsNull, JoinType::Left);
        m.insert(PredicateKind::PropertyIsNotNull, JoinType::Inner);
        m.insert(PredicateKind::AssociationIsNull, JoinType::Left);
        m.insert(PredicateKind::AssociationIsNotNull, JoinType::Inner);
        m.insert(PredicateKind::ManyAssociationContains, JoinType::Inner);
        m.insert(PredicateKind::Contains, JoinType::Inner);
        m.insert(PredicateKind::ContainsAll, JoinType::Inner);
        m
    };

    static ref NEGATED_JOIN_STYLES: HashMap<PredicateKind, JoinType> = {
        let mut m = HashMap::new();
        for kind in COMPARISON_KINDS {
            m.insert(kind, JoinType::Left);
        }
        m.insert(PredicateKind::PropertyIsNull, JoinType::Inner);
        m.insert(PredicateKind::PropertyIsNotNull, JoinType::Left);
        m.insert(PredicateKind::AssociationIsNull, JoinType::Inner);
        m.insert(PredicateKind::AssociationIsNotNull, JoinType::Left);
        // Containment is negated by set difference against the positive form.
        m.insert(PredicateKind::ManyAssociationContains, JoinType::Inner);
        m.insert(PredicateKind::Contains, JoinType::Inner);
        m.insert(PredicateKind::ContainsAll, JoinType::Inner);
        m
    };
}

const COMPARISON_KINDS: [PredicateKind; 7] = [
    PredicateKind::Eq,
    PredicateKind::Ne,
    PredicateKind::Gt,
    PredicateKind::Ge,
    PredicateKind::Lt,
    PredicateKind::Le,
    PredicateKind::Matches,
];

/// SQL operator for a comparison-like predicate.
pub fn operator_for(kind: PredicateKind, negation_active: bool) -> CompileResult<&'static str> {
    let table = if negation_active {
        &*NEGATED_OPERATORS
    } else {
        &*OPERATORS
    };
    table.get(&kind).copied().ok_or_else(|| {
        QueryCompileError::unsupported_with_context(
            format!("{:?} has no SQL comparison operator", kind),
            if negation_active { "negated" } else { "positive" },
        )
    })
}

/// Join style used when traversing to the attribute a predicate inspects.
pub fn join_style_for(kind: PredicateKind, negation_active: bool) -> CompileResult<JoinType> {
    let table = if negation_active {
        &*NEGATED_JOIN_STYLES
    } else {
        &*JOIN_STYLES
    };
    table.get(&kind).copied().ok_or_else(|| {
        QueryCompileError::UnsupportedPredicate(format!("{:?} has no join style", kind))
    })
}
