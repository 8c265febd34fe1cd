//! Object-query model consumed by the compiler: qualified attribute names,
//! path references, the boolean expression tree, literal values and sort specs.

pub mod expression;
pub mod qualified_name;
pub mod reference;
pub mod value;

pub use expression::{
    BooleanExpression, ComparisonOperator, OrderBySpec, PredicateKind, SortDirection,
    ValueExpression,
};
pub use qualified_name::QualifiedName;
pub use reference::{AssociationKind, AssociationReference, PropertyReference, PropertyTraversal};
pub use value::{SqlType, Value};
