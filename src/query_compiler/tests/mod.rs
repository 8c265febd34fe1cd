//! Scenario tests for the query compiler.
//!
//! All scenarios share one catalog: `Person` is abstract with concrete
//! subtypes `Employee` (id 11) and `Customer` (id 12); `Company` has id 20.
//! `Person:friends` is a many-association, `Person:addresses` a collection
//! of `Address` value objects.

mod pagination_tests;

use super::{compile_count, compile_query, CompileContext, CompiledQuery, QueryRequest};
use crate::config::CompilerConfig;
use crate::query_compiler::errors::CompileResult;
use crate::query_model::{AssociationReference, PropertyReference, QualifiedName};
use crate::schema_catalog::{AttributeInfo, EntitySchema};

pub(super) fn catalog() -> EntitySchema {
    EntitySchema::new()
        .with_type_ids("Person", vec![11, 12])
        .with_type_ids("Employee", vec![11])
        .with_type_ids("Company", vec![20])
        .with_attribute(
            QualifiedName::new("Person", "name"),
            AttributeInfo::new("person_name", 0),
        )
        .with_attribute(
            QualifiedName::new("Person", "age"),
            AttributeInfo::new("person_age", 0),
        )
        .with_attribute(
            QualifiedName::new("Person", "nicknames"),
            AttributeInfo::new("person_nicknames", 1),
        )
        .with_attribute(
            QualifiedName::new("Employee", "employer"),
            AttributeInfo::new("employee_employer", 0),
        )
        .with_attribute(
            QualifiedName::new("Company", "name"),
            AttributeInfo::new("company_name", 0),
        )
        .with_attribute(
            QualifiedName::new("Person", "friends"),
            AttributeInfo::new("person_friends", 0),
        )
        .with_attribute(
            QualifiedName::new("Person", "addresses"),
            AttributeInfo::new("person_addresses", 1),
        )
        .with_attribute(
            QualifiedName::new("Address", "city"),
            AttributeInfo::new("address_city", 0),
        )
        .with_attribute(
            QualifiedName::new("Person", "favoriteColor"),
            AttributeInfo::new("person_favorite_color", 0),
        )
        .with_enum_key("Color", "RED", 1)
        .with_enum_key("Color", "GREEN", 2)
}

pub(super) fn person(name: &str) -> PropertyReference {
    PropertyReference::new(QualifiedName::new("Person", name))
}

pub(super) fn employer() -> AssociationReference {
    AssociationReference::single(QualifiedName::new("Employee", "employer"))
}

pub(super) fn friends() -> AssociationReference {
    AssociationReference::many(QualifiedName::new("Person", "friends"))
}

pub(super) fn compile(request: &QueryRequest) -> CompileResult<CompiledQuery> {
    let schema = catalog();
    let config = CompilerConfig::default();
    compile_query(&CompileContext::new(&schema, &config), request)
}

pub(super) fn count(request: &QueryRequest) -> CompileResult<CompiledQuery> {
    let schema = catalog();
    let config = CompilerConfig::default();
    compile_count(&CompileContext::new(&schema, &config), request)
}
