use entity_sql_query::query_model::{
    AssociationReference, BooleanExpression, OrderBySpec, PropertyReference, QualifiedName,
    SqlType, Value,
};
use entity_sql_query::{compile_count, compile_query, CompileContext, QueryCompileError, QueryRequest};

use super::{default_config, init_logging, store_schema};

fn person(name: &str) -> PropertyReference {
    PropertyReference::new(QualifiedName::new("Person", name))
}

fn address(city: &str, zip: &str) -> Value {
    Value::Composite {
        type_name: "Address".to_string(),
        fields: vec![
            (QualifiedName::new("Address", "city"), Value::text(city)),
            (QualifiedName::new("Address", "zip"), Value::text(zip)),
        ],
    }
}

#[test]
fn test_contains_composite_uses_catalog_join_columns() -> anyhow::Result<()> {
    init_logging();
    let schema = store_schema();
    let config = default_config();
    let request = QueryRequest::new("Person")
        .with_predicate(BooleanExpression::contains(person("addresses"), address("Oslo", "0150")));
    let compiled = compile_query(&CompileContext::new(&schema, &config), &request)?;

    assert!(compiled.sql.contains(
        "JOIN person_addresses t2 ON t2.entity_pk = t1.entity_pk \
         LEFT JOIN address_city t3 ON t3.entity_pk = t2.entity_pk AND t3.address_ref = t2.address_id \
         LEFT JOIN address_zip t4 ON t4.entity_pk = t2.entity_pk AND t4.address_ref = t2.address_id"
    ));
    assert!(compiled.sql.contains(
        "(t2.collection_path ~ 'top.*{1,}' AND (t3.qname_value = ? AND t4.qname_value = ?))"
    ));
    assert_eq!(
        compiled.parameters,
        vec![Value::text("Oslo"), Value::text("0150")]
    );
    Ok(())
}

#[test]
fn test_contains_all_is_relational_division() -> anyhow::Result<()> {
    let schema = store_schema();
    let config = default_config();
    let request = QueryRequest::new("Person").with_predicate(BooleanExpression::contains_all(
        person("nicknames"),
        vec!["Al", "Ally", "Alice"],
    ));
    let compiled = compile_query(&CompileContext::new(&schema, &config), &request)?;

    assert!(compiled.sql.contains(
        "GROUP BY t1.entity_pk, t1.entity_identity HAVING COUNT(DISTINCT t2.qname_value) >= 3"
    ));
    assert_eq!(compiled.parameters.len(), 3);
    assert!(compiled.parameter_types.iter().all(|t| *t == SqlType::Varchar));
    Ok(())
}

#[test]
fn test_many_association_contains_by_identity() -> anyhow::Result<()> {
    let schema = store_schema();
    let config = default_config();
    let employees = AssociationReference::many(QualifiedName::new("Company", "employees"));
    let request = QueryRequest::new("Company")
        .with_predicate(BooleanExpression::many_association_contains(employees, "emp-42"));
    let compiled = compile_query(&CompileContext::new(&schema, &config), &request)?;

    assert!(compiled.sql.contains(
        "FROM entities t1 \
         JOIN company_employees t2 ON t2.entity_pk = t1.entity_pk \
         JOIN entities t3 ON t3.entity_pk = t2.qname_value \
         WHERE t1.entity_type_id IN (20) AND t3.entity_identity = ?"
    ));
    assert_eq!(compiled.parameters, vec![Value::text("emp-42")]);
    Ok(())
}

#[test]
fn test_employer_identity_and_status_enum() -> anyhow::Result<()> {
    let schema = store_schema();
    let config = default_config();
    let employer = AssociationReference::single(QualifiedName::new("Employee", "employer"));
    let predicate = BooleanExpression::and(vec![
        BooleanExpression::eq(PropertyReference::identity().through_association(employer), "acme"),
        BooleanExpression::eq(person("status"), Value::enum_constant("Status", "ACTIVE")),
    ]);
    let request = QueryRequest::new("Employee")
        .with_predicate(predicate)
        .order_by(OrderBySpec::ascending(person("name")))
        .max_results(25);
    let compiled = compile_query(&CompileContext::new(&schema, &config), &request)?;

    assert!(compiled.sql.contains("t3.entity_identity = ?"));
    assert!(compiled.sql.contains(") INTERSECT ("));
    assert!(compiled.sql.ends_with(" ORDER BY t6.qname_value ASC LIMIT 25"));
    assert_eq!(compiled.parameters, vec![Value::text("acme"), Value::Int(1)]);
    assert_eq!(compiled.type_codes(), vec![12, 4]);
    Ok(())
}

#[test]
fn test_count_matches_row_query_restriction() -> anyhow::Result<()> {
    let schema = store_schema();
    let config = default_config();
    let ctx = CompileContext::new(&schema, &config);
    let request = QueryRequest::new("Person")
        .with_predicate(BooleanExpression::not(BooleanExpression::is_null(person("name"))))
        .max_results(10);

    let rows = compile_query(&ctx, &request)?;
    let count = compile_count(&ctx, &request)?;
    let restriction = |sql: &str| {
        let start = sql.find(" IN (SELECT").map(|i| i + 4);
        start.map(|s| sql[s..].trim_end_matches(" ORDER BY t0.entity_identity ASC LIMIT 10").to_string())
    };
    assert_eq!(restriction(&rows.sql), restriction(&count.sql));
    assert!(count.sql.starts_with("SELECT COUNT(DISTINCT t0.entity_pk)"));
    Ok(())
}

#[test]
fn test_unmapped_association_fails_without_partial_output() {
    let schema = store_schema();
    let config = default_config();
    let spouse = AssociationReference::single(QualifiedName::new("Person", "spouse"));
    let request = QueryRequest::new("Person").with_predicate(BooleanExpression::or(vec![
        BooleanExpression::eq(person("name"), "Alice"),
        BooleanExpression::association_is_null(spouse),
    ]));
    let err = compile_query(&CompileContext::new(&schema, &config), &request).unwrap_err();
    assert!(matches!(err, QueryCompileError::SchemaInconsistency(_)));
}

#[test]
fn test_compiled_query_serializes_for_diagnostics() -> anyhow::Result<()> {
    let schema = store_schema();
    let config = default_config();
    let request =
        QueryRequest::new("Person").with_predicate(BooleanExpression::eq(person("name"), "Alice"));
    let compiled = compile_query(&CompileContext::new(&schema, &config), &request)?;

    let json: serde_json::Value = serde_json::from_str(&compiled.to_diagnostic_json()?)?;
    assert_eq!(json["sql"], serde_json::Value::String(compiled.sql.clone()));
    assert_eq!(json["parameters"][0]["type"], "Text");
    assert_eq!(json["parameters"][0]["value"], "Alice");
    assert_eq!(json["parameter_types"][0], "Varchar");
    Ok(())
}
