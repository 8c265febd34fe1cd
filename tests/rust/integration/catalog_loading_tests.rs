use std::io::Write;

use entity_sql_query::query_model::{BooleanExpression, PropertyReference, QualifiedName};
use entity_sql_query::schema_catalog::{EntitySchemaConfig, SchemaCatalogError};
use entity_sql_query::{compile_query, CompileContext, CompilerConfig, QueryRequest, SchemaMetadata};
use tempfile::NamedTempFile;

use super::{init_logging, STORE_CATALOG};

fn write_temp(content: &str) -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test]
fn test_catalog_from_yaml_file() -> anyhow::Result<()> {
    init_logging();
    let file = write_temp(STORE_CATALOG)?;
    let schema = EntitySchemaConfig::from_yaml_file(file.path())?.to_entity_schema()?;

    assert_eq!(schema.concrete_type_ids("Person"), Some(vec![11, 12]));
    assert_eq!(schema.concrete_type_ids("Company"), Some(vec![20]));
    assert_eq!(schema.enum_key("Status", "RETIRED"), Some(2));
    let addresses = schema
        .attribute_info(&QualifiedName::new("Person", "addresses"))
        .expect("addresses mapped");
    assert_eq!(addresses.child_join_column, "address_id");
    Ok(())
}

#[test]
fn test_missing_catalog_file_is_read_error() {
    let err = EntitySchemaConfig::from_yaml_file("/nonexistent/catalog.yaml").unwrap_err();
    assert!(matches!(err, SchemaCatalogError::ConfigReadError { .. }));
}

#[test]
fn test_malformed_catalog_is_parse_error() -> anyhow::Result<()> {
    let file = write_temp("entity_types: [name: ")?;
    let err = EntitySchemaConfig::from_yaml_file(file.path()).unwrap_err();
    assert!(matches!(err, SchemaCatalogError::ConfigParseError { .. }));
    Ok(())
}

#[test]
fn test_compiler_config_from_yaml_file_qualifies_tables() -> anyhow::Result<()> {
    init_logging();
    let file = write_temp(
        "schema_name: store\nentity_table: objects\nattribute_value_column: val\n",
    )?;
    let config = CompilerConfig::from_yaml_file(file.path())?;
    let schema = super::store_schema();

    let request = QueryRequest::new("Person").with_predicate(BooleanExpression::eq(
        PropertyReference::new(QualifiedName::new("Person", "name")),
        "Alice",
    ));
    let compiled = compile_query(&CompileContext::new(&schema, &config), &request)?;

    assert!(compiled.sql.starts_with(
        "SELECT DISTINCT t0.entity_pk, t0.entity_identity FROM store.objects t0"
    ));
    assert!(compiled
        .sql
        .contains("JOIN store.person_name t2 ON t2.entity_pk = t1.entity_pk"));
    assert!(compiled.sql.ends_with("t2.val = ?)"));
    Ok(())
}

#[test]
fn test_invalid_compiler_config_file_is_rejected() -> anyhow::Result<()> {
    let file = write_temp("entity_pk_column: \"pk--\"\n")?;
    assert!(CompilerConfig::from_yaml_file(file.path()).is_err());
    Ok(())
}
