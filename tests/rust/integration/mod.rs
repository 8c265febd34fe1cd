//! Integration tests - catalog loading and end-to-end compilation through the public API
//!
//! These tests use only the crate's public surface and YAML files written to
//! temporary directories; no database is required.

mod catalog_loading_tests;
mod end_to_end_tests;

use entity_sql_query::{EntitySchema, CompilerConfig};
use entity_sql_query::schema_catalog::EntitySchemaConfig;

pub const STORE_CATALOG: &str = r#"
entity_types:
  - name: Person
  - name: Employee
    type_id: 11
    super_types: [Person]
  - name: Customer
    type_id: 12
    super_types: [Person]
  - name: Company
    type_id: 20
attributes:
  - declaring_type: Person
    name: name
    table: person_name
  - declaring_type: Person
    name: nicknames
    table: person_nicknames
    collection_depth: 1
  - declaring_type: Person
    name: addresses
    table: person_addresses
    collection_depth: 1
    child_join_column: address_id
  - declaring_type: Address
    name: city
    table: address_city
    parent_join_column: address_ref
  - declaring_type: Address
    name: zip
    table: address_zip
    parent_join_column: address_ref
  - declaring_type: Employee
    name: employer
    table: employee_employer
  - declaring_type: Company
    name: name
    table: company_name
  - declaring_type: Company
    name: employees
    table: company_employees
  - declaring_type: Person
    name: status
    table: person_status
enums:
  Status:
    ACTIVE: 1
    RETIRED: 2
"#;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn store_schema() -> EntitySchema {
    EntitySchemaConfig::from_yaml_str(STORE_CATALOG)
        .and_then(|config| config.to_entity_schema())
        .expect("store catalog should load")
}

pub fn default_config() -> CompilerConfig {
    CompilerConfig::default()
}
