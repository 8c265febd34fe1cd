/// Entity storage catalog.
///
/// This module loads the mapping between the object model and the generic
/// entity-attribute tables from YAML. It supports:
///
/// - Entity types with optional physical type ids and super types
/// - Attribute table mappings keyed by qualified name
/// - Enum constant to persisted key tables
///
/// # Example Configuration
///
/// ```yaml
/// entity_types:
///   - name: Person
///   - name: Employee
///     type_id: 1
///     super_types: [Person]
/// attributes:
///   - declaring_type: Person
///     name: name
///     table: person_name
///   - declaring_type: Person
///     name: tags
///     table: person_tags
///     collection_depth: 1
/// enums:
///   Color:
///     RED: 0
///     GREEN: 1
/// ```
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use super::errors::SchemaCatalogError;
use super::metadata::{AttributeInfo, SchemaMetadata};
use crate::config::is_sql_identifier;
use crate::query_model::QualifiedName;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTypeDefinition {
    pub name: String,
    /// Physical id stored in the entity table; abstract types have none
    #[serde(default)]
    pub type_id: Option<i32>,
    #[serde(default)]
    pub super_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub declaring_type: String,
    pub name: String,
    #[serde(flatten)]
    pub mapping: AttributeInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitySchemaConfig {
    #[serde(default)]
    pub entity_types: Vec<EntityTypeDefinition>,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    pub enums: BTreeMap<String, BTreeMap<String, i64>>,
}

impl EntitySchemaConfig {
    /// Load catalog configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaCatalogError> {
        let contents = fs::read_to_string(path).map_err(|e| SchemaCatalogError::ConfigReadError {
            error: e.to_string(),
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse catalog configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaCatalogError> {
        serde_yaml::from_str(yaml).map_err(|e| SchemaCatalogError::ConfigParseError {
            error: e.to_string(),
        })
    }

    /// Structural validation: identifiers, duplicates and super type references
    pub fn validate(&self) -> Result<(), SchemaCatalogError> {
        let declared: HashSet<&str> = self.entity_types.iter().map(|t| t.name.as_str()).collect();
        if declared.len() != self.entity_types.len() {
            return Err(SchemaCatalogError::InvalidConfig {
                message: "Duplicate entity type name".to_string(),
            });
        }

        for entity_type in &self.entity_types {
            for super_type in &entity_type.super_types {
                if !declared.contains(super_type.as_str()) {
                    return Err(SchemaCatalogError::config_error_with_context(
                        format!("super type `{}` is not declared", super_type),
                        format!("While resolving entity type `{}`", entity_type.name),
                    ));
                }
            }
        }

        let mut seen = HashSet::new();
        for attribute in &self.attributes {
            let mapping = &attribute.mapping;
            if !is_sql_identifier(&mapping.table_name) {
                return Err(SchemaCatalogError::InvalidTableName {
                    table: mapping.table_name.clone(),
                });
            }
            for column in [&mapping.parent_join_column, &mapping.child_join_column] {
                if !is_sql_identifier(column) {
                    return Err(SchemaCatalogError::InvalidColumnName {
                        column: column.clone(),
                    });
                }
            }
            if !seen.insert((&attribute.declaring_type, &attribute.name)) {
                return Err(SchemaCatalogError::DuplicateAttribute {
                    attribute: format!("{}:{}", attribute.declaring_type, attribute.name),
                });
            }
        }

        Ok(())
    }

    /// Convert to EntitySchema
    pub fn to_entity_schema(&self) -> Result<EntitySchema, SchemaCatalogError> {
        self.validate()?;

        let super_types: HashMap<&str, &[String]> = self
            .entity_types
            .iter()
            .map(|t| (t.name.as_str(), t.super_types.as_slice()))
            .collect();

        let mut concrete_type_ids: HashMap<String, Vec<i32>> = HashMap::new();
        for entity_type in &self.entity_types {
            concrete_type_ids.entry(entity_type.name.clone()).or_default();
            let Some(type_id) = entity_type.type_id else {
                continue;
            };
            for ancestor in ancestors_of(&entity_type.name, &super_types) {
                concrete_type_ids
                    .entry(ancestor.to_string())
                    .or_default()
                    .push(type_id);
            }
        }
        for ids in concrete_type_ids.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }

        let attributes = self
            .attributes
            .iter()
            .map(|a| {
                (
                    QualifiedName::new(a.declaring_type.clone(), a.name.clone()),
                    a.mapping.clone(),
                )
            })
            .collect();

        Ok(EntitySchema {
            attributes,
            concrete_type_ids,
            enum_keys: self.enums.clone(),
        })
    }
}

/// The type itself plus every transitive super type. Cycles in the
/// declaration are cut by the visited set.
fn ancestors_of<'a>(name: &'a str, super_types: &HashMap<&'a str, &'a [String]>) -> Vec<&'a str> {
    let mut visited = HashSet::new();
    let mut stack = vec![name];
    let mut result = Vec::new();
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        result.push(current);
        if let Some(parents) = super_types.get(current) {
            stack.extend(parents.iter().map(String::as_str));
        }
    }
    result
}

/// In-memory schema metadata built from [`EntitySchemaConfig`] or by hand.
#[derive(Debug, Clone, Default)]
pub struct EntitySchema {
    attributes: HashMap<QualifiedName, AttributeInfo>,
    concrete_type_ids: HashMap<String, Vec<i32>>,
    enum_keys: BTreeMap<String, BTreeMap<String, i64>>,
}

impl EntitySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaCatalogError> {
        EntitySchemaConfig::from_yaml_str(yaml)?.to_entity_schema()
    }

    pub fn with_attribute(mut self, name: QualifiedName, info: AttributeInfo) -> Self {
        self.attributes.insert(name, info);
        self
    }

    pub fn with_type_ids(mut self, logical_type: impl Into<String>, ids: Vec<i32>) -> Self {
        self.concrete_type_ids.insert(logical_type.into(), ids);
        self
    }

    pub fn with_enum_key(
        mut self,
        enum_type: impl Into<String>,
        variant: impl Into<String>,
        key: i64,
    ) -> Self {
        self.enum_keys
            .entry(enum_type.into())
            .or_default()
            .insert(variant.into(), key);
        self
    }
}

impl SchemaMetadata for EntitySchema {
    fn attribute_info(&self, name: &QualifiedName) -> Option<&AttributeInfo> {
        self.attributes.get(name)
    }

    fn concrete_type_ids(&self, logical_type: &str) -> Option<Vec<i32>> {
        self.concrete_type_ids.get(logical_type).cloned()
    }

    fn enum_key(&self, enum_type: &str, variant: &str) -> Option<i64> {
        self.enum_keys.get(enum_type)?.get(variant).copied()
    }
}
