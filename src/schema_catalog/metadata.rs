use serde::{Deserialize, Serialize};

use crate::query_model::{QualifiedName, SqlType, Value};

pub const DEFAULT_PARENT_JOIN_COLUMN: &str = "parent_qname";
pub const DEFAULT_CHILD_JOIN_COLUMN: &str = "qname_id";

fn default_parent_join_column() -> String {
    DEFAULT_PARENT_JOIN_COLUMN.to_string()
}

fn default_child_join_column() -> String {
    DEFAULT_CHILD_JOIN_COLUMN.to_string()
}

/// Physical mapping of one qualified attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    #[serde(alias = "table")]
    pub table_name: String,
    /// 0 = scalar, n > 0 = collection nested n levels deep
    #[serde(default)]
    pub collection_depth: u32,
    /// Column referencing the attribute instance of the parent value object
    #[serde(default = "default_parent_join_column")]
    pub parent_join_column: String,
    /// Column identifying this attribute instance for its own sub-attributes
    #[serde(default = "default_child_join_column")]
    pub child_join_column: String,
}

impl AttributeInfo {
    pub fn new(table_name: impl Into<String>, collection_depth: u32) -> Self {
        AttributeInfo {
            table_name: table_name.into(),
            collection_depth,
            parent_join_column: default_parent_join_column(),
            child_join_column: default_child_join_column(),
        }
    }

    pub fn is_collection(&self) -> bool {
        self.collection_depth > 0
    }
}

/// Schema metadata the compiler consumes: attribute tables, the concrete
/// physical type ids behind a logical type, persisted enum keys and the SQL
/// type code of a value.
pub trait SchemaMetadata {
    fn attribute_info(&self, name: &QualifiedName) -> Option<&AttributeInfo>;

    /// Physical type ids of every concrete subtype of `logical_type`, itself included.
    fn concrete_type_ids(&self, logical_type: &str) -> Option<Vec<i32>>;

    /// Persisted key of an enum constant.
    fn enum_key(&self, enum_type: &str, variant: &str) -> Option<i64>;

    fn sql_type_of(&self, value: &Value) -> Option<SqlType> {
        value.sql_type()
    }
}
