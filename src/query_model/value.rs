//! Literal values carried by predicates and the SQL type codes used to bind them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::qualified_name::QualifiedName;

/// SQL type codes, numbered like the JDBC `java.sql.Types` constants so the
/// executing layer can hand them straight to its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    Null,
    Boolean,
    Integer,
    BigInt,
    Double,
    Varchar,
    Date,
    Timestamp,
}

impl SqlType {
    pub fn code(&self) -> i32 {
        match self {
            SqlType::Null => 0,
            SqlType::Boolean => 16,
            SqlType::Integer => 4,
            SqlType::BigInt => -5,
            SqlType::Double => 8,
            SqlType::Varchar => 12,
            SqlType::Date => 91,
            SqlType::Timestamp => 93,
        }
    }
}

/// A runtime value appearing on the right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    /// Enum constant, persisted through the schema's enum-key table
    Enum { enum_type: String, variant: String },
    Collection(Vec<Value>),
    /// Value object; each field is stored in a child attribute table
    Composite {
        type_name: String,
        fields: Vec<(QualifiedName, Value)>,
    },
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn enum_constant(enum_type: impl Into<String>, variant: impl Into<String>) -> Self {
        Value::Enum {
            enum_type: enum_type.into(),
            variant: variant.into(),
        }
    }

    /// Scalar values bind to exactly one placeholder.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Collection(_) | Value::Composite { .. })
    }

    /// Type code of a scalar value; `None` for collections and composites.
    pub fn sql_type(&self) -> Option<SqlType> {
        let sql_type = match self {
            Value::Null => SqlType::Null,
            Value::Bool(_) => SqlType::Boolean,
            Value::Int(_) => SqlType::BigInt,
            Value::Float(_) => SqlType::Double,
            Value::Text(_) => SqlType::Varchar,
            Value::Date(_) => SqlType::Date,
            Value::Timestamp(_) => SqlType::Timestamp,
            Value::Enum { .. } => SqlType::Integer,
            Value::Collection(_) | Value::Composite { .. } => return None,
        };
        Some(sql_type)
    }

    /// Short description used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::Enum { .. } => "enum",
            Value::Collection(_) => "collection",
            Value::Composite { .. } => "composite",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Collection(items.into_iter().map(Into::into).collect())
    }
}
