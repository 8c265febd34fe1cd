use serde::{Deserialize, Serialize};
use std::fmt;

/// Declaring type of the identity pseudo-attribute every entity carries.
pub const IDENTITY_DECLARING_TYPE: &str = "Identity";
/// Name of the identity pseudo-attribute.
pub const IDENTITY_ATTRIBUTE_NAME: &str = "identity";

/// Unique key of a property or association slot: `(declaring type, attribute name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    pub declaring_type: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        QualifiedName {
            declaring_type: declaring_type.into(),
            name: name.into(),
        }
    }

    /// The identity pseudo-attribute. Its value lives in the entity table itself.
    pub fn identity() -> Self {
        QualifiedName::new(IDENTITY_DECLARING_TYPE, IDENTITY_ATTRIBUTE_NAME)
    }

    pub fn is_identity(&self) -> bool {
        self.declaring_type == IDENTITY_DECLARING_TYPE && self.name == IDENTITY_ATTRIBUTE_NAME
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.declaring_type, self.name)
    }
}
