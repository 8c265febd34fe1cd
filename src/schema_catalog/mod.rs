pub mod entity_schema;
pub mod errors;
pub mod metadata;

pub use entity_schema::{EntitySchema, EntitySchemaConfig};
pub use errors::SchemaCatalogError;
pub use metadata::{AttributeInfo, SchemaMetadata};
