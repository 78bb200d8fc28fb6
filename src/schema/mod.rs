pub mod directory;
pub mod path;
pub mod resolver;
pub mod types;

pub use directory::{InMemorySchemaDirectory, JsonSchemaDirectory, SchemaCatalog, SchemaDirectory};
pub use path::FieldPath;
pub use resolver::{FieldPathResolver, PathLevel, ReferenceTargetPolicy, SelectionState};

// Re-export all types at the schema module level
pub use types::{FieldDefinition, FieldKind, ObjectSchema};
