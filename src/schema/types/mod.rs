pub mod field;
pub mod object;

pub use field::{FieldDefinition, FieldKind};
pub use object::ObjectSchema;
