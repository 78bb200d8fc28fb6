use super::field::FieldDefinition;
use serde::{Deserialize, Serialize};

/// Field metadata of one named object, as served by a schema directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    /// Display label of the object
    pub label: String,
    /// Fields in directory order
    pub fields: Vec<FieldDefinition>,
}

impl ObjectSchema {
    pub fn new(label: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            label: label.into(),
            fields,
        }
    }

    #[must_use]
    pub fn field(&self, api_name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.api_name == api_name)
    }
}
