//! Schema directory access
//!
//! The directory is the external provider of field metadata. Two
//! implementations ship with the crate: an in-memory one for tests and
//! embedding, and one backed by a JSON catalog file used by the CLI.

use crate::error::TransportError;
use crate::schema::types::{FieldDefinition, ObjectSchema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Provider of field metadata for named objects
#[async_trait]
pub trait SchemaDirectory: Send + Sync {
    /// Field definitions of the object, in directory order
    async fn field_definitions(&self, object: &str) -> Result<Vec<FieldDefinition>, TransportError>;

    /// Display label of the object, if the directory knows one
    async fn object_label(&self, object: &str) -> Result<Option<String>, TransportError>;
}

/// In-memory directory with lookup counting and failure injection
#[derive(Debug, Default)]
pub struct InMemorySchemaDirectory {
    objects: HashMap<String, ObjectSchema>,
    failing: Mutex<HashSet<String>>,
    lookups: AtomicUsize,
}

impl InMemorySchemaDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object, replacing any previous definition
    pub fn with_object(mut self, name: impl Into<String>, schema: ObjectSchema) -> Self {
        self.objects.insert(name.into(), schema);
        self
    }

    /// Make every later lookup of `object` fail with a transport error
    pub fn fail_on(&self, object: &str) {
        self.failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(object.to_string());
    }

    /// Undo `fail_on`
    pub fn recover(&self, object: &str) {
        self.failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(object);
    }

    /// Number of `field_definitions` calls served so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn schema(&self, object: &str) -> Result<&ObjectSchema, TransportError> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(object);
        if failing {
            return Err(TransportError::RequestFailed(format!(
                "schema lookup for '{}' failed",
                object
            )));
        }
        self.objects
            .get(object)
            .ok_or_else(|| TransportError::NotFound(object.to_string()))
    }
}

#[async_trait]
impl SchemaDirectory for InMemorySchemaDirectory {
    async fn field_definitions(&self, object: &str) -> Result<Vec<FieldDefinition>, TransportError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.schema(object)?.fields.clone())
    }

    async fn object_label(&self, object: &str) -> Result<Option<String>, TransportError> {
        match self.schema(object) {
            Ok(schema) => Ok(Some(schema.label.clone())),
            Err(TransportError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// On-disk catalog layout: object name to its schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaCatalog {
    pub objects: HashMap<String, ObjectSchema>,
}

/// Directory backed by a JSON catalog file read once at open time
#[derive(Debug, Clone)]
pub struct JsonSchemaDirectory {
    catalog: SchemaCatalog,
}

impl JsonSchemaDirectory {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TransportError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let catalog: SchemaCatalog = serde_json::from_str(&content)?;
        log::info!(
            "Loaded schema catalog {} with {} objects",
            path.as_ref().display(),
            catalog.objects.len()
        );
        Ok(Self { catalog })
    }

    pub fn from_catalog(catalog: SchemaCatalog) -> Self {
        Self { catalog }
    }

    /// Object names in sorted order
    pub fn object_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.catalog.objects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl SchemaDirectory for JsonSchemaDirectory {
    async fn field_definitions(&self, object: &str) -> Result<Vec<FieldDefinition>, TransportError> {
        self.catalog
            .objects
            .get(object)
            .map(|schema| schema.fields.clone())
            .ok_or_else(|| TransportError::NotFound(object.to_string()))
    }

    async fn object_label(&self, object: &str) -> Result<Option<String>, TransportError> {
        Ok(self.catalog.objects.get(object).map(|schema| schema.label.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::FieldKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn user_schema() -> ObjectSchema {
        ObjectSchema::new(
            "User",
            vec![FieldDefinition::new(
                "Email",
                "Email",
                FieldKind::String { length: Some(80) },
            )],
        )
    }

    #[tokio::test]
    async fn test_in_memory_lookup_and_failure() {
        let directory = InMemorySchemaDirectory::new().with_object("User", user_schema());

        let fields = directory.field_definitions("User").await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(directory.lookup_count(), 1);

        assert_eq!(
            directory.field_definitions("Nope").await.unwrap_err(),
            TransportError::NotFound("Nope".to_string())
        );
        assert_eq!(directory.object_label("Nope").await.unwrap(), None);

        directory.fail_on("User");
        assert!(matches!(
            directory.field_definitions("User").await,
            Err(TransportError::RequestFailed(_))
        ));
        directory.recover("User");
        assert!(directory.field_definitions("User").await.is_ok());
    }

    #[tokio::test]
    async fn test_json_catalog() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"objects": {{"User": {{"label": "User", "fields": [
                {{"apiName": "Email", "label": "Email", "dataType": "string", "length": 80}}
            ]}}}}}}"#
        )
        .unwrap();

        let directory = JsonSchemaDirectory::open(file.path()).unwrap();
        assert_eq!(directory.object_names(), vec!["User"]);
        assert_eq!(
            directory.field_definitions("User").await.unwrap(),
            user_schema().fields
        );
        assert_eq!(
            directory.object_label("User").await.unwrap().as_deref(),
            Some("User")
        );
    }

    #[test]
    fn test_json_catalog_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            JsonSchemaDirectory::open(file.path()),
            Err(TransportError::Malformed(_))
        ));
    }
}
