//! Common test utilities and fixtures for mapping and settings tests
//!
//! Builds an in-memory schema directory shaped like a small CRM (invoices
//! owned by users, users managed by users, payers that are accounts or
//! contacts) and a mapping store seeded with an `invoice` remote entity.

#![allow(dead_code)]

use fieldsync::config::FieldSyncConfig;
use fieldsync::logging::init_test_logging;
use fieldsync::mapping::{InMemoryMappingStore, MappingIdent, MappingRecord, MappingSetManager, RecordId};
use fieldsync::notify::RecordingNotifier;
use fieldsync::schema::{FieldDefinition, FieldKind, InMemorySchemaDirectory, ObjectSchema};
use fieldsync::ConfirmationGate;
use std::sync::Arc;

pub const REMOTE_ENTITY: &str = "invoice";
pub const LOCAL_OBJECT: &str = "Invoice__c";
pub const REMOTE_FIELDS: &[&str] = &["code", "total", "customerEmail", "dueDate"];

pub fn text(name: &str) -> FieldDefinition {
    FieldDefinition::new(name, name, FieldKind::String { length: Some(80) })
}

pub fn test_directory() -> InMemorySchemaDirectory {
    InMemorySchemaDirectory::new()
        .with_object(
            LOCAL_OBJECT,
            ObjectSchema::new(
                "Invoice",
                vec![
                    text("Name"),
                    FieldDefinition::new(
                        "Total__c",
                        "Total",
                        FieldKind::Numeric {
                            precision: Some(16),
                            scale: 2,
                        },
                    ),
                    FieldDefinition::new("DueDate__c", "Due Date", FieldKind::Date),
                    FieldDefinition::reference("Owner", "Owner", ["User"]),
                    FieldDefinition::reference("Payer__c", "Payer", ["Account", "Contact"]),
                ],
            ),
        )
        .with_object(
            "Order__c",
            ObjectSchema::new("Order", vec![text("Name")]),
        )
        .with_object(
            "User",
            ObjectSchema::new(
                "User",
                vec![
                    text("Email"),
                    text("Name"),
                    FieldDefinition::reference("Manager", "Manager", ["User"]),
                ],
            ),
        )
        .with_object("Account", ObjectSchema::new("Account", vec![text("Name")]))
        .with_object("Contact", ObjectSchema::new("Contact", vec![text("Email")]))
}

pub fn persisted_record(id: &str, local_path: &str, remote_field: &str) -> MappingRecord {
    let mut record = MappingRecord::new(MappingIdent::default(), LOCAL_OBJECT, REMOTE_ENTITY);
    record.id = Some(RecordId::new(id));
    record.local_path = Some(local_path.parse().expect("valid path"));
    record.remote_field = Some(remote_field.to_string());
    record.local_to_remote = true;
    record
}

/// Manager wired to in-memory collaborators the test can inspect
pub struct MappingFixture {
    pub manager: MappingSetManager,
    pub store: Arc<InMemoryMappingStore>,
    pub directory: Arc<InMemorySchemaDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub gate: ConfirmationGate,
}

impl MappingFixture {
    /// Store with two persisted mappings for the remote entity
    pub fn new() -> Self {
        Self::with_store(
            InMemoryMappingStore::new()
                .with_remote_fields(REMOTE_ENTITY, REMOTE_FIELDS.iter().copied())
                .with_mapping(persisted_record("a01", "Name", "code"))
                .with_mapping(persisted_record("a02", "Owner.Email", "customerEmail")),
        )
    }

    /// Store with no mappings yet
    pub fn empty() -> Self {
        Self::with_store(
            InMemoryMappingStore::new()
                .with_remote_fields(REMOTE_ENTITY, REMOTE_FIELDS.iter().copied()),
        )
    }

    pub fn with_store(store: InMemoryMappingStore) -> Self {
        Self::with_config(FieldSyncConfig::default(), store)
    }

    pub fn with_config(config: FieldSyncConfig, store: InMemoryMappingStore) -> Self {
        init_test_logging();
        let store = Arc::new(store);
        let directory = Arc::new(test_directory());
        let notifier = Arc::new(RecordingNotifier::new());
        let manager = MappingSetManager::new(&config, store.clone(), directory.clone(), notifier.clone());
        Self {
            manager,
            store,
            directory,
            notifier,
            gate: ConfirmationGate::new(),
        }
    }

    /// Initialize against the remote entity, letting the records name the local object
    pub async fn loaded() -> Self {
        let mut fixture = Self::new();
        fixture
            .manager
            .initialize(None, REMOTE_ENTITY)
            .await
            .expect("initialize");
        fixture
    }
}
