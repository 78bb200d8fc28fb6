//! # fieldsync
//!
//! Field-level mappings between a local object schema and a remote
//! integration schema.
//!
//! - [`schema`]: field metadata, the schema directory boundary and the
//!   level-by-level [`FieldPathResolver`](schema::FieldPathResolver)
//! - [`confirmation`]: single-shot awaitable yes/no gate
//! - [`mapping`]: mapping records and the [`MappingSetManager`](mapping::MappingSetManager)
//! - [`settings`]: typed settings form built from the same field metadata

pub mod config;
pub mod confirmation;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod notify;
pub mod permissions;
pub mod schema;
pub mod settings;

pub use config::FieldSyncConfig;
pub use confirmation::{ConfirmationGate, ConfirmationHandle, GateStatus};
pub use error::{FieldSyncError, FieldSyncResult, GateError, TransportError};
pub use mapping::{MappingChange, MappingIdent, MappingRecord, MappingSetManager, RecordId};
pub use notify::{LogNotifier, NotificationKind, Notifier, RecordingNotifier};
pub use permissions::Authorization;
pub use schema::{FieldDefinition, FieldKind, FieldPath, FieldPathResolver, SchemaDirectory};
pub use settings::SettingsForm;
