//! Mapping records and the manager that edits them

pub mod manager;
pub mod record;
pub mod store;

pub use manager::{
    LoadState, MappingSetManager, RebindOutcome, SaveReport, MAPPINGS_SAVED_MESSAGE,
    REBIND_CONFIRMATION_MESSAGE,
};
pub use record::{IdentGenerator, MappingChange, MappingIdent, MappingRecord, RecordId};
pub use store::{InMemoryMappingStore, JsonMappingStore, MappingFile, MappingStore};
