use crate::schema::path::FieldPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-local identity of an in-memory mapping record.
///
/// Minted by [`IdentGenerator`]; zero marks a record that has not been
/// adopted by a manager yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MappingIdent(u64);

impl MappingIdent {
    pub fn value(self) -> u64 {
        self.0
    }

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for MappingIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic ident source; never hands out the same ident twice
#[derive(Debug)]
pub struct IdentGenerator {
    next: u64,
}

impl Default for IdentGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdentGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_ident(&mut self) -> MappingIdent {
        let ident = MappingIdent(self.next);
        self.next += 1;
        ident
    }
}

/// Identifier of a persisted mapping record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single field change on a mapping record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingChange {
    /// Remote field chosen from the remote catalog
    RemoteField(Option<String>),
    /// Local to remote sync flag
    LocalToRemote(bool),
    /// Remote to local sync flag
    RemoteToLocal(bool),
}

/// One field-level mapping between the local object and the remote entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(skip)]
    pub ident: MappingIdent,
    pub local_object: String,
    pub remote_entity: String,
    #[serde(default)]
    pub local_path: Option<FieldPath>,
    #[serde(default)]
    pub remote_field: Option<String>,
    #[serde(default)]
    pub local_to_remote: bool,
    #[serde(default)]
    pub remote_to_local: bool,
}

impl MappingRecord {
    /// Empty record: no path, no remote field, both directions off
    pub fn new(ident: MappingIdent, local_object: impl Into<String>, remote_entity: impl Into<String>) -> Self {
        Self {
            id: None,
            ident,
            local_object: local_object.into(),
            remote_entity: remote_entity.into(),
            local_path: None,
            remote_field: None,
            local_to_remote: false,
            remote_to_local: false,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn apply(&mut self, change: MappingChange) {
        match change {
            MappingChange::RemoteField(field) => self.remote_field = field,
            MappingChange::LocalToRemote(enabled) => self.local_to_remote = enabled,
            MappingChange::RemoteToLocal(enabled) => self.remote_to_local = enabled,
        }
    }

    /// Problems that block saving this record
    pub fn problems(&self, remote_catalog: &[String]) -> Vec<String> {
        let mut problems = Vec::new();
        if self.local_path.is_none() {
            problems.push(format!("mapping {}: local field path is not set", self.ident));
        }
        match &self.remote_field {
            None => problems.push(format!("mapping {}: remote field is not set", self.ident)),
            Some(field) if !remote_catalog.contains(field) => problems.push(format!(
                "mapping {}: remote field '{}' does not exist on '{}'",
                self.ident, field, self.remote_entity
            )),
            Some(_) => {}
        }
        problems
    }
}
