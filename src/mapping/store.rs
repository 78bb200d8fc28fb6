//! Mapping persistence
//!
//! `MappingStore` is the boundary to wherever mapping records and the remote
//! field catalog live. Saving upserts records in the given order and deletes
//! the given ids in the same call.

use crate::error::TransportError;
use crate::mapping::record::{MappingRecord, RecordId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Persisted mappings of a remote entity, in saved order
    async fn load_mappings(&self, remote_entity: &str) -> Result<Vec<MappingRecord>, TransportError>;

    /// Field names the remote entity exposes
    async fn load_remote_fields(&self, remote_entity: &str) -> Result<Vec<String>, TransportError>;

    /// Upsert `records` and delete `deletions`.
    ///
    /// Returns the persisted id of every record, aligned with `records`.
    async fn save_mappings(
        &self,
        records: &[MappingRecord],
        deletions: &[RecordId],
    ) -> Result<Vec<RecordId>, TransportError>;
}

/// Stored state shared by the in-memory and file stores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingFile {
    #[serde(default)]
    pub remote_fields: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub mappings: Vec<MappingRecord>,
}

impl MappingFile {
    pub fn mappings_for(&self, remote_entity: &str) -> Vec<MappingRecord> {
        self.mappings
            .iter()
            .filter(|record| record.remote_entity == remote_entity)
            .cloned()
            .collect()
    }

    pub fn remote_fields_for(&self, remote_entity: &str) -> Result<Vec<String>, TransportError> {
        self.remote_fields
            .get(remote_entity)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(remote_entity.to_string()))
    }

    /// Apply one save: delete, then upsert in order, minting ids for new records
    pub fn apply_save(&mut self, records: &[MappingRecord], deletions: &[RecordId]) -> Vec<RecordId> {
        let deleted: HashSet<&RecordId> = deletions.iter().collect();
        self.mappings
            .retain(|stored| stored.id.as_ref().map_or(true, |id| !deleted.contains(id)));

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let mut stored = record.clone();
            let id = stored
                .id
                .clone()
                .unwrap_or_else(|| RecordId::new(Uuid::new_v4().to_string()));
            stored.id = Some(id.clone());

            match self
                .mappings
                .iter_mut()
                .find(|existing| existing.id.as_ref() == Some(&id))
            {
                Some(existing) => *existing = stored,
                None => self.mappings.push(stored),
            }
            ids.push(id);
        }
        ids
    }
}

/// Store kept in memory, with failure injection for tests
#[derive(Debug, Default)]
pub struct InMemoryMappingStore {
    state: Mutex<MappingFile>,
    fail_loads: Mutex<bool>,
    fail_saves: Mutex<bool>,
    saves: Mutex<Vec<(Vec<MappingRecord>, Vec<RecordId>)>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote_fields<I, S>(self, remote_entity: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        guard(&self.state).remote_fields.insert(
            remote_entity.to_string(),
            fields.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Seed a persisted record; an id is minted when it has none
    pub fn with_mapping(self, mut record: MappingRecord) -> Self {
        if record.id.is_none() {
            record.id = Some(RecordId::new(Uuid::new_v4().to_string()));
        }
        guard(&self.state).mappings.push(record);
        self
    }

    pub fn set_fail_loads(&self, fail: bool) {
        *guard(&self.fail_loads) = fail;
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *guard(&self.fail_saves) = fail;
    }

    pub fn snapshot(&self) -> MappingFile {
        guard(&self.state).clone()
    }

    /// Arguments of every successful save call
    pub fn saves(&self) -> Vec<(Vec<MappingRecord>, Vec<RecordId>)> {
        guard(&self.saves).clone()
    }

    fn check_loads(&self) -> Result<(), TransportError> {
        if *guard(&self.fail_loads) {
            return Err(TransportError::RequestFailed("load refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MappingStore for InMemoryMappingStore {
    async fn load_mappings(&self, remote_entity: &str) -> Result<Vec<MappingRecord>, TransportError> {
        self.check_loads()?;
        Ok(guard(&self.state).mappings_for(remote_entity))
    }

    async fn load_remote_fields(&self, remote_entity: &str) -> Result<Vec<String>, TransportError> {
        self.check_loads()?;
        guard(&self.state).remote_fields_for(remote_entity)
    }

    async fn save_mappings(
        &self,
        records: &[MappingRecord],
        deletions: &[RecordId],
    ) -> Result<Vec<RecordId>, TransportError> {
        if *guard(&self.fail_saves) {
            return Err(TransportError::RequestFailed("save refused".to_string()));
        }
        let ids = guard(&self.state).apply_save(records, deletions);
        guard(&self.saves).push((records.to_vec(), deletions.to_vec()));
        Ok(ids)
    }
}

/// Store backed by a JSON file, rewritten on every save
#[derive(Debug, Clone)]
pub struct JsonMappingStore {
    path: PathBuf,
}

impl JsonMappingStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<MappingFile, TransportError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn write(&self, file: &MappingFile) -> Result<(), TransportError> {
        let content = serde_json::to_string_pretty(file)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl MappingStore for JsonMappingStore {
    async fn load_mappings(&self, remote_entity: &str) -> Result<Vec<MappingRecord>, TransportError> {
        Ok(self.read().await?.mappings_for(remote_entity))
    }

    async fn load_remote_fields(&self, remote_entity: &str) -> Result<Vec<String>, TransportError> {
        self.read().await?.remote_fields_for(remote_entity)
    }

    async fn save_mappings(
        &self,
        records: &[MappingRecord],
        deletions: &[RecordId],
    ) -> Result<Vec<RecordId>, TransportError> {
        let mut file = self.read().await?;
        let ids = file.apply_save(records, deletions);
        self.write(&file).await?;
        log::info!(
            "Wrote {} mappings to {}",
            file.mappings.len(),
            self.path.display()
        );
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::record::IdentGenerator;
    use tempfile::TempDir;

    fn record(remote_field: &str) -> MappingRecord {
        let mut record = MappingRecord::new(IdentGenerator::new().next_ident(), "Invoice__c", "invoice");
        record.remote_field = Some(remote_field.to_string());
        record
    }

    #[test]
    fn test_apply_save_upserts_and_deletes() {
        let mut file = MappingFile::default();
        let ids = file.apply_save(&[record("a"), record("b")], &[]);
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let mut changed = file.mappings[1].clone();
        changed.remote_to_local = true;
        let again = file.apply_save(&[changed, record("c")], &[ids[0].clone()]);
        assert_eq!(again[0], ids[1]);

        let fields: Vec<_> = file
            .mappings
            .iter()
            .map(|m| m.remote_field.clone().unwrap())
            .collect();
        assert_eq!(fields, vec!["b", "c"]);
        assert!(file.mappings[0].remote_to_local);
    }

    #[tokio::test]
    async fn test_in_memory_failures() {
        let store = InMemoryMappingStore::new().with_remote_fields("invoice", ["code"]);
        assert_eq!(store.load_remote_fields("invoice").await.unwrap(), vec!["code"]);
        assert!(matches!(
            store.load_remote_fields("order").await,
            Err(TransportError::NotFound(_))
        ));

        store.set_fail_loads(true);
        assert!(store.load_mappings("invoice").await.is_err());

        store.set_fail_saves(true);
        assert!(store.save_mappings(&[record("code")], &[]).await.is_err());
        assert!(store.saves().is_empty());
    }

    #[tokio::test]
    async fn test_json_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mappings.json");
        let mut seed = MappingFile::default();
        seed.remote_fields
            .insert("invoice".to_string(), vec!["code".to_string()]);
        std::fs::write(&path, serde_json::to_string(&seed).unwrap()).unwrap();

        let store = JsonMappingStore::new(&path);
        let ids = store.save_mappings(&[record("code")], &[]).await.unwrap();

        let loaded = store.load_mappings("invoice").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id.as_ref(), Some(&ids[0]));
        assert!(store.load_mappings("order").await.unwrap().is_empty());
    }
}
