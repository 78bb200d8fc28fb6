//! # Mapping Set Manager
//!
//! Owns the ordered mapping records of one local object / remote entity pair
//! together with the ids queued for deletion. Local field paths are built
//! through a [`FieldPathResolver`] session; changing the bound local object
//! wipes every mapping and therefore waits on a [`ConfirmationHandle`].

use crate::config::{FieldSyncConfig, ManagerConfig};
use crate::confirmation::{ConfirmationGate, ConfirmationHandle};
use crate::error::{FieldSyncError, FieldSyncResult, GateError, TransportError};
use crate::mapping::record::{IdentGenerator, MappingChange, MappingIdent, MappingRecord, RecordId};
use crate::mapping::store::MappingStore;
use crate::notify::{NotificationKind, Notifier};
use crate::schema::directory::SchemaDirectory;
use crate::schema::path::FieldPath;
use crate::schema::resolver::FieldPathResolver;
use crate::schema::types::FieldDefinition;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Message shown before the bound local object changes
pub const REBIND_CONFIRMATION_MESSAGE: &str =
    "Changing the object will discard all current mappings. Do you want to continue?";

/// Message sent after a successful save
pub const MAPPINGS_SAVED_MESSAGE: &str = "Mappings saved";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Never initialized, or the last initialize failed
    NotLoaded,
    Loaded,
}

/// Result of a rebind attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebindOutcome {
    /// The user declined; nothing changed
    Declined,
    /// Mappings were discarded and their persisted ids queued for deletion
    Rebound { discarded: usize, queued_for_deletion: usize },
}

/// Summary of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: usize,
    pub created: usize,
    pub deleted: usize,
    pub saved_at: DateTime<Utc>,
}

pub struct MappingSetManager {
    config: ManagerConfig,
    gate_timeout: Option<Duration>,
    store: Arc<dyn MappingStore>,
    directory: Arc<dyn SchemaDirectory>,
    notifier: Arc<dyn Notifier>,
    resolver: FieldPathResolver,
    selecting: Option<MappingIdent>,
    idents: IdentGenerator,
    load_state: LoadState,
    remote_entity: Option<String>,
    local_object: Option<String>,
    local_label: Option<String>,
    local_fields: Option<Vec<FieldDefinition>>,
    remote_fields: Vec<String>,
    records: Vec<MappingRecord>,
    pending_deletions: Vec<RecordId>,
}

impl MappingSetManager {
    pub fn new(
        config: &FieldSyncConfig,
        store: Arc<dyn MappingStore>,
        directory: Arc<dyn SchemaDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let resolver =
            FieldPathResolver::new(directory.clone(), config.resolver.reference_target_policy);
        Self {
            config: config.manager.clone(),
            gate_timeout: config.gate.timeout(),
            store,
            directory,
            notifier,
            resolver,
            selecting: None,
            idents: IdentGenerator::new(),
            load_state: LoadState::NotLoaded,
            remote_entity: None,
            local_object: None,
            local_label: None,
            local_fields: None,
            remote_fields: Vec::new(),
            records: Vec::new(),
            pending_deletions: Vec::new(),
        }
    }

    // ========== Accessors ==========

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_loaded(&self) -> bool {
        self.load_state == LoadState::Loaded
    }

    /// Whether the UI should disable mutating controls
    pub fn is_read_only(&self) -> bool {
        !self.config.authorization.can_mutate()
    }

    pub fn remote_entity(&self) -> Option<&str> {
        self.remote_entity.as_deref()
    }

    pub fn local_object(&self) -> Option<&str> {
        self.local_object.as_deref()
    }

    pub fn remote_fields(&self) -> &[String] {
        &self.remote_fields
    }

    /// Records in display order
    pub fn records(&self) -> &[MappingRecord] {
        &self.records
    }

    pub fn record(&self, ident: MappingIdent) -> Option<&MappingRecord> {
        self.records.iter().find(|record| record.ident == ident)
    }

    pub fn pending_deletions(&self) -> &[RecordId] {
        &self.pending_deletions
    }

    /// Resolver session used by `open_path_selection`
    pub fn path_resolver(&self) -> &FieldPathResolver {
        &self.resolver
    }

    /// Record whose local path is being chosen
    pub fn selecting(&self) -> Option<MappingIdent> {
        self.selecting
    }

    pub fn mapping_title(&self) -> String {
        let remote = self.remote_entity.as_deref().unwrap_or_default();
        match &self.local_label {
            Some(label) => format!("Mapping for {} to {}", remote, label),
            None => format!("Mapping for {}", remote),
        }
    }

    // ========== Loading ==========

    /// Load the mappings and remote field catalog of `remote_entity`.
    ///
    /// Both fetches run concurrently and must both succeed; on failure the
    /// manager is left `NotLoaded` with no partial state. The local object is
    /// the given one, else the one named by the first loaded record, else the
    /// configured default. With none of those, the set starts empty for
    /// first-time configuration.
    pub async fn initialize(&mut self, local_object: Option<&str>, remote_entity: &str) -> FieldSyncResult<()> {
        self.reset();
        info!("Loading mappings for remote entity '{}'", remote_entity);

        let (mut records, remote_fields) = match futures::try_join!(
            self.store.load_mappings(remote_entity),
            self.store.load_remote_fields(remote_entity)
        ) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Failed to load mappings for '{}': {}", remote_entity, e);
                self.notifier.notify(
                    NotificationKind::Error,
                    &format!("Could not load mappings for {}: {}", remote_entity, e),
                );
                return Err(e.into());
            }
        };

        let local_object = local_object
            .map(str::to_string)
            .or_else(|| records.first().map(|record| record.local_object.clone()))
            .or_else(|| self.config.default_local_object.clone());

        for record in &mut records {
            record.ident = self.idents.next_ident();
        }

        self.remote_entity = Some(remote_entity.to_string());
        self.remote_fields = remote_fields;
        self.records = records;
        self.local_object = local_object;
        self.load_state = LoadState::Loaded;
        self.refresh_local_label().await;

        info!(
            "Loaded {} mappings and {} remote fields for '{}' (local object: {})",
            self.records.len(),
            self.remote_fields.len(),
            remote_entity,
            self.local_object.as_deref().unwrap_or("<unbound>")
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.resolver.cancel_selection();
        self.selecting = None;
        self.load_state = LoadState::NotLoaded;
        self.remote_entity = None;
        self.local_object = None;
        self.local_label = None;
        self.local_fields = None;
        self.remote_fields.clear();
        self.records.clear();
        self.pending_deletions.clear();
    }

    async fn refresh_local_label(&mut self) {
        self.local_label = match &self.local_object {
            None => None,
            Some(object) => match self.directory.object_label(object).await {
                Ok(label) => label,
                Err(e) => {
                    warn!("Could not fetch label of '{}': {}", object, e);
                    None
                }
            },
        };
    }

    /// Field definitions of the bound local object, fetched once per binding
    pub async fn local_field_definitions(&mut self) -> FieldSyncResult<&[FieldDefinition]> {
        let object = self
            .local_object
            .clone()
            .ok_or(FieldSyncError::NoLocalObject)?;
        if self.local_fields.is_none() {
            let fields = self.directory.field_definitions(&object).await?;
            debug!("Cached {} field definitions of '{}'", fields.len(), object);
            self.local_fields = Some(fields);
        }
        Ok(self.local_fields.as_deref().unwrap_or_default())
    }

    // ========== Guards ==========

    fn ensure_loaded(&self) -> FieldSyncResult<()> {
        match self.load_state {
            LoadState::Loaded => Ok(()),
            LoadState::NotLoaded => Err(FieldSyncError::NotLoaded),
        }
    }

    fn ensure_mutable(&self, operation: &str) -> FieldSyncResult<()> {
        self.config.authorization.ensure_can_mutate(operation)?;
        self.ensure_loaded()
    }

    fn position(&self, ident: MappingIdent) -> FieldSyncResult<usize> {
        self.records
            .iter()
            .position(|record| record.ident == ident)
            .ok_or(FieldSyncError::RecordNotFound { ident: ident.value() })
    }

    fn record_mut(&mut self, ident: MappingIdent) -> FieldSyncResult<&mut MappingRecord> {
        let index = self.position(ident)?;
        Ok(&mut self.records[index])
    }

    // ========== Record Editing ==========

    /// Append an empty mapping bound to the current object pair
    pub fn append_mapping(&mut self) -> FieldSyncResult<MappingIdent> {
        self.ensure_mutable("append mapping")?;
        let local = self.local_object.clone().ok_or(FieldSyncError::NoLocalObject)?;
        let remote = self.remote_entity.clone().unwrap_or_default();
        let ident = self.idents.next_ident();
        self.records.push(MappingRecord::new(ident, local, remote));
        debug!("Appended mapping {}", ident);
        Ok(ident)
    }

    pub fn mutate_mapping(&mut self, ident: MappingIdent, change: MappingChange) -> FieldSyncResult<()> {
        self.ensure_mutable("edit mapping")?;
        debug!("Mapping {}: {:?}", ident, change);
        self.record_mut(ident)?.apply(change);
        Ok(())
    }

    /// Store a resolved local path on a record
    pub fn assign_local_path(&mut self, ident: MappingIdent, path: FieldPath) -> FieldSyncResult<()> {
        self.ensure_mutable("assign local path")?;
        debug!("Mapping {}: local path '{}'", ident, path);
        self.record_mut(ident)?.local_path = Some(path);
        Ok(())
    }

    /// Drop a record; a persisted one has its id queued for deletion
    pub fn remove_mapping(&mut self, ident: MappingIdent) -> FieldSyncResult<MappingRecord> {
        self.ensure_mutable("remove mapping")?;
        let index = self.position(ident)?;
        let record = self.records.remove(index);
        if let Some(id) = &record.id {
            self.queue_deletion(id.clone());
        }
        if self.selecting == Some(ident) {
            self.cancel_path_selection();
        }
        debug!("Removed mapping {}", ident);
        Ok(record)
    }

    fn queue_deletion(&mut self, id: RecordId) {
        if !self.pending_deletions.contains(&id) {
            self.pending_deletions.push(id);
        }
    }

    // ========== Local Path Selection ==========

    /// Open a resolver session on the local object's fields for `ident`
    pub async fn open_path_selection(&mut self, ident: MappingIdent) -> FieldSyncResult<()> {
        self.ensure_mutable("select local field")?;
        self.position(ident)?;
        let root = self.local_object.clone().ok_or(FieldSyncError::NoLocalObject)?;
        let candidates = self.local_field_definitions().await?.to_vec();
        self.resolver.open_selection(root, candidates);
        self.selecting = Some(ident);
        Ok(())
    }

    pub async fn select_path_field(&mut self, level: usize, field_id: &str) -> FieldSyncResult<()> {
        self.resolver.select_field(level, field_id).await
    }

    pub async fn select_path_reference(&mut self, level: usize, field_id: &str, target: &str) -> FieldSyncResult<()> {
        self.resolver.select_reference(level, field_id, target).await
    }

    /// Confirm the open session and assign its path to the record it was opened for
    pub fn confirm_path_selection(&mut self) -> FieldSyncResult<FieldPath> {
        let ident = self.selecting.ok_or(FieldSyncError::IncompleteSelection {
            depth: self.resolver.depth(),
        })?;
        let path = self.resolver.confirm_selection()?;
        self.selecting = None;
        self.assign_local_path(ident, path.clone())?;
        Ok(path)
    }

    /// Close the session; the record keeps its previous path
    pub fn cancel_path_selection(&mut self) {
        self.resolver.cancel_selection();
        self.selecting = None;
    }

    // ========== Binding ==========

    /// Bind a local object when none is bound yet; no mappings are at stake
    pub async fn bind_local_object(&mut self, local_object: &str) -> FieldSyncResult<()> {
        self.ensure_mutable("bind local object")?;
        if let Some(bound) = &self.local_object {
            return Err(FieldSyncError::AlreadyBound(bound.clone()));
        }
        info!("Binding local object '{}'", local_object);
        self.local_object = Some(local_object.to_string());
        self.local_fields = None;
        self.refresh_local_label().await;
        Ok(())
    }

    /// Ask `gate` the rebind question
    pub fn request_rebind(&self, gate: &ConfirmationGate) -> Result<ConfirmationHandle, GateError> {
        gate.request(REBIND_CONFIRMATION_MESSAGE)
    }

    /// Replace the bound local object after the user confirms.
    ///
    /// Waits on `confirmation` (bounded by the configured gate timeout, if
    /// any). A declined or timed-out confirmation changes nothing; a timeout
    /// also withdraws the question from the gate. On
    /// confirmation every persisted id is queued for deletion, the collection
    /// is emptied and the field definition cache dropped. `None` leaves the
    /// set unbound.
    pub async fn rebind_local_object(
        &mut self,
        new_local_object: Option<&str>,
        confirmation: ConfirmationHandle,
    ) -> FieldSyncResult<RebindOutcome> {
        self.ensure_mutable("rebind local object")?;

        if !confirmation.decision_with(self.gate_timeout).await? {
            info!("Rebind to {:?} declined", new_local_object);
            return Ok(RebindOutcome::Declined);
        }

        self.cancel_path_selection();
        let discarded = self.records.len();
        let persisted: Vec<RecordId> = self
            .records
            .drain(..)
            .filter_map(|record| record.id)
            .collect();
        let queued_for_deletion = persisted.len();
        for id in persisted {
            self.queue_deletion(id);
        }

        self.local_object = new_local_object.map(str::to_string);
        self.local_fields = None;
        self.refresh_local_label().await;

        info!(
            "Rebound local object to {:?}: discarded {} mappings, {} queued for deletion",
            self.local_object, discarded, queued_for_deletion
        );
        Ok(RebindOutcome::Rebound {
            discarded,
            queued_for_deletion,
        })
    }

    // ========== Saving ==========

    /// Problems that would block a save, one entry per issue
    pub fn validate(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|record| record.problems(&self.remote_fields))
            .collect()
    }

    /// Persist the collection and flush pending deletions.
    ///
    /// Nothing is sent when validation fails. A failed call leaves records and
    /// pending deletions untouched so the user can retry.
    pub async fn save(&mut self) -> FieldSyncResult<SaveReport> {
        self.ensure_mutable("save mappings")?;

        let problems = self.validate();
        if !problems.is_empty() {
            warn!("Refusing to save {} mappings: {:?}", self.records.len(), problems);
            self.notifier.notify(NotificationKind::Warning, &problems.join("\n"));
            return Err(FieldSyncError::Validation(problems));
        }

        let result = self
            .store
            .save_mappings(&self.records, &self.pending_deletions)
            .await
            .and_then(|ids| {
                if ids.len() == self.records.len() {
                    Ok(ids)
                } else {
                    Err(TransportError::Malformed(format!(
                        "expected {} record ids, got {}",
                        self.records.len(),
                        ids.len()
                    )))
                }
            });

        let ids = match result {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Saving mappings failed: {}", e);
                self.notifier
                    .notify(NotificationKind::Error, &format!("Saving mappings failed: {}", e));
                return Err(e.into());
            }
        };

        let mut created = 0;
        for (record, id) in self.records.iter_mut().zip(ids) {
            if record.id.is_none() {
                created += 1;
            }
            record.id = Some(id);
        }
        let deleted = self.pending_deletions.len();
        self.pending_deletions.clear();

        let report = SaveReport {
            saved: self.records.len(),
            created,
            deleted,
            saved_at: Utc::now(),
        };
        info!(
            "Saved {} mappings ({} new), deleted {}",
            report.saved, report.created, report.deleted
        );
        self.notifier
            .notify(NotificationKind::Success, MAPPINGS_SAVED_MESSAGE);
        Ok(report)
    }
}
