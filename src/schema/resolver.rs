//! Field path resolution
//!
//! Builds a dotted path one level at a time. Every level only offers the
//! fields that exist on the object reached so far, so a confirmed path is
//! always a walk through the schema graph ending on a non-reference field.

use crate::error::{FieldSyncError, FieldSyncResult};
use crate::schema::directory::SchemaDirectory;
use crate::schema::path::FieldPath;
use crate::schema::types::FieldDefinition;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a reference field with several target objects is followed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceTargetPolicy {
    /// Follow the first declared target and log the others
    #[default]
    First,
    /// Refuse to guess; the caller names the target via `select_reference`
    Explicit,
}

/// Lifecycle of a selection session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Closed,
    /// Open, last choice (if any) was a reference
    Open,
    /// A terminal field is chosen and confirm is allowed
    Resolvable,
}

/// One step of an in-progress path
#[derive(Debug, Clone, PartialEq)]
pub struct PathLevel {
    /// Object whose fields are offered at this level
    pub object: String,
    pub candidates: Vec<FieldDefinition>,
    pub chosen: Option<FieldDefinition>,
}

impl PathLevel {
    fn new(object: impl Into<String>, candidates: Vec<FieldDefinition>) -> Self {
        Self {
            object: object.into(),
            candidates,
            chosen: None,
        }
    }

    fn candidate(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.candidates.iter().find(|field| field.api_name == field_id)
    }
}

/// Level-by-level builder of dotted field paths
pub struct FieldPathResolver {
    directory: Arc<dyn SchemaDirectory>,
    policy: ReferenceTargetPolicy,
    state: SelectionState,
    levels: Vec<PathLevel>,
}

/// `InvalidSelection`, logged at warn level. Callers only pick from offered
/// candidates, so this marks a wiring error.
fn rejected<S: Into<String>>(level: usize, reason: S) -> FieldSyncError {
    let error = FieldSyncError::invalid_selection(level, reason);
    warn!("Rejected path selection: {}", error);
    error
}

impl FieldPathResolver {
    pub fn new(directory: Arc<dyn SchemaDirectory>, policy: ReferenceTargetPolicy) -> Self {
        Self {
            directory,
            policy,
            state: SelectionState::Closed,
            levels: Vec::new(),
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != SelectionState::Closed
    }

    /// Confirm is only offered once a terminal field is chosen
    pub fn is_confirm_enabled(&self) -> bool {
        self.state == SelectionState::Resolvable
    }

    /// Number of levels in the navigation state
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[PathLevel] {
        &self.levels
    }

    pub fn candidates(&self, level: usize) -> Option<&[FieldDefinition]> {
        self.levels.get(level).map(|l| l.candidates.as_slice())
    }

    /// The chosen terminal field while resolvable
    pub fn terminal_field(&self) -> Option<&FieldDefinition> {
        match self.state {
            SelectionState::Resolvable => self.levels.last().and_then(|l| l.chosen.as_ref()),
            _ => None,
        }
    }

    /// Start a session on the root object's fields, discarding any previous one
    pub fn open_selection(&mut self, root_object: impl Into<String>, candidates: Vec<FieldDefinition>) {
        let root_object = root_object.into();
        debug!(
            "Opening field selection on '{}' with {} candidates",
            root_object,
            candidates.len()
        );
        self.levels = vec![PathLevel::new(root_object, candidates)];
        self.state = SelectionState::Open;
    }

    /// Choose `field_id` at `level`.
    ///
    /// Choosing at a level above the deepest one replaces that choice and
    /// drops every level below it. A reference descends into its target
    /// object; anything else terminates the path.
    pub async fn select_field(&mut self, level: usize, field_id: &str) -> FieldSyncResult<()> {
        let field = self.candidate(level, field_id)?.clone();
        let target = match field.kind.reference_targets() {
            [] if field.is_reference() => {
                return Err(rejected(
                    level,
                    format!("reference '{}' declares no target object", field_id),
                ));
            }
            [] => None,
            [only] => Some(only.clone()),
            [first, ..] => match self.policy {
                ReferenceTargetPolicy::First => {
                    warn!(
                        "Reference '{}' points to {:?}; following '{}'",
                        field_id,
                        field.kind.reference_targets(),
                        first
                    );
                    Some(first.clone())
                }
                ReferenceTargetPolicy::Explicit => {
                    return Err(FieldSyncError::AmbiguousReference {
                        field_id: field_id.to_string(),
                        targets: field.kind.reference_targets().to_vec(),
                    });
                }
            },
        };

        match target {
            Some(target) => self.descend(level, field, target).await,
            None => {
                self.choose_terminal(level, field);
                Ok(())
            }
        }
    }

    /// Choose reference `field_id` at `level`, following the named `target`
    pub async fn select_reference(
        &mut self,
        level: usize,
        field_id: &str,
        target: &str,
    ) -> FieldSyncResult<()> {
        let field = self.candidate(level, field_id)?.clone();
        if !field.is_reference() {
            return Err(rejected(
                level,
                format!("'{}' is not a reference field", field_id),
            ));
        }
        if !field.kind.reference_targets().iter().any(|t| t == target) {
            return Err(rejected(
                level,
                format!("'{}' does not reference '{}'", field_id, target),
            ));
        }
        self.descend(level, field, target.to_string()).await
    }

    /// Finish the session and return the dotted path of all choices
    pub fn confirm_selection(&mut self) -> FieldSyncResult<FieldPath> {
        if self.state != SelectionState::Resolvable {
            return Err(FieldSyncError::IncompleteSelection { depth: self.depth() });
        }
        let segments: Vec<String> = self
            .levels
            .iter()
            .filter_map(|level| level.chosen.as_ref().map(|f| f.api_name.clone()))
            .collect();
        let path = FieldPath::from_segments(segments)?;
        debug!("Confirmed field path '{}'", path);
        self.reset();
        Ok(path)
    }

    /// Close the session without producing a path
    pub fn cancel_selection(&mut self) {
        if self.is_open() {
            debug!("Field selection cancelled at depth {}", self.depth());
        }
        self.reset();
    }

    /// Walk `path` from `root_object` through a full session.
    ///
    /// Succeeds only if every segment exists at its level and the last one is
    /// a terminal field. Any session already open is discarded.
    pub async fn resolve_path(&mut self, root_object: &str, path: &FieldPath) -> FieldSyncResult<FieldPath> {
        let root_fields = self.directory.field_definitions(root_object).await?;
        self.open_selection(root_object, root_fields);
        for (level, segment) in path.segments().iter().enumerate() {
            if self.state == SelectionState::Resolvable {
                self.reset();
                return Err(rejected(
                    level,
                    format!("'{}' follows a terminal field", segment),
                ));
            }
            if let Err(e) = self.select_field(level, segment).await {
                self.reset();
                return Err(e);
            }
        }
        match self.confirm_selection() {
            Ok(resolved) => Ok(resolved),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn candidate(&self, level: usize, field_id: &str) -> FieldSyncResult<&FieldDefinition> {
        if !self.is_open() {
            return Err(rejected(level, "no selection is open"));
        }
        let path_level = self.levels.get(level).ok_or_else(|| {
            rejected(
                level,
                format!("level does not exist (depth {})", self.levels.len()),
            )
        })?;
        path_level.candidate(field_id).ok_or_else(|| {
            rejected(
                level,
                format!("'{}' is not a field of '{}'", field_id, path_level.object),
            )
        })
    }

    // The lookup happens before any state changes so a failed fetch leaves
    // the navigation state as it was.
    async fn descend(&mut self, level: usize, field: FieldDefinition, target: String) -> FieldSyncResult<()> {
        let next = self.directory.field_definitions(&target).await?;
        debug!(
            "Level {}: '{}' -> '{}' ({} candidates)",
            level,
            field.api_name,
            target,
            next.len()
        );
        self.levels.truncate(level + 1);
        self.levels[level].chosen = Some(field);
        self.levels.push(PathLevel::new(target, next));
        self.state = SelectionState::Open;
        Ok(())
    }

    fn choose_terminal(&mut self, level: usize, field: FieldDefinition) {
        debug!("Level {}: terminal field '{}'", level, field.api_name);
        self.levels.truncate(level + 1);
        self.levels[level].chosen = Some(field);
        self.state = SelectionState::Resolvable;
    }

    fn reset(&mut self) {
        self.levels.clear();
        self.state = SelectionState::Closed;
    }
}
