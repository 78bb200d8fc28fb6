//! Organization settings editor
//!
//! Turns the custom fields of a settings object into typed input controls,
//! holds the edited values, validates them against the controls and saves
//! them through a [`SettingsStore`].

pub mod controls;
pub mod store;

pub use controls::InputControl;
pub use store::{InMemorySettingsStore, SettingsStore, SettingsValues};

use crate::error::{FieldSyncError, FieldSyncResult};
use crate::notify::{NotificationKind, Notifier};
use crate::permissions::Authorization;
use crate::schema::directory::SchemaDirectory;
use crate::schema::types::FieldDefinition;
use log::{info, warn};
use serde_json::Value;
use std::sync::Arc;

/// Message sent after settings are saved
pub const SETTINGS_SAVED_MESSAGE: &str = "Settings saved";

/// One editable row of the form
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub definition: FieldDefinition,
    pub control: InputControl,
}

pub struct SettingsForm {
    settings_object: String,
    authorization: Authorization,
    store: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    fields: Vec<FormField>,
    values: SettingsValues,
}

impl SettingsForm {
    /// Fetch the field definitions and current values of `settings_object`
    pub async fn load(
        settings_object: &str,
        authorization: Authorization,
        directory: Arc<dyn SchemaDirectory>,
        store: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> FieldSyncResult<Self> {
        let (definitions, values) = futures::try_join!(
            directory.field_definitions(settings_object),
            store.load_settings(settings_object)
        )?;

        let fields: Vec<FormField> = definitions
            .into_iter()
            .filter(FieldDefinition::is_custom)
            .map(|definition| FormField {
                control: InputControl::for_field(&definition),
                definition,
            })
            .collect();

        info!(
            "Loaded settings form for '{}' with {} custom fields",
            settings_object,
            fields.len()
        );
        Ok(Self {
            settings_object: settings_object.to_string(),
            authorization,
            store,
            notifier,
            fields,
            values,
        })
    }

    pub fn settings_object(&self) -> &str {
        &self.settings_object
    }

    /// Whether inputs should be disabled
    pub fn is_read_only(&self) -> bool {
        !self.authorization.can_mutate()
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn values(&self) -> &SettingsValues {
        &self.values
    }

    fn field(&self, name: &str) -> FieldSyncResult<&FormField> {
        self.fields
            .iter()
            .find(|field| field.definition.api_name == name)
            .ok_or_else(|| FieldSyncError::InvalidField(name.to_string()))
    }

    /// Record an edited value; checked against its control only on validate
    pub fn set_value(&mut self, field: &str, value: Value) -> FieldSyncResult<()> {
        self.authorization.ensure_can_mutate("edit settings")?;
        if !self.field(field)?.control.is_editable() {
            return Err(FieldSyncError::InvalidField(format!("{} is read-only", field)));
        }
        self.values.insert(field.to_string(), value);
        Ok(())
    }

    /// One message per invalid value
    pub fn validate(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter_map(|field| {
                let value = self.values.get(&field.definition.api_name)?;
                field
                    .control
                    .check(value)
                    .err()
                    .map(|problem| format!("{}: {}", field.definition.label, problem))
            })
            .collect()
    }

    /// Validate, persist, reload the stored values and notify.
    ///
    /// A failed reload after a successful save is logged, not returned.
    pub async fn save(&mut self) -> FieldSyncResult<()> {
        self.authorization.ensure_can_mutate("save settings")?;

        let problems = self.validate();
        if !problems.is_empty() {
            warn!("Refusing to save settings '{}': {:?}", self.settings_object, problems);
            return Err(FieldSyncError::Validation(problems));
        }

        if let Err(e) = self.store.save_settings(&self.settings_object, &self.values).await {
            warn!("Saving settings '{}' failed: {}", self.settings_object, e);
            self.notifier
                .notify(NotificationKind::Error, &format!("Saving settings failed: {}", e));
            return Err(e.into());
        }

        match self.store.load_settings(&self.settings_object).await {
            Ok(values) => self.values = values,
            Err(e) => warn!(
                "Settings '{}' saved but reloading them failed, keeping edited values: {}",
                self.settings_object, e
            ),
        }
        self.notifier
            .notify(NotificationKind::Success, SETTINGS_SAVED_MESSAGE);
        info!("Saved settings '{}'", self.settings_object);
        Ok(())
    }
}
