use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Field api name to stored value
pub type SettingsValues = BTreeMap<String, Value>;

/// Persistence of organization-wide settings records
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current values; an object never saved yields an empty map
    async fn load_settings(&self, settings_object: &str) -> Result<SettingsValues, TransportError>;

    async fn save_settings(&self, settings_object: &str, values: &SettingsValues) -> Result<(), TransportError>;
}

#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    objects: Mutex<HashMap<String, SettingsValues>>,
    fail_saves: Mutex<bool>,
    fail_loads: Mutex<bool>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(self, settings_object: &str, values: SettingsValues) -> Self {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(settings_object.to_string(), values);
        self
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self
            .fail_saves
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = fail;
    }

    pub fn set_fail_loads(&self, fail: bool) {
        *self
            .fail_loads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = fail;
    }

    pub fn values(&self, settings_object: &str) -> Option<SettingsValues> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(settings_object)
            .cloned()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load_settings(&self, settings_object: &str) -> Result<SettingsValues, TransportError> {
        if *self
            .fail_loads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
        {
            return Err(TransportError::RequestFailed("load refused".to_string()));
        }
        Ok(self.values(settings_object).unwrap_or_default())
    }

    async fn save_settings(&self, settings_object: &str, values: &SettingsValues) -> Result<(), TransportError> {
        if *self
            .fail_saves
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
        {
            return Err(TransportError::RequestFailed("save refused".to_string()));
        }
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(settings_object.to_string(), values.clone());
        Ok(())
    }
}
