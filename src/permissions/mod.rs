// permissions module

use crate::error::{FieldSyncError, FieldSyncResult};
use serde::{Deserialize, Serialize};

/// Access level of the operator driving a mapping or settings session.
///
/// Passed explicitly through configuration; the UI layer disables mutating
/// controls for read-only operators and the core re-checks before every
/// mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Authorization {
    /// May edit and save mappings and settings
    #[default]
    Admin,
    /// May only inspect
    ReadOnly,
}

impl Authorization {
    #[must_use]
    pub fn can_mutate(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Fails with `PermissionDenied` naming the operation when mutation is not allowed.
    pub fn ensure_can_mutate(self, operation: &str) -> FieldSyncResult<()> {
        if self.can_mutate() {
            Ok(())
        } else {
            log::warn!("Rejected '{}' for read-only operator", operation);
            Err(FieldSyncError::PermissionDenied(format!(
                "'{}' requires admin authorization",
                operation
            )))
        }
    }
}
