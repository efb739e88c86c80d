//! # Shoot
//!
//! Read-only view of a Shoot. Only the lifecycle markers are modeled; the spec
//! is kept opaque.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::constants::LAST_OPERATION_TYPE_MIGRATE;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shoot {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: serde_json::Value,
    #[serde(default)]
    pub status: Option<ShootStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootStatus {
    #[serde(default)]
    pub last_operation: Option<LastOperation>,
}

/// Last high-level operation recorded for the Shoot
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastOperation {
    /// Create, Reconcile, Delete, Migrate or Restore
    #[serde(rename = "type")]
    pub type_: String,
    /// Processing, Succeeded, Error, Failed, ...
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress: Option<i32>,
    #[serde(default)]
    pub last_update_time: Option<String>,
}

impl Shoot {
    #[must_use]
    pub fn last_operation_type(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.last_operation.as_ref())
            .map(|op| op.type_.as_str())
    }

    /// Whether the last recorded operation is a migration
    ///
    /// Only the operation type is checked: a migration that ended in `Failed`
    /// still counts.
    #[must_use]
    pub fn is_migrating(&self) -> bool {
        self.last_operation_type() == Some(LAST_OPERATION_TYPE_MIGRATE)
    }
}
