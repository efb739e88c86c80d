//! # ShootState
//!
//! Aggregate record in the garden cluster holding the recoverable state of a Shoot.

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ShootState specification
///
/// Only `gardener` is written by this controller. `extensions` and `resources`
/// belong to other writers and are carried through untouched.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    group = "core.gardener.cloud",
    version = "v1alpha1",
    kind = "ShootState",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ShootStateSpec {
    /// Data persisted by gardener itself (secrets, certificates, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gardener: Vec<GardenerResourceData>,
    /// State persisted by extension controllers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<serde_json::Value>,
    /// Resources referenced by extension state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<serde_json::Value>,
}

/// One named entry of `spec.gardener`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GardenerResourceData {
    /// Name of the entry, unique within the list
    pub name: String,
    /// Labels copied from the source object
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Kind of data stored in the entry
    #[serde(rename = "type")]
    pub type_: String,
    /// Opaque serialized payload
    #[serde(default)]
    pub data: serde_json::Value,
}
