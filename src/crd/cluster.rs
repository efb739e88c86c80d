//! # Cluster
//!
//! Cluster-scoped resource in the seed, named after the Shoot's control-plane
//! namespace, which embeds the Shoot (and its CloudProfile and Seed) as raw objects.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

use super::Shoot;

#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    group = "extensions.gardener.cloud",
    version = "v1alpha1",
    kind = "Cluster"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(default)]
    pub cloud_profile: serde_json::Value,
    #[serde(default)]
    pub seed: serde_json::Value,
    #[serde(default)]
    pub shoot: serde_json::Value,
}

impl Cluster {
    /// Decode the embedded Shoot
    ///
    /// Returns `Ok(None)` when the Cluster carries no Shoot.
    pub fn shoot(&self) -> Result<Option<Shoot>, serde_json::Error> {
        if self.spec.shoot.is_null() {
            return Ok(None);
        }
        serde_json::from_value(self.spec.shoot.clone()).map(Some)
    }
}
