//! # Clients
//!
//! Traits abstracting the two clusters the controller talks to.
//!
//! - [`SeedClient`] - Secrets, Namespaces, `Cluster` and `ManagedResource` objects
//!   and priority classes in the seed cluster
//! - [`GardenClient`] - `ShootState` records in the garden cluster
//!
//! The reconciler only depends on these traits, so it can be exercised against
//! mocks and in-memory fakes. [`KubeSeedClient`] and [`KubeGardenClient`] are the
//! production implementations backed by `kube::Api`.

mod kubernetes;

pub use kubernetes::{KubeGardenClient, KubeSeedClient};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use thiserror::Error;

use crate::crd::{Cluster, ManagedResource, ShootState};

#[cfg(test)]
use mockall::automock;

/// Errors returned by the cluster clients
///
/// "Not found" is kept distinct from every other failure so callers can treat
/// a vanished object as a normal outcome.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },
    #[error("conflicting update of {kind} {key}: {message}")]
    Conflict {
        kind: &'static str,
        key: String,
        message: String,
    },
    #[error("failed to decode {kind} {key}: {source}")]
    Decode {
        kind: &'static str,
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Kubernetes API request for {kind} {key} failed: {source}")]
    Api {
        kind: &'static str,
        key: String,
        #[source]
        source: kube::Error,
    },
}

impl StoreError {
    /// Classify a `kube::Error` for the object `kind` identified by `key`
    pub fn from_kube(kind: &'static str, key: impl Into<String>, error: kube::Error) -> Self {
        let key = key.into();
        match error {
            kube::Error::Api(ref response) if response.code == 404 => Self::NotFound { kind, key },
            kube::Error::Api(ref response) if response.code == 409 || response.code == 422 => {
                Self::Conflict {
                    kind,
                    key,
                    message: response.message.clone(),
                }
            }
            source => Self::Api { kind, key, source },
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Operations against the seed cluster
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SeedClient: Send + Sync {
    /// Get a Secret, `None` if it does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError>;

    /// Get a Namespace, `None` if it does not exist
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, StoreError>;

    /// Get the `Cluster` resource for a Shoot control-plane namespace
    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>, StoreError>;

    /// Add `finalizer` to the Secret
    ///
    /// Idempotent: no request is sent if the finalizer is already present.
    async fn add_finalizer(&self, secret: &Secret, finalizer: &str) -> Result<(), StoreError>;

    /// Remove `finalizer` from the Secret
    ///
    /// Idempotent: no request is sent if the finalizer is absent.
    async fn remove_finalizer(&self, secret: &Secret, finalizer: &str) -> Result<(), StoreError>;

    /// List ManagedResources in `namespace` matching `label_selector`
    async fn list_managed_resources(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ManagedResource>, StoreError>;

    /// Delete every ManagedResource in `namespace` matching `label_selector`
    async fn delete_managed_resources(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<(), StoreError>;

    /// Set `spec.keepObjects` of a ManagedResource
    async fn set_keep_objects(
        &self,
        namespace: &str,
        name: &str,
        keep_objects: bool,
    ) -> Result<(), StoreError>;

    /// Delete a PriorityClass, returns `false` if it did not exist
    async fn delete_priority_class(&self, name: &str) -> Result<bool, StoreError>;
}

/// Operations against the garden cluster
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GardenClient: Send + Sync {
    /// Get a ShootState, `None` if it does not exist
    async fn get_shoot_state(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ShootState>, StoreError>;

    /// Apply a strategic merge patch to a ShootState
    async fn patch_shoot_state(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<(), StoreError>;
}

/// `namespace/name` key used in logs and errors
#[must_use]
pub fn object_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}
