//! # Kubernetes Clients
//!
//! `kube::Api` backed implementations of [`SeedClient`] and [`GardenClient`].

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use k8s_openapi::api::scheduling::v1::PriorityClass;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams};
use kube::{Client, ResourceExt};
use tracing::debug;

use super::{object_key, GardenClient, SeedClient, StoreError};
use crate::constants::FIELD_MANAGER;
use crate::crd::{Cluster, ManagedResource, ShootState};

/// Seed cluster client
#[derive(Clone)]
pub struct KubeSeedClient {
    client: Client,
}

impl std::fmt::Debug for KubeSeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSeedClient").finish_non_exhaustive()
    }
}

impl KubeSeedClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Replace the Secret's finalizers, guarded by its resourceVersion
    ///
    /// A merge patch carrying `metadata.resourceVersion` is rejected with a
    /// conflict if the Secret changed since it was read.
    async fn patch_finalizers(
        &self,
        secret: &Secret,
        finalizers: Vec<String>,
    ) -> Result<(), StoreError> {
        let namespace = secret.namespace().unwrap_or_default();
        let name = secret.name_any();
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);

        let patch = serde_json::json!({
            "metadata": {
                "finalizers": finalizers,
                "resourceVersion": secret.resource_version(),
            }
        });

        api.patch(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await
            .map_err(|e| StoreError::from_kube("Secret", object_key(&namespace, &name), e))?;

        Ok(())
    }
}

#[async_trait]
impl SeedClient for KubeSeedClient {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .map_err(|e| StoreError::from_kube("Secret", object_key(namespace, name), e))
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, StoreError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        api.get_opt(name)
            .await
            .map_err(|e| StoreError::from_kube("Namespace", name, e))
    }

    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>, StoreError> {
        let api: Api<Cluster> = Api::all(self.client.clone());
        api.get_opt(name)
            .await
            .map_err(|e| StoreError::from_kube("Cluster", name, e))
    }

    async fn add_finalizer(&self, secret: &Secret, finalizer: &str) -> Result<(), StoreError> {
        let mut finalizers = secret.finalizers().to_vec();
        if finalizers.iter().any(|f| f == finalizer) {
            return Ok(());
        }
        finalizers.push(finalizer.to_string());
        self.patch_finalizers(secret, finalizers).await
    }

    async fn remove_finalizer(&self, secret: &Secret, finalizer: &str) -> Result<(), StoreError> {
        if !secret.finalizers().iter().any(|f| f == finalizer) {
            return Ok(());
        }
        let finalizers = secret
            .finalizers()
            .iter()
            .filter(|f| *f != finalizer)
            .cloned()
            .collect();
        self.patch_finalizers(secret, finalizers).await
    }

    async fn list_managed_resources(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ManagedResource>, StoreError> {
        let api: Api<ManagedResource> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(|e| StoreError::from_kube("ManagedResource", namespace, e))?;
        Ok(list.items)
    }

    async fn delete_managed_resources(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<(), StoreError> {
        let api: Api<ManagedResource> = Api::namespaced(self.client.clone(), namespace);
        api.delete_collection(
            &DeleteParams::default(),
            &ListParams::default().labels(label_selector),
        )
        .await
        .map_err(|e| StoreError::from_kube("ManagedResource", namespace, e))?;
        Ok(())
    }

    async fn set_keep_objects(
        &self,
        namespace: &str,
        name: &str,
        keep_objects: bool,
    ) -> Result<(), StoreError> {
        let api: Api<ManagedResource> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({
            "spec": {
                "keepObjects": keep_objects
            }
        });
        api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await
            .map_err(|e| StoreError::from_kube("ManagedResource", object_key(namespace, name), e))?;
        Ok(())
    }

    async fn delete_priority_class(&self, name: &str) -> Result<bool, StoreError> {
        let api: Api<PriorityClass> = Api::all(self.client.clone());
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                debug!(priority_class = name, "PriorityClass already gone");
                Ok(false)
            }
            Err(e) => Err(StoreError::from_kube("PriorityClass", name, e)),
        }
    }
}

/// Garden cluster client
#[derive(Clone)]
pub struct KubeGardenClient {
    client: Client,
}

impl std::fmt::Debug for KubeGardenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeGardenClient").finish_non_exhaustive()
    }
}

impl KubeGardenClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GardenClient for KubeGardenClient {
    async fn get_shoot_state(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ShootState>, StoreError> {
        let api: Api<ShootState> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .map_err(|e| StoreError::from_kube("ShootState", object_key(namespace, name), e))
    }

    async fn patch_shoot_state(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let api: Api<ShootState> = Api::namespaced(self.client.clone(), namespace);
        api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Strategic(patch))
        .await
        .map_err(|e| StoreError::from_kube("ShootState", object_key(namespace, name), e))?;
        Ok(())
    }
}
