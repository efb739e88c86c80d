//! In-memory seed and garden clusters for integration tests
//!
//! The fakes mimic the API server where the controller relies on it:
//! finalizer writes are rejected on a stale resourceVersion, a deleting Secret
//! disappears once its last finalizer is gone, and ShootState patches are
//! strategic merge patches with `spec.gardener` merged by `name`.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::ResourceExt;
use serde_json::{json, Value};

use shoot_secret_controller::client::{object_key, GardenClient, SeedClient, StoreError};
use shoot_secret_controller::constants::SECRET_FINALIZER;
use shoot_secret_controller::controller::reconciler::{Reconciler, ReconcilerConfig, SecretRef};
use shoot_secret_controller::crd::{
    Cluster, ClusterSpec, GardenerResourceData, ManagedResource, ManagedResourceSpec, ShootState,
    ShootStateSpec,
};

pub const SHOOT_NAMESPACE: &str = "shoot--dev--foo";
pub const PROJECT_NAMESPACE: &str = "garden-dev";
pub const SHOOT_NAME: &str = "foo";

fn next_version(current: Option<&str>) -> String {
    let current: u64 = current.and_then(|v| v.parse().ok()).unwrap_or(0);
    (current + 1).to_string()
}

fn matches_selector(labels: &BTreeMap<String, String>, selector: &str) -> bool {
    selector
        .split(',')
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => labels.get(key).map(String::as_str) == Some(value),
            None => labels.contains_key(term),
        })
}

#[derive(Debug, Default)]
pub struct FakeSeed {
    secrets: Mutex<BTreeMap<String, Secret>>,
    namespaces: Mutex<BTreeMap<String, Namespace>>,
    clusters: Mutex<BTreeMap<String, Cluster>>,
    managed_resources: Mutex<Vec<ManagedResource>>,
    priority_classes: Mutex<BTreeSet<String>>,
    get_secret_delay: Mutex<Option<Duration>>,
    pub finalizer_writes: AtomicUsize,
}

impl FakeSeed {
    pub fn insert_namespace(&self, name: &str, role: Option<&str>) {
        let mut value = json!({"metadata": {"name": name}});
        if let Some(role) = role {
            value["metadata"]["labels"] = json!({"gardener.cloud/role": role});
        }
        let namespace: Namespace = serde_json::from_value(value).unwrap();
        self.namespaces
            .lock()
            .unwrap()
            .insert(name.to_string(), namespace);
    }

    pub fn insert_cluster(&self, namespace: &str, last_operation_type: &str) {
        let cluster = Cluster::new(
            namespace,
            ClusterSpec {
                shoot: json!({
                    "metadata": {"name": SHOOT_NAME, "namespace": PROJECT_NAMESPACE},
                    "status": {"lastOperation": {"type": last_operation_type, "state": "Processing"}}
                }),
                ..ClusterSpec::default()
            },
        );
        self.clusters
            .lock()
            .unwrap()
            .insert(namespace.to_string(), cluster);
    }

    pub fn remove_cluster(&self, namespace: &str) {
        self.clusters.lock().unwrap().remove(namespace);
    }

    /// Store a Secret with the given data (plain text, encoded on insert)
    pub fn insert_secret(&self, namespace: &str, name: &str, data: &[(&str, &str)]) {
        let data: BTreeMap<String, k8s_openapi::ByteString> = data
            .iter()
            .map(|(k, v)| ((*k).to_string(), k8s_openapi::ByteString(v.as_bytes().to_vec())))
            .collect();
        let mut secret: Secret = serde_json::from_value(json!({
            "metadata": {
                "name": name,
                "namespace": namespace,
                "resourceVersion": "1",
                "labels": {"managed-by": "secrets-manager", "persist": "true"}
            }
        }))
        .unwrap();
        secret.data = Some(data);
        self.secrets
            .lock()
            .unwrap()
            .insert(object_key(namespace, name), secret);
    }

    pub fn update_secret_data(&self, namespace: &str, name: &str, data: &[(&str, &str)]) {
        let mut secrets = self.secrets.lock().unwrap();
        let secret = secrets.get_mut(&object_key(namespace, name)).unwrap();
        secret.data = Some(
            data.iter()
                .map(|(k, v)| ((*k).to_string(), k8s_openapi::ByteString(v.as_bytes().to_vec())))
                .collect(),
        );
        secret.metadata.resource_version =
            Some(next_version(secret.metadata.resource_version.as_deref()));
    }

    pub fn set_secret_finalizers(&self, namespace: &str, name: &str, finalizers: &[&str]) {
        let mut secrets = self.secrets.lock().unwrap();
        let secret = secrets.get_mut(&object_key(namespace, name)).unwrap();
        secret.metadata.finalizers = Some(finalizers.iter().map(|f| (*f).to_string()).collect());
    }

    /// Request deletion; the Secret stays while it has finalizers
    pub fn delete_secret(&self, namespace: &str, name: &str) {
        let mut secrets = self.secrets.lock().unwrap();
        let key = object_key(namespace, name);
        let Some(secret) = secrets.get_mut(&key) else {
            return;
        };
        if secret.finalizers().is_empty() {
            secrets.remove(&key);
            return;
        }
        let mut value = serde_json::to_value(&*secret).unwrap();
        value["metadata"]["deletionTimestamp"] = json!("2024-05-01T10:00:00Z");
        *secret = serde_json::from_value(value).unwrap();
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&object_key(namespace, name))
            .cloned()
    }

    pub fn has_finalizer(&self, namespace: &str, name: &str) -> bool {
        self.secret(namespace, name)
            .is_some_and(|s| s.finalizers().iter().any(|f| f == SECRET_FINALIZER))
    }

    pub fn set_get_secret_delay(&self, delay: Duration) {
        *self.get_secret_delay.lock().unwrap() = Some(delay);
    }

    pub fn insert_managed_resource(&self, namespace: &str, name: &str, origin: Option<&str>) {
        let mut resource = ManagedResource::new(name, ManagedResourceSpec::default());
        resource.metadata.namespace = Some(namespace.to_string());
        if let Some(origin) = origin {
            resource
                .metadata
                .labels
                .get_or_insert_with(BTreeMap::new)
                .insert("origin".to_string(), origin.to_string());
        }
        self.managed_resources.lock().unwrap().push(resource);
    }

    pub fn managed_resources(&self) -> Vec<ManagedResource> {
        self.managed_resources.lock().unwrap().clone()
    }

    pub fn remove_managed_resources(&self, namespace: &str) {
        self.managed_resources
            .lock()
            .unwrap()
            .retain(|r| r.namespace().as_deref() != Some(namespace));
    }

    pub fn insert_priority_class(&self, name: &str) {
        self.priority_classes.lock().unwrap().insert(name.to_string());
    }

    pub fn priority_classes(&self) -> Vec<String> {
        self.priority_classes.lock().unwrap().iter().cloned().collect()
    }

    fn write_finalizers(&self, secret: &Secret, finalizers: Vec<String>) -> Result<(), StoreError> {
        let namespace = secret.namespace().unwrap_or_default();
        let name = secret.name_any();
        let key = object_key(&namespace, &name);

        let mut secrets = self.secrets.lock().unwrap();
        let Some(stored) = secrets.get_mut(&key) else {
            return Err(StoreError::NotFound {
                kind: "Secret",
                key,
            });
        };
        if stored.metadata.resource_version != secret.metadata.resource_version {
            return Err(StoreError::Conflict {
                kind: "Secret",
                key,
                message: "the object has been modified".to_string(),
            });
        }

        self.finalizer_writes.fetch_add(1, Ordering::SeqCst);
        if stored.metadata.deletion_timestamp.is_some() && finalizers.is_empty() {
            secrets.remove(&key);
            return Ok(());
        }
        stored.metadata.finalizers = Some(finalizers);
        stored.metadata.resource_version =
            Some(next_version(stored.metadata.resource_version.as_deref()));
        Ok(())
    }
}

#[async_trait]
impl SeedClient for FakeSeed {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        let delay = *self.get_secret_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.secret(namespace, name))
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, StoreError> {
        Ok(self.namespaces.lock().unwrap().get(name).cloned())
    }

    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>, StoreError> {
        Ok(self.clusters.lock().unwrap().get(name).cloned())
    }

    async fn add_finalizer(&self, secret: &Secret, finalizer: &str) -> Result<(), StoreError> {
        let mut finalizers = secret.finalizers().to_vec();
        if finalizers.iter().any(|f| f == finalizer) {
            return Ok(());
        }
        finalizers.push(finalizer.to_string());
        self.write_finalizers(secret, finalizers)
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
        self.write_finalizers(secret, finalizers)
    }

    async fn list_managed_resources(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ManagedResource>, StoreError> {
        Ok(self
            .managed_resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.namespace().as_deref() == Some(namespace))
            .filter(|r| matches_selector(r.labels(), label_selector))
            .cloned()
            .collect())
    }

    async fn delete_managed_resources(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<(), StoreError> {
        self.managed_resources.lock().unwrap().retain(|r| {
            r.namespace().as_deref() != Some(namespace)
                || !matches_selector(r.labels(), label_selector)
        });
        Ok(())
    }

    async fn set_keep_objects(
        &self,
        namespace: &str,
        name: &str,
        keep_objects: bool,
    ) -> Result<(), StoreError> {
        let mut resources = self.managed_resources.lock().unwrap();
        let resource = resources
            .iter_mut()
            .find(|r| r.namespace().as_deref() == Some(namespace) && r.name_any() == name)
            .ok_or_else(|| StoreError::NotFound {
                kind: "ManagedResource",
                key: object_key(namespace, name),
            })?;
        resource.spec.keep_objects = Some(keep_objects);
        Ok(())
    }

    async fn delete_priority_class(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.priority_classes.lock().unwrap().remove(name))
    }
}

type Interference = Box<dyn FnOnce(&mut BTreeMap<String, Value>) + Send>;

/// Garden cluster holding ShootStates as raw JSON documents
#[derive(Default)]
pub struct FakeGarden {
    shoot_states: Mutex<BTreeMap<String, Value>>,
    after_next_get: Mutex<Option<Interference>>,
    pub patches: Mutex<Vec<Value>>,
}

impl FakeGarden {
    pub fn insert_shoot_state(&self, entries: Vec<GardenerResourceData>) {
        let mut state = ShootState::new(
            SHOOT_NAME,
            ShootStateSpec {
                gardener: entries,
                ..ShootStateSpec::default()
            },
        );
        state.metadata.namespace = Some(PROJECT_NAMESPACE.to_string());
        state.metadata.resource_version = Some("1".to_string());
        self.shoot_states.lock().unwrap().insert(
            object_key(PROJECT_NAMESPACE, SHOOT_NAME),
            serde_json::to_value(state).unwrap(),
        );
    }

    pub fn remove_shoot_state(&self) {
        self.shoot_states
            .lock()
            .unwrap()
            .remove(&object_key(PROJECT_NAMESPACE, SHOOT_NAME));
    }

    /// Change the stored document behind the controller's back
    pub fn edit<F: FnOnce(&mut Value)>(&self, edit: F) {
        let mut states = self.shoot_states.lock().unwrap();
        let doc = states
            .get_mut(&object_key(PROJECT_NAMESPACE, SHOOT_NAME))
            .unwrap();
        edit(doc);
        touch(doc);
    }

    pub fn document(&self) -> Value {
        self.shoot_states
            .lock()
            .unwrap()
            .get(&object_key(PROJECT_NAMESPACE, SHOOT_NAME))
            .cloned()
            .unwrap()
    }

    pub fn entries(&self) -> Vec<GardenerResourceData> {
        serde_json::from_value(self.document()["spec"]["gardener"].clone()).unwrap_or_default()
    }

    pub fn entry(&self, name: &str) -> Option<GardenerResourceData> {
        self.entries().into_iter().find(|e| e.name == name)
    }

    pub fn patch_count(&self) -> usize {
        self.patches.lock().unwrap().len()
    }

    /// Let another writer change the stored ShootStates right after the next read
    pub fn after_next_get<F>(&self, interference: F)
    where
        F: FnOnce(&mut BTreeMap<String, Value>) + Send + 'static,
    {
        *self.after_next_get.lock().unwrap() = Some(Box::new(interference));
    }
}

/// Apply a strategic merge patch the way the API server does for ShootState
///
/// `spec.gardener` elements are matched by `name`; everything else follows
/// JSON merge patch semantics.
pub fn strategic_merge(doc: &mut Value, patch: &Value) {
    let mut patch = patch.clone();
    let elements = patch
        .get_mut("spec")
        .and_then(Value::as_object_mut)
        .and_then(|spec| spec.remove("gardener"));
    json_patch::merge(doc, &patch);

    let Some(Value::Array(elements)) = elements else {
        return;
    };
    let list = &mut doc["spec"]["gardener"];
    if !list.is_array() {
        *list = json!([]);
    }
    let list = list.as_array_mut().unwrap();
    for element in elements {
        let position = list.iter().position(|e| e["name"] == element["name"]);
        if element["$patch"] == "delete" {
            if let Some(index) = position {
                list.remove(index);
            }
            continue;
        }
        match position {
            Some(index) => json_patch::merge(&mut list[index], &element),
            None => list.push(element),
        }
    }
}

/// Bump the resourceVersion of a stored document
pub fn touch(doc: &mut Value) {
    let version = next_version(doc["metadata"]["resourceVersion"].as_str());
    doc["metadata"]["resourceVersion"] = json!(version);
}

#[async_trait]
impl GardenClient for FakeGarden {
    async fn get_shoot_state(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ShootState>, StoreError> {
        let key = object_key(namespace, name);
        let mut states = self.shoot_states.lock().unwrap();
        let result = states
            .get(&key)
            .map(|doc| serde_json::from_value(doc.clone()))
            .transpose()
            .map_err(|source| StoreError::Decode {
                kind: "ShootState",
                key,
                source,
            });
        if let Some(interference) = self.after_next_get.lock().unwrap().take() {
            interference(&mut states);
        }
        result
    }

    async fn patch_shoot_state(
        &self,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> Result<(), StoreError> {
        let key = object_key(namespace, name);
        self.patches.lock().unwrap().push(patch.clone());

        let mut states = self.shoot_states.lock().unwrap();
        let Some(stored) = states.get_mut(&key) else {
            return Err(StoreError::NotFound {
                kind: "ShootState",
                key,
            });
        };

        strategic_merge(stored, patch);
        touch(stored);
        Ok(())
    }
}

/// Seed and garden with one Shoot namespace and its ShootState
pub struct Fixture {
    pub seed: Arc<FakeSeed>,
    pub garden: Arc<FakeGarden>,
}

impl Fixture {
    pub fn new(last_operation_type: &str) -> Self {
        let seed = Arc::new(FakeSeed::default());
        seed.insert_namespace(SHOOT_NAMESPACE, Some("shoot"));
        seed.insert_cluster(SHOOT_NAMESPACE, last_operation_type);
        let garden = Arc::new(FakeGarden::default());
        garden.insert_shoot_state(Vec::new());
        Self { seed, garden }
    }

    pub fn reconciler(&self) -> Reconciler {
        self.reconciler_with(ReconcilerConfig::default())
    }

    pub fn reconciler_with(&self, config: ReconcilerConfig) -> Reconciler {
        Reconciler::new(
            Arc::clone(&self.seed) as Arc<dyn SeedClient>,
            Arc::clone(&self.garden) as Arc<dyn GardenClient>,
            config,
        )
    }
}

pub fn secret_ref(name: &str) -> SecretRef {
    SecretRef::new(SHOOT_NAMESPACE, name)
}

pub fn entry(name: &str, data: Value) -> GardenerResourceData {
    GardenerResourceData {
        name: name.to_string(),
        labels: BTreeMap::new(),
        type_: "secret".to_string(),
        data,
    }
}
