//! # ManagedResources
//!
//! Operations on the ManagedResources labelled `origin=gardener` in a Shoot
//! control-plane namespace.

use std::time::Duration;

use kube::ResourceExt;
use tracing::{debug, info};

use super::MaintenanceError;
use crate::client::SeedClient;
use crate::constants::{LABEL_KEY_ORIGIN, LABEL_VALUE_GARDENER, MANAGED_RESOURCE_POLL_INTERVAL_SECS};

fn gardener_selector() -> String {
    format!("{LABEL_KEY_ORIGIN}={LABEL_VALUE_GARDENER}")
}

/// Delete every gardener-owned ManagedResource in `namespace`
pub async fn delete_managed_resources(
    seed: &dyn SeedClient,
    namespace: &str,
) -> Result<(), MaintenanceError> {
    info!(namespace, "Deleting managed resources");
    seed.delete_managed_resources(namespace, &gardener_selector())
        .await
        .map_err(|source| MaintenanceError::DeleteManagedResources {
            namespace: namespace.to_string(),
            source,
        })
}

/// Poll until no gardener-owned ManagedResource is left in `namespace`
///
/// Fails with [`MaintenanceError::WaitTimeout`] if resources are still listed
/// by the final poll at `timeout`.
pub async fn wait_until_managed_resources_deleted(
    seed: &dyn SeedClient,
    namespace: &str,
    timeout: Duration,
) -> Result<(), MaintenanceError> {
    let selector = gardener_selector();
    let poll_interval = Duration::from_secs(MANAGED_RESOURCE_POLL_INTERVAL_SECS);
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let remaining = seed
            .list_managed_resources(namespace, &selector)
            .await
            .map_err(|source| MaintenanceError::ListManagedResources {
                namespace: namespace.to_string(),
                source,
            })?;

        if remaining.is_empty() {
            info!(namespace, "All managed resources are gone");
            return Ok(());
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Err(MaintenanceError::WaitTimeout {
                namespace: namespace.to_string(),
                remaining: remaining.len(),
                timeout,
            });
        }

        debug!(
            namespace,
            remaining = remaining.len(),
            "Waiting for managed resources to be deleted"
        );
        // The last poll lands exactly on the deadline
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

/// Set `spec.keepObjects=true` on every gardener-owned ManagedResource in `namespace`
///
/// Stops at the first failure.
pub async fn keep_objects_for_managed_resources(
    seed: &dyn SeedClient,
    namespace: &str,
) -> Result<(), MaintenanceError> {
    let resources = seed
        .list_managed_resources(namespace, &gardener_selector())
        .await
        .map_err(|source| MaintenanceError::ListManagedResources {
            namespace: namespace.to_string(),
            source,
        })?;

    for resource in &resources {
        let name = resource.name_any();
        let resource_namespace = resource
            .namespace()
            .unwrap_or_else(|| namespace.to_string());
        seed.set_keep_objects(&resource_namespace, &name, true)
            .await
            .map_err(|source| MaintenanceError::SetKeepObjects {
                namespace: resource_namespace.clone(),
                name: name.clone(),
                source,
            })?;
        debug!(namespace = %resource_namespace, name = %name, "Set keepObjects");
    }

    info!(namespace, count = resources.len(), "Kept objects of managed resources");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockSeedClient, StoreError};
    use crate::crd::{ManagedResource, ManagedResourceSpec};
    use mockall::predicate::eq;

    fn managed_resource(name: &str) -> ManagedResource {
        let mut resource = ManagedResource::new(name, ManagedResourceSpec::default());
        resource.metadata.namespace = Some("shoot--dev--foo".to_string());
        resource
    }

    #[tokio::test]
    async fn test_delete_uses_origin_selector() {
        let mut seed = MockSeedClient::new();
        seed.expect_delete_managed_resources()
            .with(eq("shoot--dev--foo"), eq("origin=gardener"))
            .times(1)
            .returning(|_, _| Ok(()));

        delete_managed_resources(&seed, "shoot--dev--foo").await.unwrap();
    }

    #[tokio::test]
    async fn test_keep_objects_list_failure_has_context() {
        let mut seed = MockSeedClient::new();
        seed.expect_list_managed_resources().returning(|namespace, _| {
            Err(StoreError::Conflict {
                kind: "ManagedResource",
                key: namespace.to_string(),
                message: "storage is re-initializing".to_string(),
            })
        });
        seed.expect_set_keep_objects().never();

        let err = keep_objects_for_managed_resources(&seed, "shoot--dev--foo")
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("failed to list all managed resources in namespace shoot--dev--foo"));
    }

    #[tokio::test]
    async fn test_keep_objects_stops_at_first_failure() {
        let mut seed = MockSeedClient::new();
        seed.expect_list_managed_resources()
            .returning(|_, _| Ok(vec![managed_resource("a"), managed_resource("b")]));
        seed.expect_set_keep_objects()
            .with(eq("shoot--dev--foo"), eq("a"), eq(true))
            .times(1)
            .returning(|namespace, name, _| {
                Err(StoreError::NotFound {
                    kind: "ManagedResource",
                    key: format!("{namespace}/{name}"),
                })
            });

        let err = keep_objects_for_managed_resources(&seed, "shoot--dev--foo")
            .await
            .unwrap_err();
        assert!(matches!(err, MaintenanceError::SetKeepObjects { ref name, .. } if name == "a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_while_resources_remain() {
        let mut seed = MockSeedClient::new();
        // polls at 0s, 5s, 10s and a final one at 12s
        seed.expect_list_managed_resources()
            .times(4)
            .returning(|_, _| Ok(vec![managed_resource("a")]));

        let err = wait_until_managed_resources_deleted(&seed, "shoot--dev--foo", Duration::from_secs(12))
            .await
            .unwrap_err();
        assert!(matches!(err, MaintenanceError::WaitTimeout { remaining: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_checks_once_more_at_deadline() {
        let start = tokio::time::Instant::now();
        let mut polls = 0;
        let mut seed = MockSeedClient::new();
        seed.expect_list_managed_resources()
            .times(4)
            .returning(move |_, _| {
                polls += 1;
                if polls < 4 {
                    Ok(vec![managed_resource("a")])
                } else {
                    Ok(Vec::new())
                }
            });

        wait_until_managed_resources_deleted(&seed, "shoot--dev--foo", Duration::from_secs(12))
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(12));
    }
}
