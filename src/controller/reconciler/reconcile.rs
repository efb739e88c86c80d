//! # Reconciliation Logic
//!
//! State machine deciding, per Secret event, whether the Secret's ShootState
//! entry is upserted, removed or kept, and whether the finalizer is added or
//! released.
//!
//! ## Flow
//!
//! 1. Secret gone: nothing to do
//! 2. Namespace is not a Shoot control-plane namespace: nothing to do
//! 3. ShootState or Cluster gone: release the finalizer, nothing else
//! 4. Secret live: ensure finalizer, upsert entry
//! 5. Secret deleting: remove entry unless the Shoot is migrating, then
//!    release the finalizer

use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::ResourceExt;
use serde_json::Value;
use tracing::{debug, info};

use super::types::{Outcome, Reconciler, ReconcilerError, Retention, SecretPhase, SecretRef};
use crate::client::StoreError;
use crate::constants::{GARDEN_ROLE_SHOOT, LABEL_GARDEN_ROLE, RESOURCE_DATA_TYPE_SECRET};
use crate::controller::data_list::GardenerResourceDataList;
use crate::controller::patch;
use crate::controller::state::get_shoot_state_for_cluster;
use crate::crd::{GardenerResourceData, ShootState};

/// Canonical payload stored for a Secret
///
/// The data map serialized as JSON with sorted keys and base64 values;
/// `null` when the Secret has no data.
pub fn encode_payload(secret: &Secret) -> Result<Value, serde_json::Error> {
    serde_json::to_value(&secret.data)
}

fn is_shoot_namespace(namespace: &Namespace) -> bool {
    namespace.labels().get(LABEL_GARDEN_ROLE).map(String::as_str) == Some(GARDEN_ROLE_SHOOT)
}

impl Reconciler {
    /// [`Reconciler::handle`] bounded by the configured reconcile timeout
    ///
    /// Changes made before the deadline are kept; the retry picks up from there.
    pub async fn handle_with_deadline(
        &self,
        secret_ref: &SecretRef,
    ) -> Result<Outcome, ReconcilerError> {
        let timeout = self.config.reconcile_timeout;
        tokio::time::timeout(timeout, self.handle(secret_ref))
            .await
            .unwrap_or_else(|_| {
                Err(ReconcilerError::Timeout {
                    key: secret_ref.to_string(),
                    timeout,
                })
            })
    }

    /// Reconcile the Secret identified by `secret_ref`
    ///
    /// `Ok` means no requeue is needed. Any error should be retried with
    /// backoff; partial changes (finalizer added, ShootState patched) are not
    /// rolled back and are idempotent on retry.
    pub async fn handle(&self, secret_ref: &SecretRef) -> Result<Outcome, ReconcilerError> {
        let key = secret_ref.to_string();

        let Some(secret) = self
            .seed
            .get_secret(&secret_ref.namespace, &secret_ref.name)
            .await
            .map_err(|source| ReconcilerError::GetSecret {
                key: key.clone(),
                source,
            })?
        else {
            debug!(secret = %key, "Object is gone, stop reconciling");
            return Ok(Outcome::Gone);
        };

        let namespace = self
            .seed
            .get_namespace(&secret_ref.namespace)
            .await
            .and_then(|ns| {
                ns.ok_or_else(|| StoreError::NotFound {
                    kind: "Namespace",
                    key: secret_ref.namespace.clone(),
                })
            })
            .map_err(|source| ReconcilerError::GetNamespace {
                namespace: secret_ref.namespace.clone(),
                source,
            })?;
        if !is_shoot_namespace(&namespace) {
            debug!(secret = %key, "Namespace is not a Shoot namespace, ignoring Secret");
            return Ok(Outcome::OutOfScope);
        }

        let (shoot_state, shoot) = match get_shoot_state_for_cluster(
            self.seed.as_ref(),
            self.garden.as_ref(),
            &secret_ref.namespace,
        )
        .await
        {
            Ok(pair) => pair,
            Err(e) if e.is_not_found() => {
                // The state record is never recreated once gone, so the
                // Secret must not be held back by it.
                debug!(secret = %key, reason = %e, "ShootState is gone");
                let finalizer_released = self.release_finalizer(&secret, &key).await?;
                return Ok(Outcome::StateRecordGone { finalizer_released });
            }
            Err(source) => {
                return Err(ReconcilerError::LookupState {
                    namespace: secret_ref.namespace.clone(),
                    source,
                })
            }
        };

        match SecretPhase::of(&secret, &shoot) {
            SecretPhase::Live => self.reconcile_live(&secret, &key, shoot_state).await,
            SecretPhase::Deleting(retention) => {
                self.reconcile_deletion(&secret, &key, shoot_state, retention)
                    .await
            }
        }
    }

    async fn reconcile_live(
        &self,
        secret: &Secret,
        key: &str,
        shoot_state: ShootState,
    ) -> Result<Outcome, ReconcilerError> {
        info!(secret = %key, "Reconciling secret information in ShootState and ensuring its finalizer");

        if !self.has_finalizer(secret) {
            info!(secret = %key, finalizer = %self.config.finalizer, "Adding finalizer");
            self.seed
                .add_finalizer(secret, &self.config.finalizer)
                .await
                .map_err(|source| ReconcilerError::AddFinalizer {
                    key: key.to_string(),
                    source,
                })?;
        }

        let data = encode_payload(secret).map_err(|source| ReconcilerError::EncodePayload {
            key: key.to_string(),
            source,
        })?;

        let mut mutated = shoot_state.clone();
        let mut data_list = GardenerResourceDataList::new(std::mem::take(&mut mutated.spec.gardener));
        data_list.upsert(GardenerResourceData {
            name: secret.name_any(),
            labels: secret.labels().clone(),
            type_: RESOURCE_DATA_TYPE_SECRET.to_string(),
            data,
        });
        mutated.spec.gardener = data_list.into_inner();

        let patched = self.commit(key, &shoot_state, &mutated).await?;
        Ok(Outcome::Synced { patched })
    }

    async fn reconcile_deletion(
        &self,
        secret: &Secret,
        key: &str,
        shoot_state: ShootState,
        retention: Retention,
    ) -> Result<Outcome, ReconcilerError> {
        let outcome = match retention {
            Retention::Keep => {
                info!(
                    secret = %key,
                    "Keeping Secret in ShootState since Shoot is in migration but releasing the finalizer"
                );
                Outcome::Retained
            }
            Retention::Prune => {
                info!(secret = %key, "Removing Secret from ShootState and releasing its finalizer");

                let mut mutated = shoot_state.clone();
                let mut data_list =
                    GardenerResourceDataList::new(std::mem::take(&mut mutated.spec.gardener));
                data_list.delete(&secret.name_any());
                mutated.spec.gardener = data_list.into_inner();

                let patched = self.commit(key, &shoot_state, &mutated).await?;
                Outcome::Pruned { patched }
            }
        };

        self.release_finalizer(secret, key).await?;
        Ok(outcome)
    }

    async fn commit(
        &self,
        key: &str,
        baseline: &ShootState,
        mutated: &ShootState,
    ) -> Result<bool, ReconcilerError> {
        patch::commit(self.garden.as_ref(), baseline, mutated)
            .await
            .map_err(|source| ReconcilerError::CommitShootState {
                key: key.to_string(),
                source,
            })
    }

    fn has_finalizer(&self, secret: &Secret) -> bool {
        secret
            .finalizers()
            .iter()
            .any(|f| *f == self.config.finalizer)
    }

    /// Remove the finalizer if present, returns whether it was removed
    async fn release_finalizer(&self, secret: &Secret, key: &str) -> Result<bool, ReconcilerError> {
        if !self.has_finalizer(secret) {
            return Ok(false);
        }
        info!(secret = %key, finalizer = %self.config.finalizer, "Removing finalizer");
        self.seed
            .remove_finalizer(secret, &self.config.finalizer)
            .await
            .map_err(|source| ReconcilerError::RemoveFinalizer {
                key: key.to_string(),
                source,
            })?;
        Ok(true)
    }
}
