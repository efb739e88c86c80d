//! # State Record Accessor
//!
//! Resolves a Shoot control-plane namespace in the seed to the Shoot's
//! lifecycle descriptor and its ShootState in the garden.
//!
//! Resolution goes through the seed's `Cluster` resource (named after the
//! namespace), which embeds the Shoot. The ShootState has the same name and
//! namespace as the Shoot.
//!
//! ## Deletion ordering
//!
//! The `Cluster` and the ShootState of a Shoot are only deleted after the
//! Shoot's control plane (and therefore every Secret in the namespace) is
//! being torn down, and they are never recreated for that namespace. A
//! [`StateLookupError::NotFound`] is therefore final: callers must not wait
//! for the record to come back, and must not block Secret deletion on it.

use thiserror::Error;

use crate::client::{object_key, GardenClient, SeedClient, StoreError};
use crate::crd::{Shoot, ShootState};

#[derive(Debug, Error)]
pub enum StateLookupError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },
    #[error("Cluster {0} does not contain a Shoot")]
    MissingShoot(String),
    #[error("failed to decode Shoot embedded in Cluster {cluster}: {source}")]
    DecodeShoot {
        cluster: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(StoreError),
}

impl StateLookupError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for StateLookupError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { kind, key } => Self::NotFound { kind, key },
            other => Self::Store(other),
        }
    }
}

/// Fetch the ShootState and Shoot for the seed namespace `namespace`
pub async fn get_shoot_state_for_cluster(
    seed: &dyn SeedClient,
    garden: &dyn GardenClient,
    namespace: &str,
) -> Result<(ShootState, Shoot), StateLookupError> {
    let cluster = seed
        .get_cluster(namespace)
        .await?
        .ok_or_else(|| StateLookupError::NotFound {
            kind: "Cluster",
            key: namespace.to_string(),
        })?;

    let shoot = cluster
        .shoot()
        .map_err(|source| StateLookupError::DecodeShoot {
            cluster: namespace.to_string(),
            source,
        })?
        .ok_or_else(|| StateLookupError::MissingShoot(namespace.to_string()))?;

    let shoot_namespace = shoot.metadata.namespace.clone().unwrap_or_default();
    let shoot_name = shoot.metadata.name.clone().unwrap_or_default();

    let shoot_state = garden
        .get_shoot_state(&shoot_namespace, &shoot_name)
        .await?
        .ok_or_else(|| StateLookupError::NotFound {
            kind: "ShootState",
            key: object_key(&shoot_namespace, &shoot_name),
        })?;

    Ok((shoot_state, shoot))
}
