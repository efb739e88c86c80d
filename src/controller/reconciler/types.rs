//! # Types
//!
//! Core types for the reconciler.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::Secret;
use thiserror::Error;

use crate::client::{GardenClient, SeedClient, StoreError};
use crate::constants::{DEFAULT_RECONCILE_TIMEOUT_SECS, SECRET_FINALIZER};
use crate::controller::patch::CommitError;
use crate::controller::state::StateLookupError;
use crate::crd::Shoot;

/// Reconciliation failures, one variant per step
///
/// Every variant is retryable: the caller requeues the Secret with backoff.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to retrieve Secret {key}: {source}")]
    GetSecret {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to retrieve Namespace {namespace}: {source}")]
    GetNamespace {
        namespace: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to resolve ShootState for namespace {namespace}: {source}")]
    LookupState {
        namespace: String,
        #[source]
        source: StateLookupError,
    },
    #[error("failed to add finalizer to Secret {key}: {source}")]
    AddFinalizer {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to remove finalizer from Secret {key}: {source}")]
    RemoveFinalizer {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to serialize data of Secret {key}: {source}")]
    EncodePayload {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to update ShootState for Secret {key}: {source}")]
    CommitShootState {
        key: String,
        #[source]
        source: CommitError,
    },
    #[error("reconciliation of Secret {key} did not finish within {timeout:?}")]
    Timeout { key: String, timeout: Duration },
}

impl ReconcilerError {
    /// Step that failed, used as a metrics label
    #[must_use]
    pub fn step(&self) -> &'static str {
        match self {
            Self::GetSecret { .. } => "get_secret",
            Self::GetNamespace { .. } => "get_namespace",
            Self::LookupState { .. } => "lookup_state",
            Self::AddFinalizer { .. } => "add_finalizer",
            Self::RemoveFinalizer { .. } => "remove_finalizer",
            Self::EncodePayload { .. } => "encode_payload",
            Self::CommitShootState { .. } => "commit_shoot_state",
            Self::Timeout { .. } => "timeout",
        }
    }
}

/// Identity of the Secret a reconciliation was requested for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRef {
    pub namespace: String,
    pub name: String,
}

impl SecretRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// What happens to the ShootState entry of a Secret being deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Remove the entry
    Prune,
    /// Keep the entry so the next owning seed can restore it
    Keep,
}

/// Phase of a Secret, derived from its fields and its Shoot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPhase {
    Live,
    Deleting(Retention),
}

impl SecretPhase {
    /// Classify the Secret
    ///
    /// A Secret under deletion keeps its entry whenever the Shoot's last
    /// operation type is `Migrate`, whatever that operation's state is.
    #[must_use]
    pub fn of(secret: &Secret, shoot: &Shoot) -> Self {
        if secret.metadata.deletion_timestamp.is_none() {
            return Self::Live;
        }
        if shoot.is_migrating() {
            Self::Deleting(Retention::Keep)
        } else {
            Self::Deleting(Retention::Prune)
        }
    }
}

/// Terminal result of one reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The Secret no longer exists
    Gone,
    /// The Secret is not in a Shoot control-plane namespace
    OutOfScope,
    /// The Shoot's state record is gone; the finalizer was released if present
    StateRecordGone { finalizer_released: bool },
    /// The entry was upserted; `patched` is false if it was already current
    Synced { patched: bool },
    /// The Secret is being deleted and its entry was removed
    Pruned { patched: bool },
    /// The Secret is being deleted during a migration and its entry was kept
    Retained,
}

impl Outcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gone => "gone",
            Self::OutOfScope => "out_of_scope",
            Self::StateRecordGone { .. } => "state_record_gone",
            Self::Synced { .. } => "synced",
            Self::Pruned { .. } => "pruned",
            Self::Retained => "retained",
        }
    }
}

/// Reconciler settings
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Finalizer owned by this controller
    pub finalizer: String,
    /// Deadline of a single reconciliation
    pub reconcile_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            finalizer: SECRET_FINALIZER.to_string(),
            reconcile_timeout: Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
        }
    }
}

/// Mirrors Shoot Secrets into their ShootState
///
/// Holds no mutable state: concurrent invocations for different Secrets are
/// independent of each other.
#[derive(Clone)]
pub struct Reconciler {
    pub(crate) seed: Arc<dyn SeedClient>,
    pub(crate) garden: Arc<dyn GardenClient>,
    pub(crate) config: ReconcilerConfig,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        seed: Arc<dyn SeedClient>,
        garden: Arc<dyn GardenClient>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            seed,
            garden,
            config,
        }
    }
}
