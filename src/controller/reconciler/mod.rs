//! # Reconciler
//!
//! Core reconciliation logic for Shoot control-plane Secrets.
//!
//! The reconciler:
//! - Watches Secrets in the seed cluster selected by label
//! - Ignores Secrets outside Shoot namespaces
//! - Mirrors each Secret into the `spec.gardener` list of the Shoot's ShootState
//! - Guards the Secret with a finalizer until its entry has been handled
//! - Keeps entries of deleted Secrets while the Shoot is being migrated
//!
//! ## Reconciliation Flow
//!
//! 1. Get the Secret and its namespace
//! 2. Resolve the Shoot and its ShootState via the seed's `Cluster`
//! 3. Choose by phase:
//!    - **Live**: add the finalizer, upsert the entry
//!    - **Deleting**: remove the entry (unless migrating), release the finalizer
//! 4. Commit the changed entries as a strategic merge patch

pub mod reconcile;
pub mod types;

pub use reconcile::encode_payload;
pub use types::{
    Outcome, Reconciler, ReconcilerConfig, ReconcilerError, Retention, SecretPhase, SecretRef,
};
