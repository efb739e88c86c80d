//! # Maintenance
//!
//! One-shot cleanup operations against the seed cluster, run from the CLI.
//!
//! - `managed_resources`: Delete, await or orphan gardener-owned ManagedResources
//! - `priority_classes`: Remove renamed priority classes

pub mod managed_resources;
pub mod priority_classes;

pub use managed_resources::{
    delete_managed_resources, keep_objects_for_managed_resources,
    wait_until_managed_resources_deleted,
};
pub use priority_classes::cleanup_legacy_priority_classes;

use std::time::Duration;

use thiserror::Error;

use crate::client::StoreError;

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("failed to list all managed resources in namespace {namespace}: {source}")]
    ListManagedResources {
        namespace: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to delete managed resources in namespace {namespace}: {source}")]
    DeleteManagedResources {
        namespace: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to set keepObjects on ManagedResource {namespace}/{name}: {source}")]
    SetKeepObjects {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("{remaining} managed resources in namespace {namespace} still exist after {timeout:?}")]
    WaitTimeout {
        namespace: String,
        remaining: usize,
        timeout: Duration,
    },
    #[error("failed to delete PriorityClass {name}: {source}")]
    DeletePriorityClass {
        name: String,
        #[source]
        source: StoreError,
    },
}
