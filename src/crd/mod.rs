//! # Custom Resource Definitions
//!
//! Resource types the controller reads and writes.
//!
//! None of these CRDs are owned by this controller; the types only model the
//! fields the controller relies on and carry everything else opaquely.
//!
//! ## Module Structure
//!
//! - `shoot_state.rs` - `ShootState` in the garden cluster and its data list entries
//! - `cluster.rs` - seed-side `Cluster` resource embedding the Shoot
//! - `shoot.rs` - read-only Shoot lifecycle view
//! - `managed_resource.rs` - `ManagedResource` used by the maintenance utilities

mod cluster;
mod managed_resource;
mod shoot;
mod shoot_state;

pub use cluster::{Cluster, ClusterSpec};
pub use managed_resource::{ManagedResource, ManagedResourceSpec, SecretReference};
pub use shoot::{LastOperation, Shoot, ShootStatus};
pub use shoot_state::{GardenerResourceData, ShootState, ShootStateSpec};
