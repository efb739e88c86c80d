//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use shoot_secret_controller::prelude::*;
//! ```

pub use crate::crd::*;

pub use crate::client::{GardenClient, SeedClient, StoreError};

pub use crate::controller::data_list::GardenerResourceDataList;
pub use crate::controller::reconciler::{
    Outcome, Reconciler, ReconcilerConfig, ReconcilerError, Retention, SecretPhase, SecretRef,
};

pub use crate::config::ControllerConfig;

pub use crate::maintenance::MaintenanceError;
