//! # Controller
//!
//! Core controller modules for the Shoot Secret controller.
//!
//! - `backoff`: Fibonacci backoff mechanism for retries
//! - `data_list`: Name-keyed view over the ShootState data list
//! - `patch`: Strategic merge patch committer for ShootState
//! - `reconciler`: Core reconciliation logic
//! - `server`: HTTP server for metrics and health checks
//! - `state`: Shoot and ShootState lookup for a seed namespace

pub mod backoff;
pub mod data_list;
pub mod patch;
pub mod reconciler;
pub mod server;
pub mod state;
