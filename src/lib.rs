//! # Shoot Secret Controller
//!
//! A Kubernetes controller that mirrors Shoot control-plane Secrets from a
//! seed cluster into the Shoot's `ShootState` in the garden cluster.
//!
//! ## Overview
//!
//! 1. **Watching Secrets** - Secrets matching a label selector in the seed
//! 2. **Scoping** - Only Secrets in Shoot control-plane namespaces are mirrored
//! 3. **Mirroring** - Each Secret becomes a `type: secret` entry in `spec.gardener`
//! 4. **Finalizers** - A Secret is only released once its entry has been pruned
//! 5. **Migration** - Entries survive Secret deletion while the Shoot migrates
//!
//! ## Features
//!
//! - **Targeted patches**: Only changed entries are sent, merged by name on the server
//! - **Prometheus metrics**: Exposes metrics for monitoring and observability
//! - **Health probes**: HTTP endpoints for liveness and readiness checks
//! - **Maintenance commands**: ManagedResource and priority class cleanup

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod maintenance;
pub mod observability;
pub mod prelude;
pub mod runtime;
