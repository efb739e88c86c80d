//! # Runtime
//!
//! Wiring between the Kubernetes controller machinery and the reconciler.
//!
//! - `context`: Shared state handed to every reconciliation
//! - `error_policy`: Backoff for failed reconciliations and stream errors
//! - `initialization`: Process setup (TLS, tracing, metrics, clients)
//! - `watch_loop`: The Secret controller loop

pub mod context;
pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use context::Context;
pub use initialization::{initialize, InitializationResult};
pub use watch_loop::run_watch_loop;
