//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and controller stream errors.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use kube_runtime::controller::{self, Action};
use kube_runtime::watcher;
use tracing::{debug, error, info, warn};

use crate::controller::reconciler::{ReconcilerError, SecretRef};
use crate::observability::metrics;
use crate::runtime::Context;

/// Requeue a failed Secret with its Fibonacci backoff
///
/// Backoff state is tracked per Secret so one failing Secret does not slow
/// down the others.
pub fn handle_reconciliation_error(
    secret: Arc<Secret>,
    error: &ReconcilerError,
    ctx: Arc<Context>,
) -> Action {
    let secret_ref = SecretRef::new(secret.namespace().unwrap_or_default(), secret.name_any());

    error!(
        secret.namespace = %secret_ref.namespace,
        secret.name = %secret_ref.name,
        step = error.step(),
        error = %error,
        "Reconciliation failed"
    );
    metrics::increment_reconciliation_errors(error.step());

    let (delay, error_count) = ctx.next_backoff(&secret_ref);
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

    info!(
        secret.namespace = %secret_ref.namespace,
        secret.name = %secret_ref.name,
        error_count,
        next_retry = %next_trigger_time.to_rfc3339(),
        "Retrying with Fibonacci backoff in {}s",
        delay.as_secs()
    );

    metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}

/// Log an error surfaced by the controller stream
///
/// Reconciler failures were already handled by [`handle_reconciliation_error`].
pub fn handle_controller_error(error: &controller::Error<ReconcilerError, watcher::Error>) {
    match error {
        controller::Error::ObjectNotFound(object) => {
            debug!(object = %object, "Object vanished before it could be reconciled");
        }
        controller::Error::ReconcilerFailed(err, object) => {
            debug!(object = %object, error = %err, "Reconciler failure already requeued");
        }
        controller::Error::QueueError(err) => {
            warn!(error = %err, "Secret watch failed, the watcher will retry");
        }
        other => {
            error!(error = %other, "Controller stream error");
        }
    }
}
