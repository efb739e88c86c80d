//! # Watch Loop
//!
//! Controller watch loop that monitors labelled Secrets in the seed cluster
//! and triggers reconciliation when they change.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::{controller, controller::Action, watcher, Controller};
use tracing::{debug, info, warn, Instrument};

use crate::controller::reconciler::{ReconcilerError, SecretRef};
use crate::controller::server::ServerState;
use crate::observability::metrics;
use crate::runtime::error_policy::{handle_controller_error, handle_reconciliation_error};
use crate::runtime::Context;

/// Run the controller watch loop until a shutdown signal is received
pub async fn run_watch_loop(
    secrets: Api<Secret>,
    ctx: Arc<Context>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let shutdown_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, initiating graceful shutdown...");
        }
        shutdown_state.set_ready(false);
    });

    server_state.set_ready(true);

    loop {
        let watcher_config = watcher::Config::default().labels(&ctx.config.secret_label_selector);
        let controller_config =
            controller::Config::default().concurrency(ctx.config.max_concurrent_reconciliations);

        info!(
            selector = %ctx.config.secret_label_selector,
            concurrency = ctx.config.max_concurrent_reconciliations,
            "Starting Secret controller"
        );

        Controller::new(secrets.clone(), watcher_config)
            .with_config(controller_config)
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, Arc::clone(&ctx))
            .for_each(|result| async move {
                match result {
                    Ok((object, action)) => debug!(object = %object, action = ?action, "watch.event.reconciled"),
                    Err(e) => handle_controller_error(&e),
                }
            })
            .await;

        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let delay = ctx.config.watch_restart_delay();
        warn!(
            "Controller stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}

/// Reconcile one Secret within the configured deadline
async fn reconcile(secret: Arc<Secret>, ctx: Arc<Context>) -> Result<Action, ReconcilerError> {
    let secret_ref = SecretRef::new(secret.namespace().unwrap_or_default(), secret.name_any());
    let span = tracing::info_span!(
        "controller.reconcile",
        secret.namespace = %secret_ref.namespace,
        secret.name = %secret_ref.name,
        secret.resource_version = secret.resource_version().unwrap_or_default(),
    );

    let start = Instant::now();
    let result = ctx
        .reconciler
        .handle_with_deadline(&secret_ref)
        .instrument(span.clone())
        .await;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    let outcome = result?;
    span.in_scope(|| debug!(outcome = outcome.as_str(), "Reconciliation finished"));
    metrics::increment_reconciliations(outcome.as_str());
    ctx.reset_backoff(&secret_ref);
    Ok(Action::await_change())
}
