//! # Initialization
//!
//! Controller initialization logic including rustls setup, tracing, metrics,
//! server startup, and Kubernetes client setup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::client::{KubeGardenClient, KubeSeedClient};
use crate::config::ControllerConfig;
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use crate::runtime::Context;

/// Everything the watch loop needs
pub struct InitializationResult {
    /// Secrets watched in the seed cluster
    pub secrets: Api<Secret>,
    /// Shared reconciliation context
    pub context: Arc<Context>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

/// Install the ring crypto provider for rustls
///
/// Must run before any client is created. Returns `false` if a provider
/// was already installed.
pub fn install_crypto_provider() -> bool {
    rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok()
}

/// Set up the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `LOG_LEVEL`. `LOG_FORMAT=text` selects
/// human readable output, anything else JSON.
pub fn init_tracing(config: &ControllerConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "shoot_secret_controller={}",
            config.log_level.to_lowercase()
        ))
    });

    let result = if config.log_format.eq_ignore_ascii_case("text") {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

/// Client for the seed cluster from the in-cluster or local kubeconfig
pub async fn seed_client() -> Result<Client> {
    Client::try_default()
        .await
        .context("Failed to create Kubernetes client for the seed cluster")
}

/// Client for the garden cluster
///
/// Uses `GARDEN_KUBECONFIG` when set, the seed client otherwise.
pub async fn garden_client(config: &ControllerConfig, seed: &Client) -> Result<Client> {
    let Some(path) = config.garden_kubeconfig.as_deref() else {
        info!("GARDEN_KUBECONFIG not set, using the seed client for the garden cluster");
        return Ok(seed.clone());
    };

    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|| format!("Failed to read garden kubeconfig {}", path.display()))?;
    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .with_context(|| format!("Invalid garden kubeconfig {}", path.display()))?;
    Client::try_from(client_config).context("Failed to create Kubernetes client for the garden cluster")
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Seed and garden client creation
/// - Reconciler setup
pub async fn initialize(config: ControllerConfig) -> Result<InitializationResult> {
    install_crypto_provider();
    init_tracing(&config)?;

    info!("Starting Shoot Secret Controller");
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let server_state = Arc::new(ServerState::default());
    let port = config.metrics_port;
    let server_state_clone = Arc::clone(&server_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let seed = seed_client().await?;
    let garden = garden_client(&config, &seed).await?;

    // Give a failed bind the chance to surface before the watch starts
    tokio::time::sleep(Duration::from_millis(100)).await;
    if server_handle.is_finished() {
        return Err(anyhow::anyhow!("HTTP server failed to start on port {port}"));
    }

    let reconciler = Reconciler::new(
        Arc::new(KubeSeedClient::new(seed.clone())),
        Arc::new(KubeGardenClient::new(garden)),
        config.reconciler_config(),
    );
    let secrets: Api<Secret> = Api::all(seed);
    let context = Arc::new(Context::new(reconciler, config));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        secrets,
        context,
        server_state,
    })
}
