//! # CLI
//!
//! Command-line interface of the controller binary.
//!
//! ## Usage
//!
//! ```bash
//! # Run the Secret controller (default)
//! shoot-secret-controller run --garden-kubeconfig /etc/garden/kubeconfig
//!
//! # Delete gardener-owned ManagedResources of a Shoot namespace
//! shoot-secret-controller managed-resources delete --namespace shoot--dev--foo
//!
//! # Wait until they are gone
//! shoot-secret-controller managed-resources wait --namespace shoot--dev--foo --timeout-secs 600
//!
//! # Orphan the objects deployed by them
//! shoot-secret-controller managed-resources keep-objects --namespace shoot--dev--foo
//!
//! # Remove renamed priority classes from the seed
//! shoot-secret-controller cleanup-priority-classes
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::client::{KubeSeedClient, SeedClient};
use crate::config::ControllerConfig;
use crate::maintenance;
use crate::runtime::{self, initialization};

/// Mirrors Shoot control-plane Secrets into their garden ShootState
#[derive(Debug, Parser)]
#[command(name = "shoot-secret-controller", version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the Secret controller
    Run {
        /// Kubeconfig of the garden cluster
        #[arg(long, env = "GARDEN_KUBECONFIG")]
        garden_kubeconfig: Option<PathBuf>,

        /// Port of the metrics and probe server
        #[arg(long, env = "METRICS_PORT")]
        metrics_port: Option<u16>,
    },
    /// Maintain gardener-owned ManagedResources of a Shoot namespace
    ManagedResources {
        #[command(subcommand)]
        action: ManagedResourcesAction,
    },
    /// Delete legacy priority classes from the seed
    CleanupPriorityClasses,
}

#[derive(Debug, Subcommand)]
pub enum ManagedResourcesAction {
    /// Delete all ManagedResources labelled origin=gardener
    Delete {
        #[arg(short, long)]
        namespace: String,
    },
    /// Wait until all ManagedResources labelled origin=gardener are gone
    Wait {
        #[arg(short, long)]
        namespace: String,

        #[arg(long, default_value_t = 600)]
        timeout_secs: u64,
    },
    /// Set keepObjects on all ManagedResources labelled origin=gardener
    KeepObjects {
        #[arg(short, long)]
        namespace: String,
    },
}

impl Cli {
    /// Execute the selected command, `run` when none is given
    pub async fn execute(self, mut config: ControllerConfig) -> Result<()> {
        match self.command {
            None => run(config).await,
            Some(Commands::Run {
                garden_kubeconfig,
                metrics_port,
            }) => {
                if garden_kubeconfig.is_some() {
                    config.garden_kubeconfig = garden_kubeconfig;
                }
                if let Some(port) = metrics_port {
                    config.metrics_port = port;
                }
                run(config).await
            }
            Some(Commands::ManagedResources { action }) => {
                let seed = maintenance_client(&config).await?;
                match action {
                    ManagedResourcesAction::Delete { namespace } => {
                        maintenance::delete_managed_resources(seed.as_ref(), &namespace).await?;
                    }
                    ManagedResourcesAction::Wait {
                        namespace,
                        timeout_secs,
                    } => {
                        maintenance::wait_until_managed_resources_deleted(
                            seed.as_ref(),
                            &namespace,
                            Duration::from_secs(timeout_secs),
                        )
                        .await?;
                    }
                    ManagedResourcesAction::KeepObjects { namespace } => {
                        maintenance::keep_objects_for_managed_resources(seed.as_ref(), &namespace)
                            .await?;
                    }
                }
                Ok(())
            }
            Some(Commands::CleanupPriorityClasses) => {
                let seed = maintenance_client(&config).await?;
                let deleted = maintenance::cleanup_legacy_priority_classes(seed.as_ref()).await?;
                info!(deleted = ?deleted, "Legacy priority classes cleaned up");
                Ok(())
            }
        }
    }
}

async fn run(config: ControllerConfig) -> Result<()> {
    let init = runtime::initialize(config)
        .await
        .context("Failed to initialize controller")?;
    runtime::run_watch_loop(init.secrets, init.context, init.server_state).await
}

async fn maintenance_client(config: &ControllerConfig) -> Result<Arc<dyn SeedClient>> {
    initialization::install_crypto_provider();
    initialization::init_tracing(config)?;
    let client = initialization::seed_client().await?;
    Ok(Arc::new(KubeSeedClient::new(client)))
}
