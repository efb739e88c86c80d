use anyhow::Result;
use clap::Parser;

use shoot_secret_controller::cli::Cli;
use shoot_secret_controller::config::ControllerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.execute(ControllerConfig::from_env()).await
}
