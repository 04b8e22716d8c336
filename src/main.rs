use clap::Parser;
use tracing_subscriber::EnvFilter;

use texmux::cli::handlers;
use texmux::cli::{Cli, Commands};
use texmux::{Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("texmux=info".parse()?))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(server) = &cli.server {
        config.server.base_url = server.clone();
    }

    match cli.command {
        Commands::Watch { url, no_push } => handlers::watch(config, url, no_push).await,
        Commands::Projects => handlers::list_projects(config).await,
        Commands::Resolve { external_id } => handlers::resolve(config, external_id).await,
    }
}
