//! Fal gateway binary — dual-mode entry point.
//!
//! Default mode speaks MCP over stdio. HTTP mode is selected by the `--http`
//! flag or by deployment-environment markers (`PORT`, `RAILWAY_ENVIRONMENT`).
//! A missing `FAL_KEY` terminates the process before either front-end serves.

use clap::Parser;
use std::sync::Arc;

use fal_gateway::client::FalClient;
use fal_gateway::mcp::{Dispatcher, McpServer};
use fal_gateway::registry::Registry;
use fal_gateway::{observability, Config};

#[derive(Parser, Debug)]
#[command(name = "fal-gateway", version, about = "fal.ai image-editing adapter")]
struct Cli {
    /// Serve the HTTP API instead of MCP stdio (deployment environments with
    /// PORT or RAILWAY_ENVIRONMENT set select HTTP mode automatically).
    #[arg(long)]
    http: bool,
}

#[tokio::main]
async fn main() {
    observability::init_tracing();
    let cli = Cli::parse();

    // Missing API key is fatal before serving either front-end.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    };

    let registry = Arc::new(Registry::standard());
    let client = Arc::new(FalClient::new(&config, registry.clone()));

    let result = if cli.http || Config::http_mode_from_env() {
        tracing::info!("🚀 Fal gateway starting (HTTP mode, port {})", config.port);
        fal_gateway::http::serve(client, config.port).await
    } else {
        tracing::info!("🚀 Fal gateway starting (MCP stdio mode)");
        McpServer::new(Dispatcher::new(registry, client))
            .serve()
            .await
    };

    if let Err(err) = result {
        tracing::error!("server error: {err}");
        std::process::exit(1);
    }
}
