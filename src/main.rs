//! pdfrag HTTP server

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use pdfrag_lib::{api, telemetry, Services, Settings};

#[derive(Parser, Debug)]
#[command(name = "pdfrag", about = "Chat with uploaded PDFs over a hosted vector index")]
struct ServerCli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "PDFRAG_BIND", default_value = "127.0.0.1:3000")]
    bind: String,

    #[command(flatten)]
    settings: Settings,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let cli = ServerCli::parse();

    let services = Arc::new(Services::from_settings(&cli.settings));
    let app = api::router(services);

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    info!(addr = %cli.bind, "pdfrag listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("pdfrag stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
