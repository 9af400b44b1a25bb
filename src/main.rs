use anyhow::{Context, Result};
use clap::Parser;
use products_api::{api, config, logging, store::ProductStore};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "products-api",
    about = "Serve the in-memory products catalog over HTTP"
)]
struct Cli {
    /// Address to bind, overriding `SERVER_HOST`.
    #[arg(long)]
    host: Option<IpAddr>,
    /// Port to bind, overriding `SERVER_PORT`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing();
    let config = config::init_config().context("failed to load configuration")?;

    let addr = SocketAddr::new(
        cli.host.unwrap_or(config.server_host),
        cli.port.unwrap_or(config.server_port),
    );
    let app = api::create_router(Arc::new(ProductStore::new()));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")?;
    Ok(())
}
