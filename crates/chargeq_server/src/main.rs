use anyhow::Context;
use chargeq_server::{Coordinator, CoordinatorConfig, create_app, run};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Command line arguments for the coordinator
#[derive(Parser, Debug)]
#[command(name = "chargeq-server")]
#[command(about = "Coordinator ranking charging points and brokering sessions")]
struct Args {
    /// Path to the coordinator configuration JSON file
    #[arg(short, long, env = "CHARGEQ_CONFIG")]
    config: PathBuf,

    /// Port to accept client requests on
    #[arg(short, long, env = "CHARGEQ_PORT", default_value = "5000")]
    port: u16,

    /// Port for the read-only HTTP status surface; disabled when unset
    #[arg(long, env = "CHARGEQ_HTTP_PORT")]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load coordinator configuration from JSON file
    let config_content = tokio::fs::read_to_string(&args.config)
        .await
        .with_context(|| format!("Failed to read config file '{}'", args.config.display()))?;

    let config: CoordinatorConfig = serde_json::from_str(&config_content)
        .with_context(|| format!("Failed to parse config file '{}'", args.config.display()))?;
    config.validate().context("Invalid coordinator configuration")?;

    tracing::info!(
        "Loaded {} charging points from {}",
        config.points.len(),
        args.config.display()
    );

    let coordinator = Arc::new(Coordinator::new(&config));

    if let Some(http_port) = args.http_port {
        let http_addr = format!("0.0.0.0:{}", http_port);
        let listener = tokio::net::TcpListener::bind(&http_addr)
            .await
            .with_context(|| format!("Failed to bind to {http_addr}"))?;
        tracing::info!("Serving status on {}", http_addr);

        let app = create_app(coordinator.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Status server error: {}", e);
            }
        });
    }

    let bind_addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;
    tracing::info!("Coordinator listening on {}", bind_addr);

    run(listener, coordinator).await.context("Server error")?;
    Ok(())
}
