use anyhow::Context;
use chargeq_core::{Position, random_position};
use chargeq_point::{QueueManager, run};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Command line arguments for a charging point
#[derive(Parser, Debug)]
#[command(name = "chargeq-point")]
#[command(about = "Waiting-list manager for one charging point")]
struct Args {
    /// Identity of this charging point
    #[arg(long, env = "ID")]
    id: String,

    /// Port to listen on (a leading ':' is accepted)
    #[arg(short, long, env = "PORT", default_value = "6001", value_parser = parse_port)]
    port: u16,

    /// Fixed latitude; a random position is used when unset
    #[arg(long, env = "LATITUDE", requires = "longitude", allow_hyphen_values = true)]
    latitude: Option<f64>,

    /// Fixed longitude; a random position is used when unset
    #[arg(long, env = "LONGITUDE", requires = "latitude", allow_hyphen_values = true)]
    longitude: Option<f64>,
}

fn parse_port(value: &str) -> Result<u16, String> {
    value
        .trim_start_matches(':')
        .parse()
        .map_err(|e| format!("invalid port '{value}': {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let position = match (args.latitude, args.longitude) {
        (Some(latitude), Some(longitude)) => {
            Position::new(latitude, longitude).context("Invalid charging point position")?
        }
        _ => random_position(&mut rand::thread_rng()),
    };

    let manager = Arc::new(QueueManager::new(args.id, position));

    let bind_addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;

    tracing::info!(
        "Charging point {} at ({:.6}, {:.6}) waiting for requests on {}",
        manager.point_id(),
        position.latitude,
        position.longitude,
        bind_addr
    );

    run(listener, manager).await.context("Server error")?;
    Ok(())
}
