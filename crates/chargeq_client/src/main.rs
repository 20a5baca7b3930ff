use anyhow::Context;
use chargeq_client::{
    BatterySettings, Client, ClientConfig, LowBattery, Vehicle, spawn_battery_monitor,
};
use chargeq_core::{Position, RankedPoint, random_position};
use chargeq_wire::Endpoint;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Command line arguments for a vehicle
#[derive(Parser, Debug)]
#[command(name = "chargeq-client")]
#[command(about = "Interactive vehicle client for the charging coordinator")]
struct Args {
    /// `host:port` of the coordinator
    #[arg(short, long, env = "SERVER_ADDR", default_value = "127.0.0.1:5000")]
    server: String,

    /// Identity of this vehicle; generated when unset
    #[arg(long, env = "VEHICLE_ID")]
    vehicle_id: Option<String>,

    /// Starting latitude; a random position is used when unset
    #[arg(long, env = "LATITUDE", requires = "longitude", allow_hyphen_values = true)]
    latitude: Option<f64>,

    /// Starting longitude; a random position is used when unset
    #[arg(long, env = "LONGITUDE", requires = "latitude", allow_hyphen_values = true)]
    longitude: Option<f64>,

    /// Seconds between two battery drain steps
    #[arg(long, env = "DRAIN_PERIOD_SECS", default_value = "5")]
    drain_period_secs: u64,

    /// Percentage points lost at each drain step
    #[arg(long, env = "DRAIN_STEP", default_value = "10")]
    drain_step: u8,

    /// Battery level that triggers the low-battery notice
    #[arg(long, env = "LOW_BATTERY_THRESHOLD", default_value = "20")]
    low_battery_threshold: u8,

    /// Timeout for each request to the coordinator, in milliseconds. Keep it
    /// above the coordinator's request deadline.
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    timeout_ms: u64,
}

impl Args {
    fn config(&self) -> ClientConfig {
        let vehicle_id = self.vehicle_id.clone().unwrap_or_else(|| {
            let id = uuid::Uuid::new_v4().simple().to_string();
            format!("car-{}", &id[..8])
        });
        ClientConfig {
            server_addr: self.server.clone(),
            vehicle_id,
            request_timeout_ms: self.timeout_ms,
            battery: BatterySettings {
                drain_period_secs: self.drain_period_secs,
                drain_step: self.drain_step,
                low_battery_threshold: self.low_battery_threshold,
            },
        }
    }
}

const MENU: &str = "\n1) List charging points\n2) Reserve a point\n3) Start charging\n4) Stop charging\n5) Pay pending session\n6) Show status\nChoose an option:";

fn print_points(points: &[RankedPoint]) {
    if points.is_empty() {
        println!("No charging points available");
        return;
    }
    for point in points {
        println!(
            "  {:<12} {:>10.2} km   queue: {}",
            point.id, point.distance, point.queue_length
        );
    }
}

fn print_status(client: &Client) {
    let vehicle = client.snapshot();
    println!("Vehicle {}", vehicle.id());
    println!("  State:   {:?}", vehicle.state());
    println!("  Battery: {}%", vehicle.battery());
    if let Some(point_id) = vehicle.reserved_point() {
        println!("  Point:   {}", point_id);
    }
    for session in vehicle.history() {
        let payment = match &session.payment {
            Some(payment) if payment.paid => format!("paid {:.2}", payment.amount),
            Some(payment) => format!("owes {:.2}", payment.amount),
            None => "charging".to_string(),
        };
        println!("  {} at {}: {}", session.session_id, session.point_id, payment);
    }
}

type StdinLines = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

async fn run_option(client: &Client, option: &str, lines: &mut StdinLines) -> anyhow::Result<()> {
    match option {
        "1" => print_points(&client.list_points().await?),
        "2" => {
            println!("Point id:");
            let Some(point_id) = lines.next_line().await? else {
                return Ok(());
            };
            let reservation = client.reserve(point_id.trim()).await?;
            println!(
                "Queued at {} in position {}",
                reservation.point_id, reservation.queue_position
            );
        }
        "3" => {
            let session = client.start().await?;
            println!("Charging at {} (session {})", session.point_id, session.session_id);
        }
        "4" => {
            let session = client.stop().await?;
            if let Some(payment) = session.payment {
                println!("Session finished, amount due: {:.2}", payment.amount);
            }
        }
        "5" => match client.pay().await? {
            Some(session) => println!("Paid session {}", session.session_id),
            None => println!("Nothing to pay"),
        },
        "6" => print_status(client),
        "" => {}
        other => println!("Unknown option '{}'", other),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = args.config();
    let position = match (args.latitude, args.longitude) {
        (Some(latitude), Some(longitude)) => {
            Position::new(latitude, longitude).context("Invalid vehicle position")?
        }
        _ => random_position(&mut rand::thread_rng()),
    };

    let vehicle = Vehicle::new(config.vehicle_id.clone(), position);
    let client = Client::new(
        Endpoint::new(config.server_addr.clone(), config.request_timeout()),
        vehicle,
    );

    let (alert_tx, mut alerts) = mpsc::channel::<LowBattery>(4);
    let monitor = spawn_battery_monitor(client.vehicle(), config.battery, alert_tx);

    println!(
        "Vehicle {} at ({:.6}, {:.6}), coordinator {}",
        config.vehicle_id, position.latitude, position.longitude, config.server_addr
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", MENU);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                if let Err(e) = run_option(&client, line.trim(), &mut lines).await {
                    println!("Error: {e}");
                }
                println!("{}", MENU);
            }
            Some(alert) = alerts.recv() => {
                println!("\nBattery low ({}%), nearest charging points:", alert.level);
                match client.list_points().await {
                    Ok(points) => print_points(&points),
                    Err(e) => println!("Error: {e}"),
                }
                println!("{}", MENU);
            }
        }
    }

    monitor.abort();
    Ok(())
}
