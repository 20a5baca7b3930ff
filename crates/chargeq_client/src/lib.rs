pub mod battery;
pub mod client;
pub mod config;
pub mod vehicle;

pub use battery::{LowBattery, spawn_battery_monitor};
pub use client::{Client, ClientError};
pub use config::{BatterySettings, ClientConfig};
pub use vehicle::{FULL_BATTERY, Vehicle, VehicleError, VehicleState};
