use crate::config::BatterySettings;
use crate::vehicle::Vehicle;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Sent once when the battery reaches the low threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowBattery {
    pub level: u8,
}

/// Drains the vehicle's battery every `drain_period` until the receiving end
/// of `alerts` goes away.
pub fn spawn_battery_monitor(
    vehicle: Arc<Mutex<Vehicle>>,
    settings: BatterySettings,
    alerts: mpsc::Sender<LowBattery>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(settings.drain_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let alert = {
                let mut vehicle = vehicle.lock().unwrap();
                vehicle
                    .drain(settings.drain_step, settings.low_battery_threshold)
                    .then(|| LowBattery {
                        level: vehicle.battery(),
                    })
            };

            if let Some(alert) = alert {
                tracing::warn!("Battery low: {}%", alert.level);
                if alerts.send(alert).await.is_err() {
                    break;
                }
            } else if alerts.is_closed() {
                break;
            }
        }
    })
}
