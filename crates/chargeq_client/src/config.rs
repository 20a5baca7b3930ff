use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Represents the settings of one vehicle client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// `host:port` of the coordinator
    pub server_addr: String,
    pub vehicle_id: String,
    /// Timeout for each request to the coordinator, in milliseconds
    pub request_timeout_ms: u64,
    pub battery: BatterySettings,
}

/// Represents how the simulated battery drains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatterySettings {
    /// Seconds between two drain steps
    pub drain_period_secs: u64,
    /// Percentage points lost at each step
    pub drain_step: u8,
    /// Level at which the low-battery notification fires
    pub low_battery_threshold: u8,
}

impl Default for BatterySettings {
    fn default() -> Self {
        BatterySettings {
            drain_period_secs: 5,
            drain_step: 10,
            low_battery_threshold: 20,
        }
    }
}

impl BatterySettings {
    pub fn drain_period(&self) -> Duration {
        Duration::from_secs(self.drain_period_secs)
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
