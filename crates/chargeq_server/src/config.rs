use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3000;
const DEFAULT_REQUEST_DEADLINE_MS: u64 = 8000;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("no charging points configured")]
    NoPoints,
    #[error("charging point {0} is configured more than once")]
    DuplicatePoint(String),
    #[error("request timeout and deadline must be greater than zero")]
    ZeroTimeout,
}

/// Represents the coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorConfig {
    /// Known charging points, in enumeration order
    pub points: Vec<PointConfig>,
    /// Timeout for each call to a charging point, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Budget for answering one client request, all hops included, in
    /// milliseconds. Clients must wait longer than this.
    #[serde(default = "default_request_deadline_ms")]
    pub request_deadline_ms: u64,
}

/// Represents a charging point the coordinator can reach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointConfig {
    pub id: String,
    /// `host:port` of the point's queue manager
    pub address: String,
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_request_deadline_ms() -> u64 {
    DEFAULT_REQUEST_DEADLINE_MS
}

impl CoordinatorConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.points.is_empty() {
            return Err(ConfigError::NoPoints);
        }
        if self.request_timeout_ms == 0 || self.request_deadline_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let mut seen = HashSet::new();
        for point in &self.points {
            if !seen.insert(point.id.as_str()) {
                return Err(ConfigError::DuplicatePoint(point.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_deserialization() {
        let json = r#"
        {
          "points": [
            {"id": "p1", "address": "charger-1:6001"},
            {"id": "p2", "address": "charger-2:6002"}
          ],
          "requestTimeoutMs": 1500
        }
        "#;

        let config: CoordinatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.points.len(), 2);
        assert_eq!(config.points[1].address, "charger-2:6002");
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_timeouts() {
        let json = r#"{"points": [{"id": "p1", "address": "127.0.0.1:6001"}]}"#;
        let config: CoordinatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert_eq!(config.request_deadline_ms, DEFAULT_REQUEST_DEADLINE_MS);
    }

    #[test]
    fn test_validation() {
        let point = |id: &str| PointConfig {
            id: id.into(),
            address: "127.0.0.1:6001".into(),
        };

        let empty = CoordinatorConfig {
            points: vec![],
            request_timeout_ms: 100,
            request_deadline_ms: 1000,
        };
        assert_eq!(empty.validate(), Err(ConfigError::NoPoints));

        let duplicated = CoordinatorConfig {
            points: vec![point("p1"), point("p2"), point("p1")],
            request_timeout_ms: 100,
            request_deadline_ms: 1000,
        };
        assert_eq!(
            duplicated.validate(),
            Err(ConfigError::DuplicatePoint("p1".into()))
        );

        let no_timeout = CoordinatorConfig {
            points: vec![point("p1")],
            request_timeout_ms: 0,
            request_deadline_ms: 1000,
        };
        assert_eq!(no_timeout.validate(), Err(ConfigError::ZeroTimeout));

        let no_deadline = CoordinatorConfig {
            points: vec![point("p1")],
            request_timeout_ms: 100,
            request_deadline_ms: 0,
        };
        assert_eq!(no_deadline.validate(), Err(ConfigError::ZeroTimeout));
    }
}
