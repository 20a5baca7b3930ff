mod billing;
mod geo;
mod models;
mod queue;

pub use crate::billing::*;
pub use crate::geo::*;
pub use crate::models::*;
pub use crate::queue::*;
use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("point already in use: {point_id} is charging another vehicle")]
    PointInUse { point_id: String },
    #[error("session not found: {vehicle_id} is not charging at {point_id}")]
    SessionNotFound {
        point_id: String,
        vehicle_id: String,
    },
}

/// Which vehicle is charging at which point.
///
/// A point id is present exactly while a session is active there, and maps to
/// a single vehicle.
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    occupants: HashMap<String, String>,
}

/// Result of a successfully stopped session.
#[derive(Debug, Clone, PartialEq)]
pub struct StoppedSession {
    pub point_id: String,
    pub vehicle_id: String,
    pub amount: f64,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupant(&self, point_id: &str) -> Option<&str> {
        self.occupants.get(point_id).map(String::as_str)
    }

    /// Ordered copy of the table, for reporting.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.occupants
            .iter()
            .map(|(point, vehicle)| (point.clone(), vehicle.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Registers `vehicle_id` as charging at `point_id`.
    ///
    /// The existence check and the insert happen under the same `&mut` borrow,
    /// so callers holding the table's lock get them atomically.
    pub fn start_session(&mut self, point_id: &str, vehicle_id: &str) -> Result<(), SessionError> {
        tracing::info!("Starting session for {} at point {}", vehicle_id, point_id);
        if self.occupants.contains_key(point_id) {
            return Err(SessionError::PointInUse {
                point_id: point_id.to_string(),
            });
        }
        self.occupants
            .insert(point_id.to_string(), vehicle_id.to_string());
        Ok(())
    }

    /// Ends the session of `vehicle_id` at `point_id` and bills it.
    pub fn stop_session(
        &mut self,
        point_id: &str,
        vehicle_id: &str,
        elapsed_seconds: f64,
    ) -> Result<StoppedSession, SessionError> {
        tracing::info!("Stopping session for {} at point {}", vehicle_id, point_id);
        if self.occupant(point_id) != Some(vehicle_id) {
            return Err(SessionError::SessionNotFound {
                point_id: point_id.to_string(),
                vehicle_id: vehicle_id.to_string(),
            });
        }
        self.occupants.remove(point_id);

        Ok(StoppedSession {
            point_id: point_id.to_string(),
            vehicle_id: vehicle_id.to_string(),
            amount: session_cost(elapsed_seconds),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_point_already_in_use() {
        let mut table = SessionTable::new();

        // First session should succeed
        assert!(table.start_session("p1", "car-1").is_ok());

        // Second vehicle on the same point should fail
        match table.start_session("p1", "car-2") {
            Err(SessionError::PointInUse { point_id }) => assert_eq!(point_id, "p1"),
            other => panic!("Expected PointInUse error, got {other:?}"),
        }
        assert_eq!(table.occupant("p1"), Some("car-1"));

        // Different point should still work
        assert!(table.start_session("p2", "car-2").is_ok());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_stop_session_bills_and_frees_point() {
        let mut table = SessionTable::new();
        table.start_session("p1", "car-1").unwrap();

        let stopped = table
            .stop_session("p1", "car-1", 120.0)
            .expect("Could not stop the session");
        assert_eq!(stopped.amount, 60.0);
        assert_eq!(stopped.vehicle_id, "car-1");
        assert!(table.occupant("p1").is_none());
        assert!(table.is_empty());

        // The point is free again
        assert!(table.start_session("p1", "car-2").is_ok());
    }

    #[test]
    fn test_stop_session_not_found() {
        let mut table = SessionTable::new();

        // Nothing running
        let result = table.stop_session("p1", "car-1", 10.0);
        assert_eq!(
            result,
            Err(SessionError::SessionNotFound {
                point_id: "p1".into(),
                vehicle_id: "car-1".into(),
            })
        );

        // Another vehicle is charging there: the table is left alone
        table.start_session("p1", "car-2").unwrap();
        assert!(table.stop_session("p1", "car-1", 10.0).is_err());
        assert_eq!(table.occupant("p1"), Some("car-2"));
    }

    #[test]
    fn test_error_messages() {
        let in_use = SessionError::PointInUse {
            point_id: "p1".into(),
        };
        assert!(in_use.to_string().starts_with("point already in use"));

        let not_found = SessionError::SessionNotFound {
            point_id: "p1".into(),
            vehicle_id: "car-1".into(),
        };
        assert!(not_found.to_string().starts_with("session not found"));
    }

    #[test]
    fn test_snapshot_is_ordered() {
        let mut table = SessionTable::new();
        table.start_session("p2", "car-2").unwrap();
        table.start_session("p1", "car-1").unwrap();

        let snapshot = table.snapshot();
        let points: Vec<&String> = snapshot.keys().collect();
        assert_eq!(points, vec!["p1", "p2"]);
    }
}
