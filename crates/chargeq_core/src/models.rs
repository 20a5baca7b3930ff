use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PositionError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A fixed geocoordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, PositionError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(PositionError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(PositionError::LongitudeOutOfRange(longitude));
        }
        Ok(Position {
            latitude,
            longitude,
        })
    }
}

/// Identity, position and waiting list of one charging point, as reported
/// by its queue manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargePoint {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(flatten)]
    pub position: Position,
    #[serde(rename = "fila", default)]
    pub queue: Vec<String>,
}

/// A charging point annotated with its distance (km) from a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPoint {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(flatten)]
    pub position: Position,
    pub distance: f64,
    #[serde(rename = "queueLength")]
    pub queue_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub amount: f64,
    pub paid: bool,
}

impl Payment {
    pub fn new(amount: f64) -> Self {
        Payment {
            amount,
            paid: false,
        }
    }

    /// Marks the payment as settled. Returns `false` if it already was.
    pub fn settle(&mut self) -> bool {
        if self.paid {
            return false;
        }
        self.paid = true;
        true
    }
}

/// One entry of a vehicle's charging history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: uuid::Uuid,
    pub point_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub payment: Option<Payment>,
}

impl Session {
    pub fn open(point_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Session {
            session_id: uuid::Uuid::new_v4(),
            point_id: point_id.into(),
            started_at,
            ended_at: None,
            payment: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Seconds elapsed between the session start and `now`, never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.started_at).num_milliseconds().max(0);
        millis as f64 / 1000.0
    }

    /// Closes the session with its bill. The amount is fixed at this point:
    /// closing an already closed session changes nothing and returns `false`.
    pub fn close(&mut self, ended_at: DateTime<Utc>, amount: f64) -> bool {
        if !self.is_open() {
            return false;
        }
        self.ended_at = Some(ended_at);
        self.payment = Some(Payment::new(amount));
        true
    }

    pub fn is_unpaid(&self) -> bool {
        self.payment.as_ref().is_some_and(|payment| !payment.paid)
    }
}
