use chargeq_core::{Position, Session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FULL_BATTERY: u8 = 100;

#[derive(Error, Debug, PartialEq)]
pub enum VehicleError {
    #[error("no charging point reserved")]
    NotReserved,
    #[error("already charging at {point_id}")]
    AlreadyCharging { point_id: String },
    #[error("not charging")]
    NotCharging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleState {
    Idle,
    Queued,
    Charging,
}

/// Local view of one vehicle: battery, reservation and charging history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    id: String,
    position: Position,
    battery: u8,
    reserved_point: Option<String>,
    charging: bool,
    history: Vec<Session>,
    #[serde(skip)]
    low_battery_notified: bool,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, position: Position) -> Self {
        Vehicle {
            id: id.into(),
            position,
            battery: FULL_BATTERY,
            reserved_point: None,
            charging: false,
            history: Vec::new(),
            low_battery_notified: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn battery(&self) -> u8 {
        self.battery
    }

    pub fn reserved_point(&self) -> Option<&str> {
        self.reserved_point.as_deref()
    }

    pub fn is_charging(&self) -> bool {
        self.charging
    }

    pub fn history(&self) -> &[Session] {
        &self.history
    }

    pub fn state(&self) -> VehicleState {
        match (&self.reserved_point, self.charging) {
            (_, true) => VehicleState::Charging,
            (Some(_), false) => VehicleState::Queued,
            (None, false) => VehicleState::Idle,
        }
    }

    /// The session currently charging, if any.
    pub fn open_session(&self) -> Option<&Session> {
        self.history.last().filter(|session| session.is_open())
    }

    /// Idle -> Queued.
    pub fn apply_reservation(&mut self, point_id: impl Into<String>) {
        let point_id = point_id.into();
        tracing::info!("{} queued at {}", self.id, point_id);
        self.reserved_point = Some(point_id);
    }

    /// Queued -> Charging, opening a new history entry.
    pub fn apply_session_started(&mut self, started_at: DateTime<Utc>) -> Result<&Session, VehicleError> {
        let point_id = self.reserved_point.clone().ok_or(VehicleError::NotReserved)?;
        if let Some(open) = self.open_session() {
            return Err(VehicleError::AlreadyCharging {
                point_id: open.point_id.clone(),
            });
        }

        self.charging = true;
        self.history.push(Session::open(point_id, started_at));
        let session = &self.history[self.history.len() - 1];
        tracing::info!("{} started session {}", self.id, session.session_id);
        Ok(session)
    }

    /// Charging -> Idle: closes the open session with its bill, drops the
    /// reservation and refills the battery.
    pub fn apply_session_finished(&mut self, ended_at: DateTime<Utc>, amount: f64) -> Result<&Session, VehicleError> {
        let index = self
            .history
            .iter()
            .rposition(Session::is_open)
            .ok_or(VehicleError::NotCharging)?;

        let session = &mut self.history[index];
        session.close(ended_at, amount);
        self.charging = false;
        self.reserved_point = None;
        self.battery = FULL_BATTERY;
        self.low_battery_notified = false;
        tracing::info!("{} finished session {}, owes {}", self.id, session.session_id, amount);
        Ok(&self.history[index])
    }

    /// Drains the battery by `step` (not while charging). Returns `true` the
    /// first time the level reaches `threshold` since the last full charge.
    pub fn drain(&mut self, step: u8, threshold: u8) -> bool {
        if self.charging {
            return false;
        }
        self.battery = self.battery.saturating_sub(step);
        tracing::debug!("{} battery at {}%", self.id, self.battery);

        if self.battery <= threshold && !self.low_battery_notified {
            self.low_battery_notified = true;
            return true;
        }
        false
    }

    /// Most recent session whose payment is still open.
    pub fn pending_payment(&self) -> Option<&Session> {
        self.history.iter().rev().find(|session| session.is_unpaid())
    }

    /// Marks the payment of `session_id` as settled. Settling an already paid
    /// session is a no-op and returns `false`.
    pub fn settle(&mut self, session_id: uuid::Uuid) -> bool {
        self.history
            .iter_mut()
            .find(|session| session.session_id == session_id)
            .and_then(|session| session.payment.as_mut())
            .is_some_and(|payment| payment.settle())
    }
}
