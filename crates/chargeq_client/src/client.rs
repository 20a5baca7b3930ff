use crate::vehicle::{Vehicle, VehicleError};
use chargeq_core::{RankedPoint, Session};
use chargeq_wire::{Catalog, DispatchReply, DispatchRequest, Endpoint, Reservation, TransportError};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("coordinator refused: {0}")]
    Rejected(String),
    #[error("unexpected {0} reply from the coordinator")]
    UnexpectedReply(&'static str),
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
}

/// Drives one vehicle's requests against the coordinator, one at a time, and
/// applies successful replies to the local state.
pub struct Client {
    endpoint: Endpoint,
    vehicle: Arc<Mutex<Vehicle>>,
    last_points: Mutex<Vec<RankedPoint>>,
}

impl Client {
    pub fn new(endpoint: Endpoint, vehicle: Vehicle) -> Self {
        Client {
            endpoint,
            vehicle: Arc::new(Mutex::new(vehicle)),
            last_points: Mutex::new(Vec::new()),
        }
    }

    /// Shared handle on the vehicle, for the battery monitor.
    pub fn vehicle(&self) -> Arc<Mutex<Vehicle>> {
        self.vehicle.clone()
    }

    pub fn snapshot(&self) -> Vehicle {
        self.vehicle.lock().unwrap().clone()
    }

    /// Ranked list from the most recent successful `list_points`.
    pub fn last_points(&self) -> Vec<RankedPoint> {
        self.last_points.lock().unwrap().clone()
    }

    async fn send(&self, request: DispatchRequest) -> Result<DispatchReply, ClientError> {
        tracing::debug!("Sending {}", request.action());
        match self.endpoint.call(&request).await? {
            DispatchReply::Error { message } => Err(ClientError::Rejected(message)),
            reply => Ok(reply),
        }
    }

    /// Charging points, nearest first.
    pub async fn list_points(&self) -> Result<Vec<RankedPoint>, ClientError> {
        let request = {
            let vehicle = self.vehicle.lock().unwrap();
            DispatchRequest::ListPoints {
                vehicle_id: vehicle.id().to_string(),
                latitude: vehicle.position().latitude,
                longitude: vehicle.position().longitude,
            }
        };
        match self.send(request).await? {
            DispatchReply::PointList { pontos } => {
                *self.last_points.lock().unwrap() = pontos.clone();
                Ok(pontos)
            }
            other => Err(ClientError::UnexpectedReply(other.action())),
        }
    }

    /// Queues the vehicle at `point_id`. After a lost reply, calling this
    /// again for the same point picks up the reservation already made.
    pub async fn reserve(&self, point_id: &str) -> Result<Reservation, ClientError> {
        let request = {
            let vehicle = self.vehicle.lock().unwrap();
            DispatchRequest::Reserve {
                vehicle_id: vehicle.id().to_string(),
                point_id: point_id.to_string(),
                already_queued: vehicle.reserved_point().is_some(),
            }
        };
        match self.send(request).await? {
            DispatchReply::Reserved(reservation) => {
                self.vehicle
                    .lock()
                    .unwrap()
                    .apply_reservation(point_id);
                Ok(reservation)
            }
            other => Err(ClientError::UnexpectedReply(other.action())),
        }
    }

    /// Starts charging at the reserved point.
    pub async fn start(&self) -> Result<Session, ClientError> {
        let request = {
            let vehicle = self.vehicle.lock().unwrap();
            let point_id = vehicle.reserved_point().ok_or(VehicleError::NotReserved)?;
            if vehicle.is_charging() {
                return Err(VehicleError::AlreadyCharging {
                    point_id: point_id.to_string(),
                }
                .into());
            }
            DispatchRequest::StartSession {
                vehicle_id: vehicle.id().to_string(),
                point_id: point_id.to_string(),
            }
        };
        match self.send(request).await? {
            DispatchReply::SessionStarted { .. } => {
                let mut vehicle = self.vehicle.lock().unwrap();
                Ok(vehicle.apply_session_started(Utc::now())?.clone())
            }
            other => Err(ClientError::UnexpectedReply(other.action())),
        }
    }

    /// Stops charging and records the bill, unpaid.
    pub async fn stop(&self) -> Result<Session, ClientError> {
        let request = {
            let vehicle = self.vehicle.lock().unwrap();
            let session = vehicle.open_session().ok_or(VehicleError::NotCharging)?;
            DispatchRequest::StopSession {
                vehicle_id: vehicle.id().to_string(),
                point_id: session.point_id.clone(),
                elapsed_seconds: session.elapsed_seconds(Utc::now()),
                is_charging: vehicle.is_charging(),
            }
        };
        match self.send(request).await? {
            DispatchReply::SessionFinished { amount } => {
                let mut vehicle = self.vehicle.lock().unwrap();
                Ok(vehicle.apply_session_finished(Utc::now(), amount)?.clone())
            }
            other => Err(ClientError::UnexpectedReply(other.action())),
        }
    }

    /// Pays the most recent unpaid session. Returns `None` when nothing is
    /// owed.
    pub async fn pay(&self) -> Result<Option<Session>, ClientError> {
        let (request, session_id) = {
            let vehicle = self.vehicle.lock().unwrap();
            let Some(session) = vehicle.pending_payment() else {
                return Ok(None);
            };
            let request = DispatchRequest::PayPending {
                vehicle_id: vehicle.id().to_string(),
                session_id: session.session_id.to_string(),
            };
            (request, session.session_id)
        };
        match self.send(request).await? {
            DispatchReply::PaymentConfirmed {
                session_id: confirmed,
                message,
            } if confirmed == session_id.to_string() => {
                tracing::info!("{}", message);
                let mut vehicle = self.vehicle.lock().unwrap();
                vehicle.settle(session_id);
                Ok(vehicle
                    .history()
                    .iter()
                    .find(|session| session.session_id == session_id)
                    .cloned())
            }
            other => Err(ClientError::UnexpectedReply(other.action())),
        }
    }
}
