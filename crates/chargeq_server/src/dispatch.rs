use crate::config::{CoordinatorConfig, PointConfig};
use chargeq_core::{
    ChargePoint, Position, PositionError, RankedPoint, SessionError, SessionTable, rank_by_distance,
};
use chargeq_wire::{
    Catalog, DispatchReply, DispatchRequest, Endpoint, ErrorReply, PointReply, PointRequest,
    Reservation, TransportError,
};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("already queued: {vehicle_id} already holds a reservation")]
    AlreadyQueued { vehicle_id: String },
    #[error("unknown charging point: {point_id}")]
    UnknownPoint { point_id: String },
    #[error("not first in line: {vehicle_id} is not at the head of the queue at {point_id}")]
    NotHeadOfQueue {
        vehicle_id: String,
        point_id: String,
    },
    #[error("vehicle not currently charging: {vehicle_id}")]
    NotCharging { vehicle_id: String },
    #[error("charging point {point_id} is unavailable: {source}")]
    Unavailable {
        point_id: String,
        source: TransportError,
    },
    #[error("charging point {point_id} refused the request: {message}")]
    Rejected { point_id: String, message: String },
    #[error("unexpected {action} reply from charging point {point_id}")]
    UnexpectedReply {
        point_id: String,
        action: &'static str,
    },
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] PositionError),
    #[error("request not completed within {deadline:?}")]
    DeadlineExceeded { deadline: Duration },
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A configured charging point and the gate serializing session-affecting
/// requests made to it.
struct RemotePoint {
    config: PointConfig,
    endpoint: Endpoint,
    gate: tokio::sync::Mutex<()>,
}

/// Ranks charging points and brokers reservations and sessions between
/// clients and the points' queue managers.
///
/// Reserve, start and stop on the same point run one at a time: the priority
/// seen at a queue manager cannot change before the session table reflects
/// it. The table itself sits behind its own lock and is never held across a
/// network call.
///
/// Every client request is answered within the configured deadline. State is
/// only committed after the last network hop, so a request cut short by the
/// deadline leaves the session table untouched.
pub struct Coordinator {
    points: Vec<RemotePoint>,
    sessions: Mutex<SessionTable>,
    deadline: Duration,
}

impl Coordinator {
    pub fn new(config: &CoordinatorConfig) -> Self {
        let timeout = config.request_timeout();
        let points = config
            .points
            .iter()
            .map(|point| RemotePoint {
                config: point.clone(),
                endpoint: Endpoint::new(point.address.clone(), timeout),
                gate: tokio::sync::Mutex::new(()),
            })
            .collect();
        Coordinator {
            points,
            sessions: Mutex::new(SessionTable::new()),
            deadline: config.request_deadline(),
        }
    }

    pub fn points(&self) -> Vec<PointConfig> {
        self.points.iter().map(|point| point.config.clone()).collect()
    }

    /// Current `point -> vehicle` occupancy.
    pub fn sessions(&self) -> BTreeMap<String, String> {
        self.sessions.lock().unwrap().snapshot()
    }

    #[cfg(test)]
    pub(crate) fn session_table(&self) -> &Mutex<SessionTable> {
        &self.sessions
    }

    fn point(&self, point_id: &str) -> Result<&RemotePoint, DispatchError> {
        self.points
            .iter()
            .find(|point| point.config.id == point_id)
            .ok_or_else(|| DispatchError::UnknownPoint {
                point_id: point_id.to_string(),
            })
    }

    async fn call(&self, point: &RemotePoint, request: PointRequest) -> Result<PointReply, DispatchError> {
        let reply = point
            .endpoint
            .call(&request)
            .await
            .map_err(|source| DispatchError::Unavailable {
                point_id: point.config.id.clone(),
                source,
            })?;
        match reply {
            PointReply::Error { message } => Err(DispatchError::Rejected {
                point_id: point.config.id.clone(),
                message,
            }),
            reply => Ok(reply),
        }
    }

    fn unexpected(point: &RemotePoint, reply: &PointReply) -> DispatchError {
        DispatchError::UnexpectedReply {
            point_id: point.config.id.clone(),
            action: reply.action(),
        }
    }

    async fn describe(&self, point: &RemotePoint) -> Result<ChargePoint, DispatchError> {
        match self.call(point, PointRequest::Describe {}).await? {
            PointReply::Info(mut info) => {
                if info.id != point.config.id {
                    warn!(
                        "Charging point configured as {} reports itself as {}",
                        point.config.id, info.id
                    );
                    info.id = point.config.id.clone();
                }
                Ok(info)
            }
            other => Err(Self::unexpected(point, &other)),
        }
    }

    async fn check_priority(&self, point: &RemotePoint, vehicle_id: &str) -> Result<bool, DispatchError> {
        let request = PointRequest::CheckPriority {
            vehicle_id: vehicle_id.to_string(),
        };
        match self.call(point, request).await? {
            PointReply::HeadOfQueue { .. } => Ok(true),
            PointReply::NotPriority { .. } => Ok(false),
            other => Err(Self::unexpected(point, &other)),
        }
    }

    /// Every reachable point, nearest to `origin` first. Points that fail to
    /// answer are left out.
    pub async fn list_points(&self, origin: Position) -> Vec<RankedPoint> {
        let lookups = self.points.iter().map(|point| async move {
            match self.describe(point).await {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!("Leaving {} out of the listing: {}", point.config.id, e);
                    None
                }
            }
        });
        let described = join_all(lookups).await.into_iter().flatten();
        rank_by_distance(origin, described)
    }

    /// Queues `vehicle_id` at `point_id`. Asking again for a point the vehicle
    /// already waits at confirms its current position without queueing it
    /// twice, so a client that lost the first reply can retry.
    pub async fn reserve(
        &self,
        vehicle_id: &str,
        point_id: &str,
        already_queued: bool,
    ) -> Result<Reservation, DispatchError> {
        if already_queued {
            return Err(DispatchError::AlreadyQueued {
                vehicle_id: vehicle_id.to_string(),
            });
        }
        let point = self.point(point_id)?;
        let _gate = point.gate.lock().await;

        let info = self.describe(point).await?;
        if let Some(index) = info.queue.iter().position(|queued| queued == vehicle_id) {
            info!(
                "Vehicle {} already waits at {} in position {}",
                vehicle_id,
                point_id,
                index + 1
            );
            return Ok(Reservation {
                point_id: info.id,
                vehicle_id: vehicle_id.to_string(),
                queue_position: index + 1,
                position: info.position,
            });
        }

        let request = PointRequest::Enqueue {
            vehicle_id: vehicle_id.to_string(),
        };
        match self.call(point, request).await? {
            PointReply::Reserved(mut reservation) => {
                reservation.point_id = point.config.id.clone();
                info!(
                    "Vehicle {} reserved point {} in position {}",
                    vehicle_id, point_id, reservation.queue_position
                );
                Ok(reservation)
            }
            other => Err(Self::unexpected(point, &other)),
        }
    }

    /// Occupancy is checked before priority, so any vehicle asking for a busy
    /// point is told it is in use.
    pub async fn start_session(&self, vehicle_id: &str, point_id: &str) -> Result<(), DispatchError> {
        let point = self.point(point_id)?;
        let _gate = point.gate.lock().await;

        let occupied = self.sessions.lock().unwrap().occupant(point_id).is_some();
        if occupied {
            return Err(SessionError::PointInUse {
                point_id: point_id.to_string(),
            }
            .into());
        }

        if !self.check_priority(point, vehicle_id).await? {
            return Err(DispatchError::NotHeadOfQueue {
                vehicle_id: vehicle_id.to_string(),
                point_id: point_id.to_string(),
            });
        }

        self.sessions
            .lock()
            .unwrap()
            .start_session(point_id, vehicle_id)?;
        info!("Vehicle {} started charging at {}", vehicle_id, point_id);
        Ok(())
    }

    /// Ends the session and returns its bill.
    pub async fn stop_session(
        &self,
        vehicle_id: &str,
        point_id: &str,
        elapsed_seconds: f64,
        is_charging: bool,
    ) -> Result<f64, DispatchError> {
        if !is_charging {
            return Err(DispatchError::NotCharging {
                vehicle_id: vehicle_id.to_string(),
            });
        }
        let point = self.point(point_id)?;
        let _gate = point.gate.lock().await;

        let occupied = self.sessions.lock().unwrap().occupant(point_id) == Some(vehicle_id);
        if !occupied {
            return Err(SessionError::SessionNotFound {
                point_id: point_id.to_string(),
                vehicle_id: vehicle_id.to_string(),
            }
            .into());
        }

        if self.check_priority(point, vehicle_id).await? {
            // Billing does not depend on the queue manager letting go
            let request = PointRequest::Dequeue {
                vehicle_id: vehicle_id.to_string(),
            };
            match self.call(point, request).await {
                Ok(PointReply::Released(release)) if release.success => {
                    debug!("Released {} from the queue at {}", vehicle_id, point_id)
                }
                Ok(other) => warn!("Queue at {} kept {}: {:?}", point_id, vehicle_id, other),
                Err(e) => warn!("Could not release {} at {}: {}", vehicle_id, point_id, e),
            }
        }

        let stopped = self
            .sessions
            .lock()
            .unwrap()
            .stop_session(point_id, vehicle_id, elapsed_seconds)?;
        info!(
            "Vehicle {} stopped charging at {} after {}s, billed {}",
            vehicle_id, point_id, elapsed_seconds, stopped.amount
        );
        Ok(stopped.amount)
    }

    /// Acknowledges a payment. Payment state lives with the client, so this
    /// changes nothing here and can be repeated freely.
    pub fn pay_pending(&self, vehicle_id: &str, session_id: &str) -> String {
        info!("Payment of session {} confirmed for {}", session_id, vehicle_id);
        format!("payment of session {session_id} confirmed")
    }

    /// Answers one client request, turning every failure into an `ERRO`
    /// reply.
    pub async fn handle(&self, request: DispatchRequest) -> DispatchReply {
        info!("{} from {}", request.action(), request.vehicle_id());
        let result = tokio::time::timeout(self.deadline, self.dispatch(request))
            .await
            .unwrap_or(Err(DispatchError::DeadlineExceeded {
                deadline: self.deadline,
            }));

        result.unwrap_or_else(|e| {
            warn!("Request rejected: {}", e);
            DispatchReply::error(e.to_string())
        })
    }

    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchReply, DispatchError> {
        match request {
            DispatchRequest::ListPoints {
                vehicle_id: _,
                latitude,
                longitude,
            } => {
                let origin = Position::new(latitude, longitude)?;
                let pontos = self.list_points(origin).await;
                Ok(DispatchReply::PointList { pontos })
            }
            DispatchRequest::Reserve {
                vehicle_id,
                point_id,
                already_queued,
            } => self
                .reserve(&vehicle_id, &point_id, already_queued)
                .await
                .map(DispatchReply::Reserved),
            DispatchRequest::StartSession {
                vehicle_id,
                point_id,
            } => self
                .start_session(&vehicle_id, &point_id)
                .await
                .map(|()| DispatchReply::SessionStarted {
                    point_id,
                    vehicle_id,
                }),
            DispatchRequest::StopSession {
                vehicle_id,
                point_id,
                elapsed_seconds,
                is_charging,
            } => self
                .stop_session(&vehicle_id, &point_id, elapsed_seconds, is_charging)
                .await
                .map(|amount| DispatchReply::SessionFinished { amount }),
            DispatchRequest::PayPending {
                vehicle_id,
                session_id,
            } => {
                let message = self.pay_pending(&vehicle_id, &session_id);
                Ok(DispatchReply::PaymentConfirmed {
                    session_id,
                    message,
                })
            }
        }
    }
}
