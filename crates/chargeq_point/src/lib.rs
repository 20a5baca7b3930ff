//! Queue manager for a single charging point.
//!
//! Owns the point's waiting list and answers describe, enqueue, priority and
//! release requests from the coordinator.

use chargeq_core::{ChargePoint, Position, WaitingQueue};
use chargeq_wire::{PointReply, PointRequest, Release, Reservation, serve};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub struct QueueManager {
    point_id: String,
    position: Position,
    queue: Mutex<WaitingQueue>,
}

impl QueueManager {
    pub fn new(point_id: impl Into<String>, position: Position) -> Self {
        QueueManager {
            point_id: point_id.into(),
            position,
            queue: Mutex::new(WaitingQueue::new()),
        }
    }

    pub fn point_id(&self) -> &str {
        &self.point_id
    }

    /// Identity, position and a copy of the waiting list.
    pub fn describe(&self) -> ChargePoint {
        let queue = self.queue.lock().unwrap().snapshot();
        ChargePoint {
            id: self.point_id.clone(),
            position: self.position,
            queue,
        }
    }

    pub fn enqueue(&self, vehicle_id: &str) -> Reservation {
        let queue_position = self.queue.lock().unwrap().enqueue(vehicle_id);
        tracing::info!(
            "Vehicle {} queued at point {} in position {}",
            vehicle_id,
            self.point_id,
            queue_position
        );
        Reservation {
            point_id: self.point_id.clone(),
            vehicle_id: vehicle_id.to_string(),
            queue_position,
            position: self.position,
        }
    }

    pub fn check_priority(&self, vehicle_id: &str) -> bool {
        self.queue.lock().unwrap().has_priority(vehicle_id)
    }

    pub fn dequeue(&self, vehicle_id: &str) -> Release {
        let mut queue = self.queue.lock().unwrap();
        let success = queue.release(vehicle_id);
        let message = if success {
            tracing::info!("Reservation of {} closed at point {}", vehicle_id, self.point_id);
            "reservation closed".to_string()
        } else {
            tracing::warn!(
                "Refusing to release {} at point {}: head is {:?}",
                vehicle_id,
                self.point_id,
                queue.head()
            );
            format!("{vehicle_id} is not at the head of the queue")
        };
        tracing::debug!("Waiting list of {}: {:?}", self.point_id, queue.snapshot());

        Release {
            point_id: self.point_id.clone(),
            vehicle_id: vehicle_id.to_string(),
            success,
            message,
        }
    }

    pub fn handle(&self, request: PointRequest) -> PointReply {
        match request {
            PointRequest::Describe {} => {
                tracing::info!("Describing point {}", self.point_id);
                PointReply::Info(self.describe())
            }
            PointRequest::Enqueue { vehicle_id } => PointReply::Reserved(self.enqueue(&vehicle_id)),
            PointRequest::CheckPriority { vehicle_id } => {
                if self.check_priority(&vehicle_id) {
                    PointReply::HeadOfQueue {
                        message: format!("{vehicle_id} is first in line at {}", self.point_id),
                    }
                } else {
                    PointReply::NotPriority {
                        message: format!("{vehicle_id} is not first in line at {}", self.point_id),
                    }
                }
            }
            PointRequest::Dequeue { vehicle_id } => PointReply::Released(self.dequeue(&vehicle_id)),
        }
    }
}

/// Serves `manager` on `listener` until the process stops.
pub async fn run(listener: TcpListener, manager: Arc<QueueManager>) -> std::io::Result<()> {
    serve(listener, move |request: PointRequest| {
        let manager = manager.clone();
        async move { manager.handle(request) }
    })
    .await
}
