//! End-to-end tests: a queue manager and the coordinator on loopback, driven
//! with raw protocol messages.

use chargeq_core::Position;
use chargeq_point::QueueManager;
use chargeq_server::{Coordinator, CoordinatorConfig, PointConfig};
use chargeq_wire::{DispatchReply, DispatchRequest, Endpoint, PointReply, PointRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

struct Network {
    coordinator: Arc<Coordinator>,
    coordinator_endpoint: Endpoint,
    point_endpoint: Endpoint,
}

async fn setup() -> Network {
    let point_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let point_addr = point_listener.local_addr().unwrap().to_string();
    let manager = Arc::new(QueueManager::new(
        "p1",
        Position {
            latitude: -23.5505,
            longitude: -46.6333,
        },
    ));
    tokio::spawn(chargeq_point::run(point_listener, manager));

    let coordinator = Arc::new(Coordinator::new(&CoordinatorConfig {
        points: vec![PointConfig {
            id: "p1".into(),
            address: point_addr.clone(),
        }],
        request_timeout_ms: 2000,
        request_deadline_ms: 5000,
    }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let coordinator_addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(chargeq_server::run(listener, coordinator.clone()));

    Network {
        coordinator,
        coordinator_endpoint: Endpoint::new(coordinator_addr, DEFAULT_TIMEOUT),
        point_endpoint: Endpoint::new(point_addr, DEFAULT_TIMEOUT),
    }
}

async fn dispatch(network: &Network, request: DispatchRequest) -> DispatchReply {
    network.coordinator_endpoint.call(&request).await.unwrap()
}

#[tokio::test]
async fn charging_session_lifecycle() {
    let network = setup().await;

    let reply = dispatch(
        &network,
        DispatchRequest::Reserve {
            vehicle_id: "car-1".into(),
            point_id: "p1".into(),
            already_queued: false,
        },
    )
    .await;
    match reply {
        DispatchReply::Reserved(reservation) => {
            assert_eq!(reservation.point_id, "p1");
            assert_eq!(reservation.queue_position, 1);
        }
        other => panic!("Expected RESERVA_CONFIRMADA, got {other:?}"),
    }

    let reply: PointReply = network
        .point_endpoint
        .call(&PointRequest::CheckPriority {
            vehicle_id: "car-1".into(),
        })
        .await
        .unwrap();
    assert!(matches!(reply, PointReply::HeadOfQueue { .. }));

    let reply = dispatch(
        &network,
        DispatchRequest::StartSession {
            vehicle_id: "car-1".into(),
            point_id: "p1".into(),
        },
    )
    .await;
    assert_eq!(
        reply,
        DispatchReply::SessionStarted {
            point_id: "p1".into(),
            vehicle_id: "car-1".into(),
        }
    );

    let reply = dispatch(
        &network,
        DispatchRequest::StartSession {
            vehicle_id: "car-2".into(),
            point_id: "p1".into(),
        },
    )
    .await;
    match reply {
        DispatchReply::Error { message } => assert!(message.contains("point already in use")),
        other => panic!("Expected ERRO, got {other:?}"),
    }

    let reply = dispatch(
        &network,
        DispatchRequest::StopSession {
            vehicle_id: "car-1".into(),
            point_id: "p1".into(),
            elapsed_seconds: 100.0,
            is_charging: true,
        },
    )
    .await;
    assert_eq!(reply, DispatchReply::SessionFinished { amount: 50.0 });
    assert!(network.coordinator.sessions().is_empty());

    // The head of the queue was released
    let reply: PointReply = network.point_endpoint.call(&PointRequest::Describe {}).await.unwrap();
    match reply {
        PointReply::Info(point) => assert!(point.queue.is_empty()),
        other => panic!("Expected INFORMACOES_DO_PONTO, got {other:?}"),
    }
}

#[tokio::test]
async fn listing_reports_queue_length() {
    let network = setup().await;
    dispatch(
        &network,
        DispatchRequest::Reserve {
            vehicle_id: "car-1".into(),
            point_id: "p1".into(),
            already_queued: false,
        },
    )
    .await;

    let reply = dispatch(
        &network,
        DispatchRequest::ListPoints {
            vehicle_id: "car-2".into(),
            latitude: -23.0,
            longitude: -46.0,
        },
    )
    .await;
    match reply {
        DispatchReply::PointList { pontos } => {
            assert_eq!(pontos.len(), 1);
            assert_eq!(pontos[0].id, "p1");
            assert_eq!(pontos[0].queue_length, 1);
            assert!(pontos[0].distance > 0.0);
        }
        other => panic!("Expected LISTA_PONTOS, got {other:?}"),
    }
}

#[tokio::test]
async fn payment_confirmation_is_repeatable() {
    let network = setup().await;
    for _ in 0..2 {
        let reply = dispatch(
            &network,
            DispatchRequest::PayPending {
                vehicle_id: "car-1".into(),
                session_id: "session-1".into(),
            },
        )
        .await;
        assert!(matches!(
            reply,
            DispatchReply::PaymentConfirmed { ref session_id, .. } if session_id == "session-1"
        ));
    }
}

#[tokio::test]
async fn missing_fields_are_answered_with_error() {
    let network = setup().await;
    let stream = TcpStream::connect(network.coordinator_endpoint.addr())
        .await
        .unwrap();
    let (reader, mut writer) = stream.into_split();
    writer
        .write_all(b"{\"action\":\"INICIO_CARREGAMENTO\",\"content\":{\"vehicleID\":\"car-1\"}}\n")
        .await
        .unwrap();

    let line = BufReader::new(reader)
        .lines()
        .next_line()
        .await
        .unwrap()
        .unwrap();
    let reply: DispatchReply = chargeq_wire::decode(&line).unwrap();
    assert!(matches!(reply, DispatchReply::Error { .. }));
}
