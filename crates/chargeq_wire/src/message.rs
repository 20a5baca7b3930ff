use chargeq_core::{ChargePoint, Position, RankedPoint};
use serde::{Deserialize, Serialize};

/// Action tags that can appear on the wire, requests and replies alike.
pub mod action {
    pub const LIST_POINTS: &str = "LISTAR_PONTOS";
    pub const POINT_LIST: &str = "LISTA_PONTOS";
    pub const POINT_INFO: &str = "INFORMACOES_DO_PONTO";
    pub const RESERVE: &str = "RESERVAR_PONTO";
    pub const RESERVED: &str = "RESERVA_CONFIRMADA";
    pub const CHECK_PRIORITY: &str = "VERIFICAR_PRIORIDADE";
    pub const HEAD_OF_QUEUE: &str = "PRIMEIRO_DA_FILA";
    pub const NOT_PRIORITY: &str = "NAO_EH_PRIORITARIO";
    pub const START_SESSION: &str = "INICIO_CARREGAMENTO";
    pub const SESSION_STARTED: &str = "CARREGAMENTO_INICIADO";
    pub const STOP_SESSION: &str = "FIM_CARREGAMENTO";
    pub const SESSION_FINISHED: &str = "CARREGAMENTO_FINALIZADO";
    pub const RELEASE: &str = "ENCERRAR_RESERVA";
    pub const RELEASED: &str = "RESERVA_ENCERRADA";
    pub const PAY_PENDING: &str = "PAGAR_PENDENCIA";
    pub const PAYMENT_CONFIRMED: &str = "PAGAMENTO_CONFIRMADO";
    pub const ERROR: &str = "ERRO";
}

/// The set of actions a message type accepts, checked before the content is
/// decoded so an unknown tag can be told apart from a bad payload.
pub trait Catalog: Serialize + serde::de::DeserializeOwned {
    const ACTIONS: &'static [&'static str];

    fn action(&self) -> &'static str;
}

/// Replies that can carry an `ERRO` back to the caller.
pub trait ErrorReply: Catalog {
    fn error(message: impl Into<String>) -> Self;
}

/// A queue position handed out by a charging point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(rename = "ID")]
    pub point_id: String,
    #[serde(rename = "vehicleID")]
    pub vehicle_id: String,
    #[serde(rename = "queuePosition")]
    pub queue_position: usize,
    #[serde(flatten)]
    pub position: Position,
}

/// Outcome of a head-of-queue removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(rename = "ID")]
    pub point_id: String,
    #[serde(rename = "vehicleID")]
    pub vehicle_id: String,
    pub success: bool,
    pub message: String,
}

/// Coordinator to queue manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "content")]
pub enum PointRequest {
    #[serde(rename = "LISTAR_PONTOS")]
    Describe {},
    #[serde(rename = "RESERVAR_PONTO")]
    Enqueue {
        #[serde(rename = "vehicleID")]
        vehicle_id: String,
    },
    #[serde(rename = "VERIFICAR_PRIORIDADE")]
    CheckPriority {
        #[serde(rename = "vehicleID")]
        vehicle_id: String,
    },
    #[serde(rename = "ENCERRAR_RESERVA")]
    Dequeue {
        #[serde(rename = "vehicleID")]
        vehicle_id: String,
    },
}

impl Catalog for PointRequest {
    const ACTIONS: &'static [&'static str] = &[
        action::LIST_POINTS,
        action::RESERVE,
        action::CHECK_PRIORITY,
        action::RELEASE,
    ];

    fn action(&self) -> &'static str {
        match self {
            PointRequest::Describe {} => action::LIST_POINTS,
            PointRequest::Enqueue { .. } => action::RESERVE,
            PointRequest::CheckPriority { .. } => action::CHECK_PRIORITY,
            PointRequest::Dequeue { .. } => action::RELEASE,
        }
    }
}

/// Queue manager to coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "content")]
pub enum PointReply {
    #[serde(rename = "INFORMACOES_DO_PONTO")]
    Info(ChargePoint),
    #[serde(rename = "RESERVA_CONFIRMADA")]
    Reserved(Reservation),
    #[serde(rename = "PRIMEIRO_DA_FILA")]
    HeadOfQueue { message: String },
    #[serde(rename = "NAO_EH_PRIORITARIO")]
    NotPriority { message: String },
    #[serde(rename = "RESERVA_ENCERRADA")]
    Released(Release),
    #[serde(rename = "ERRO")]
    Error { message: String },
}

impl Catalog for PointReply {
    const ACTIONS: &'static [&'static str] = &[
        action::POINT_INFO,
        action::RESERVED,
        action::HEAD_OF_QUEUE,
        action::NOT_PRIORITY,
        action::RELEASED,
        action::ERROR,
    ];

    fn action(&self) -> &'static str {
        match self {
            PointReply::Info(_) => action::POINT_INFO,
            PointReply::Reserved(_) => action::RESERVED,
            PointReply::HeadOfQueue { .. } => action::HEAD_OF_QUEUE,
            PointReply::NotPriority { .. } => action::NOT_PRIORITY,
            PointReply::Released(_) => action::RELEASED,
            PointReply::Error { .. } => action::ERROR,
        }
    }
}

impl ErrorReply for PointReply {
    fn error(message: impl Into<String>) -> Self {
        PointReply::Error {
            message: message.into(),
        }
    }
}

/// Client to coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "content")]
pub enum DispatchRequest {
    #[serde(rename = "LISTAR_PONTOS")]
    ListPoints {
        #[serde(rename = "vehicleID")]
        vehicle_id: String,
        latitude: f64,
        longitude: f64,
    },
    #[serde(rename = "RESERVAR_PONTO")]
    Reserve {
        #[serde(rename = "vehicleID")]
        vehicle_id: String,
        #[serde(rename = "pointID")]
        point_id: String,
        #[serde(rename = "alreadyQueued")]
        already_queued: bool,
    },
    #[serde(rename = "INICIO_CARREGAMENTO")]
    StartSession {
        #[serde(rename = "vehicleID")]
        vehicle_id: String,
        #[serde(rename = "pointID")]
        point_id: String,
    },
    #[serde(rename = "FIM_CARREGAMENTO")]
    StopSession {
        #[serde(rename = "vehicleID")]
        vehicle_id: String,
        #[serde(rename = "pointID")]
        point_id: String,
        #[serde(rename = "elapsedSeconds")]
        elapsed_seconds: f64,
        #[serde(rename = "isCharging")]
        is_charging: bool,
    },
    #[serde(rename = "PAGAR_PENDENCIA")]
    PayPending {
        #[serde(rename = "vehicleID")]
        vehicle_id: String,
        #[serde(rename = "sessionID")]
        session_id: String,
    },
}

impl Catalog for DispatchRequest {
    const ACTIONS: &'static [&'static str] = &[
        action::LIST_POINTS,
        action::RESERVE,
        action::START_SESSION,
        action::STOP_SESSION,
        action::PAY_PENDING,
    ];

    fn action(&self) -> &'static str {
        match self {
            DispatchRequest::ListPoints { .. } => action::LIST_POINTS,
            DispatchRequest::Reserve { .. } => action::RESERVE,
            DispatchRequest::StartSession { .. } => action::START_SESSION,
            DispatchRequest::StopSession { .. } => action::STOP_SESSION,
            DispatchRequest::PayPending { .. } => action::PAY_PENDING,
        }
    }
}

impl DispatchRequest {
    pub fn vehicle_id(&self) -> &str {
        match self {
            DispatchRequest::ListPoints { vehicle_id, .. }
            | DispatchRequest::Reserve { vehicle_id, .. }
            | DispatchRequest::StartSession { vehicle_id, .. }
            | DispatchRequest::StopSession { vehicle_id, .. }
            | DispatchRequest::PayPending { vehicle_id, .. } => vehicle_id,
        }
    }
}

/// Coordinator to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "content")]
pub enum DispatchReply {
    #[serde(rename = "LISTA_PONTOS")]
    PointList { pontos: Vec<RankedPoint> },
    #[serde(rename = "RESERVA_CONFIRMADA")]
    Reserved(Reservation),
    #[serde(rename = "CARREGAMENTO_INICIADO")]
    SessionStarted {
        #[serde(rename = "pointID")]
        point_id: String,
        #[serde(rename = "vehicleID")]
        vehicle_id: String,
    },
    #[serde(rename = "CARREGAMENTO_FINALIZADO")]
    SessionFinished { amount: f64 },
    #[serde(rename = "PAGAMENTO_CONFIRMADO")]
    PaymentConfirmed {
        #[serde(rename = "sessionID")]
        session_id: String,
        message: String,
    },
    #[serde(rename = "ERRO")]
    Error { message: String },
}

impl Catalog for DispatchReply {
    const ACTIONS: &'static [&'static str] = &[
        action::POINT_LIST,
        action::RESERVED,
        action::SESSION_STARTED,
        action::SESSION_FINISHED,
        action::PAYMENT_CONFIRMED,
        action::ERROR,
    ];

    fn action(&self) -> &'static str {
        match self {
            DispatchReply::PointList { .. } => action::POINT_LIST,
            DispatchReply::Reserved(_) => action::RESERVED,
            DispatchReply::SessionStarted { .. } => action::SESSION_STARTED,
            DispatchReply::SessionFinished { .. } => action::SESSION_FINISHED,
            DispatchReply::PaymentConfirmed { .. } => action::PAYMENT_CONFIRMED,
            DispatchReply::Error { .. } => action::ERROR,
        }
    }
}

impl ErrorReply for DispatchReply {
    fn error(message: impl Into<String>) -> Self {
        DispatchReply::Error {
            message: message.into(),
        }
    }
}
