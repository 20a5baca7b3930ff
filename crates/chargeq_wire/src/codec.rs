use crate::message::Catalog;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("invalid content for {action}: {source}")]
    InvalidContent {
        action: String,
        source: serde_json::Error,
    },
    #[error("could not encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Deserialize)]
struct Envelope {
    action: String,
    #[serde(default)]
    content: Value,
}

/// Decodes one line into a typed message.
///
/// A line that is not a JSON object with an `action` string is `Malformed`;
/// an action outside `T`'s catalog is `UnknownAction`; missing or mistyped
/// fields are `InvalidContent`. Absent or `null` content reads as `{}`.
pub fn decode<T: Catalog>(line: &str) -> Result<T, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(line.trim()).map_err(ProtocolError::Malformed)?;
    if !T::ACTIONS.contains(&envelope.action.as_str()) {
        return Err(ProtocolError::UnknownAction(envelope.action));
    }

    let content = match envelope.content {
        Value::Null => Value::Object(Map::new()),
        content => content,
    };
    serde_json::from_value(json!({ "action": &envelope.action, "content": content })).map_err(
        |source| ProtocolError::InvalidContent {
            action: envelope.action,
            source,
        },
    )
}

/// Encodes a message as a single newline-terminated line.
pub fn encode<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(message).map_err(ProtocolError::Encode)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{DispatchReply, DispatchRequest, PointRequest};

    #[test]
    fn test_decode_request() {
        let line = r#"{"action":"RESERVAR_PONTO","content":{"vehicleID":"car-1","pointID":"p1","alreadyQueued":false}}"#;
        let request: DispatchRequest = decode(line).unwrap();
        assert_eq!(
            request,
            DispatchRequest::Reserve {
                vehicle_id: "car-1".into(),
                point_id: "p1".into(),
                already_queued: false,
            }
        );
    }

    #[test]
    fn test_decode_missing_content_as_empty() {
        let request: PointRequest = decode(r#"{"action":"LISTAR_PONTOS"}"#).unwrap();
        assert_eq!(request, PointRequest::Describe {});

        let request: PointRequest = decode(r#"{"action":"LISTAR_PONTOS","content":null}"#).unwrap();
        assert_eq!(request, PointRequest::Describe {});
    }

    #[test]
    fn test_decode_malformed() {
        for line in ["not json", "{}", r#"{"content":{}}"#, r#"{"action":5}"#] {
            match decode::<DispatchRequest>(line) {
                Err(ProtocolError::Malformed(_)) => {}
                other => panic!("Expected Malformed for {line:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_unknown_action() {
        match decode::<DispatchRequest>(r#"{"action":"DANCAR","content":{}}"#) {
            Err(ProtocolError::UnknownAction(action)) => assert_eq!(action, "DANCAR"),
            other => panic!("Expected UnknownAction, got {other:?}"),
        }

        // Point-only actions are unknown to the coordinator
        assert!(matches!(
            decode::<DispatchRequest>(r#"{"action":"ENCERRAR_RESERVA","content":{"vehicleID":"a"}}"#),
            Err(ProtocolError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_decode_invalid_content() {
        // Missing elapsedSeconds
        let line = r#"{"action":"FIM_CARREGAMENTO","content":{"vehicleID":"car-1","pointID":"p1","isCharging":true}}"#;
        match decode::<DispatchRequest>(line) {
            Err(ProtocolError::InvalidContent { action, .. }) => {
                assert_eq!(action, "FIM_CARREGAMENTO")
            }
            other => panic!("Expected InvalidContent, got {other:?}"),
        }

        // Wrong type
        let line = r#"{"action":"VERIFICAR_PRIORIDADE","content":{"vehicleID":42}}"#;
        assert!(matches!(
            decode::<PointRequest>(line),
            Err(ProtocolError::InvalidContent { .. })
        ));
    }

    #[test]
    fn test_encode_is_one_line() {
        let line = encode(&DispatchReply::SessionFinished { amount: 50.0 }).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let reply: DispatchReply = decode(&line).unwrap();
        assert_eq!(reply, DispatchReply::SessionFinished { amount: 50.0 });
    }
}
