//! Frame classification.
//!
//! One text frame is exactly one JSON object. Classification applies the
//! following rules in order:
//!
//! 1. `result` or `error` present → response (both present is a protocol
//!    error; the frame is dropped by the peer)
//! 2. `method` and `id` present → request
//! 3. `method` present, `id` absent → notification
//! 4. anything else → malformed
//!
//! The codec does not frame: lines are delimited at the transport boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jsonrpc::{
    ErrorObject, Message, Notification, Request, RequestId, Response, JSONRPC_VERSION,
};

/// Raw wire shape of any JSON-RPC frame.
#[derive(Serialize)]
struct RawFrame {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorObject>,
}

// Deserialization ignores the version field entirely; decoding is lenient
// about it, like the rest of the ecosystem.
#[derive(Deserialize)]
struct IncomingFrame {
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

/// A frame that failed to decode or classify.
#[derive(Debug)]
pub enum FrameError {
    /// The frame is not valid JSON at all; no id is recoverable.
    Json(serde_json::Error),
    /// The frame is a JSON value of the wrong shape (non-object, or fields
    /// of the wrong type). Carries the id when one could be extracted.
    Invalid {
        /// Best-effort extracted correlation id.
        id: Option<RequestId>,
    },
    /// The frame carries both `result` and `error`. Always dropped.
    ResultAndError {
        /// Correlation id of the offending frame.
        id: Option<RequestId>,
    },
    /// None of `method`, `result`, `error` is present. Always dropped.
    Malformed {
        /// Best-effort extracted correlation id.
        id: Option<RequestId>,
    },
}

impl FrameError {
    /// Returns the extracted correlation id, if any.
    #[must_use]
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            FrameError::Json(_) => None,
            FrameError::Invalid { id }
            | FrameError::ResultAndError { id }
            | FrameError::Malformed { id } => id.as_ref(),
        }
    }
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Json(e) => write!(f, "invalid JSON: {e}"),
            FrameError::Invalid { .. } => write!(f, "frame fields have the wrong types"),
            FrameError::ResultAndError { .. } => {
                write!(f, "frame carries both result and error")
            }
            FrameError::Malformed { .. } => {
                write!(f, "frame has no method, result, or error")
            }
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Json(e) => Some(e),
            _ => None,
        }
    }
}

/// Best-effort id extraction from an arbitrary JSON value.
fn extract_id(value: &Value) -> Option<RequestId> {
    match value.get("id") {
        Some(Value::String(s)) => Some(RequestId::String(s.clone())),
        Some(Value::Number(n)) => n.as_i64().map(RequestId::Number),
        _ => None,
    }
}

impl Message {
    /// Serializes the message to a single JSON text frame (no newline).
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let frame = match self {
            Message::Request(req) => RawFrame {
                jsonrpc: JSONRPC_VERSION,
                id: Some(req.id.clone()),
                method: Some(req.method.clone()),
                params: req.params.clone(),
                result: None,
                error: None,
            },
            Message::Notification(n) => RawFrame {
                jsonrpc: JSONRPC_VERSION,
                id: None,
                method: Some(n.method.clone()),
                params: n.params.clone(),
                result: None,
                error: None,
            },
            Message::Response(resp) => RawFrame {
                jsonrpc: JSONRPC_VERSION,
                id: Some(resp.id.clone()),
                method: None,
                params: None,
                result: resp.result.clone(),
                error: resp.error.clone(),
            },
        };
        serde_json::to_string(&frame)
    }

    /// Parses and classifies one text frame.
    pub fn decode(line: &str) -> Result<Message, FrameError> {
        let value: Value = serde_json::from_str(line).map_err(FrameError::Json)?;
        let id = extract_id(&value);

        let frame: IncomingFrame =
            serde_json::from_value(value).map_err(|_| FrameError::Invalid { id: id.clone() })?;

        // Rule 1: result/error presence wins.
        if frame.result.is_some() || frame.error.is_some() {
            if frame.result.is_some() && frame.error.is_some() {
                return Err(FrameError::ResultAndError { id: frame.id });
            }
            let id = frame.id.ok_or(FrameError::Malformed { id: None })?;
            return Ok(Message::Response(Response {
                id,
                result: frame.result,
                error: frame.error,
            }));
        }

        // Rules 2 and 3: method presence discriminates request/notification.
        if let Some(method) = frame.method {
            return Ok(match frame.id {
                Some(id) => Message::Request(Request {
                    id,
                    method,
                    params: frame.params,
                }),
                None => Message::Notification(Notification {
                    method,
                    params: frame.params,
                }),
            });
        }

        // Rule 4: malformed.
        Err(FrameError::Malformed { id: frame.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_request() {
        let msg = Message::decode(r#"{"jsonrpc":"2.0","id":"1","method":"ping"}"#).unwrap();
        match msg {
            Message::Request(req) => {
                assert_eq!(req.id, RequestId::String("1".into()));
                assert_eq!(req.method, "ping");
                assert!(req.params.is_none());
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn classify_notification() {
        let msg =
            Message::decode(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(matches!(msg, Message::Notification(_)));
    }

    #[test]
    fn classify_success_response() {
        let msg = Message::decode(r#"{"jsonrpc":"2.0","id":7,"result":{"ok":true}}"#).unwrap();
        match msg {
            Message::Response(resp) => {
                assert_eq!(resp.id, RequestId::Number(7));
                assert!(!resp.is_error());
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn classify_error_response() {
        let msg = Message::decode(
            r#"{"jsonrpc":"2.0","id":"7","error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        match msg {
            Message::Response(resp) => {
                let err = resp.error.unwrap();
                assert_eq!(err.code, -32601);
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn result_wins_over_method() {
        // A frame with both method and result classifies as a response.
        let msg =
            Message::decode(r#"{"jsonrpc":"2.0","id":"1","method":"x","result":{}}"#).unwrap();
        assert!(matches!(msg, Message::Response(_)));
    }

    #[test]
    fn both_result_and_error_is_rejected() {
        let err = Message::decode(
            r#"{"jsonrpc":"2.0","id":"3","result":{},"error":{"code":1,"message":"?"}}"#,
        )
        .unwrap_err();
        match err {
            FrameError::ResultAndError { id } => {
                assert_eq!(id, Some(RequestId::String("3".into())));
            }
            other => panic!("expected ResultAndError, got {other:?}"),
        }
    }

    #[test]
    fn malformed_frame_keeps_id() {
        let err = Message::decode(r#"{"jsonrpc":"2.0","id":"9"}"#).unwrap_err();
        assert_eq!(err.id(), Some(&RequestId::String("9".into())));
        assert!(matches!(err, FrameError::Malformed { .. }));
    }

    #[test]
    fn invalid_json_has_no_id() {
        let err = Message::decode("{not json").unwrap_err();
        assert!(matches!(err, FrameError::Json(_)));
        assert!(err.id().is_none());
    }

    #[test]
    fn wrong_field_types_keep_id() {
        let err = Message::decode(r#"{"jsonrpc":"2.0","id":"4","method":5}"#).unwrap_err();
        match err {
            FrameError::Invalid { id } => assert_eq!(id, Some(RequestId::String("4".into()))),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn encode_omits_null_fields() {
        let msg = Message::Notification(Notification {
            method: "notifications/initialized".into(),
            params: None,
        });
        let line = msg.encode().unwrap();
        assert!(line.contains("\"jsonrpc\":\"2.0\""));
        assert!(!line.contains("params"));
        assert!(!line.contains("id"));
    }

    #[test]
    fn roundtrip_all_variants() {
        let messages = [
            Message::Request(Request {
                id: RequestId::String("1".into()),
                method: "tools/list".into(),
                params: Some(json!({"cursor": "c1"})),
            }),
            Message::Notification(Notification {
                method: "notifications/progress".into(),
                params: Some(json!({"progressToken": "t", "progress": 0.5})),
            }),
            Message::Response(Response::success("2".into(), json!({"tools": []}))),
            Message::Response(Response::error(
                "3".into(),
                ErrorObject {
                    code: -32602,
                    message: "Invalid params: x".into(),
                    data: None,
                },
            )),
        ];
        for msg in messages {
            let line = msg.encode().unwrap();
            let decoded = Message::decode(&line).unwrap();
            assert_eq!(decoded, msg);
        }
    }
}
