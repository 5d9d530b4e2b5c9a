//! JSON-RPC 2.0 message envelope.
//!
//! The envelope is a three-variant tagged union: requests carry an id and a
//! method, notifications carry a method only, responses carry an id and
//! exactly one of `result`/`error`. Classification of raw frames lives in
//! [`crate::codec`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use twinmcp_core::{McpError, McpErrorCode};

/// The JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC correlation id.
///
/// Outgoing ids are process-monotonic integers rendered as decimal strings;
/// incoming ids may be strings or numbers, at the remote peer's choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String id.
    String(String),
    /// Integer id.
    Number(i64),
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_owned())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// JSON-RPC error object carried in error responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Error code.
    pub code: i64,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<McpError> for ErrorObject {
    fn from(err: McpError) -> Self {
        Self {
            code: err.code.into(),
            message: err.message,
            data: err.data,
        }
    }
}

impl From<ErrorObject> for McpError {
    fn from(err: ErrorObject) -> Self {
        McpError {
            code: McpErrorCode::from_code(err.code),
            message: err.message,
            data: err.data,
        }
    }
}

/// An outgoing or incoming request: expects exactly one response.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Correlation id.
    pub id: RequestId,
    /// Method name.
    pub method: String,
    /// Method-specific parameters.
    pub params: Option<Value>,
}

/// A fire-and-forget notification: no id, never answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Method name.
    pub method: String,
    /// Method-specific parameters.
    pub params: Option<Value>,
}

/// A response to a request: carries exactly one of `result`/`error`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Correlation id of the request this answers.
    pub id: RequestId,
    /// Result value (present on success).
    pub result: Option<Value>,
    /// Error object (present on failure).
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Creates a success response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(id: RequestId, error: ErrorObject) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Returns true if this is an error response.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Splits the response into its success or error value.
    ///
    /// A response with neither member (possible only by construction, never
    /// by decoding) yields `Ok(Value::Null)`.
    pub fn into_result(self) -> Result<Value, ErrorObject> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// A JSON-RPC message: request, response, or notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A request expecting a response.
    Request(Request),
    /// A response completing a request.
    Response(Response),
    /// A notification; never answered.
    Notification(Notification),
}
