//! Protocol error taxonomy.
//!
//! Every failure that can cross the wire is an [`McpError`]: a JSON-RPC
//! error code, a human-readable message, and optional structured data.
//! Internal error kinds (missing argument, unknown argument, unimplemented
//! handler) are expressed through the constructors so the mapping to codes
//! lives in exactly one place.

use serde_json::Value;

/// JSON-RPC error codes used by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpErrorCode {
    /// Malformed frame (-32700).
    ParseError,
    /// Unknown method, wrong direction, or unimplemented handler (-32601).
    MethodNotFound,
    /// Argument-shape failure: missing, unknown, or invalid params (-32602).
    InvalidParams,
    /// Uncaught handler failure (-32603).
    InternalError,
    /// Any other code received from a remote peer.
    Other(i64),
}

impl McpErrorCode {
    /// Returns the wire-level integer code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            McpErrorCode::ParseError => -32700,
            McpErrorCode::MethodNotFound => -32601,
            McpErrorCode::InvalidParams => -32602,
            McpErrorCode::InternalError => -32603,
            McpErrorCode::Other(code) => code,
        }
    }

    /// Maps a wire-level integer code back to a known code.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            -32700 => McpErrorCode::ParseError,
            -32601 => McpErrorCode::MethodNotFound,
            -32602 => McpErrorCode::InvalidParams,
            -32603 => McpErrorCode::InternalError,
            other => McpErrorCode::Other(other),
        }
    }
}

impl From<McpErrorCode> for i64 {
    fn from(code: McpErrorCode) -> Self {
        code.code()
    }
}

/// A protocol-level error.
#[derive(Debug, Clone)]
pub struct McpError {
    /// The JSON-RPC code this error maps to.
    pub code: McpErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Optional structured error data.
    pub data: Option<Value>,
}

impl McpError {
    /// Creates an error with the given code and message.
    #[must_use]
    pub fn new(code: McpErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// A malformed-frame error (-32700).
    #[must_use]
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(McpErrorCode::ParseError, detail)
    }

    /// An unknown-method error (-32601). Carries the original method string.
    #[must_use]
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            McpErrorCode::MethodNotFound,
            format!("Method not found: {}", method.into()),
        )
    }

    /// The error returned by unimplemented handler defaults (-32601).
    #[must_use]
    pub fn not_implemented() -> Self {
        Self::new(McpErrorCode::MethodNotFound, "Method not found")
    }

    /// An argument is required but absent from the incoming object (-32602).
    #[must_use]
    pub fn missing_required_argument(name: impl Into<String>) -> Self {
        Self::new(
            McpErrorCode::InvalidParams,
            format!("Missing required argument: {}", name.into()),
        )
    }

    /// An incoming key is not a known parameter (-32602).
    #[must_use]
    pub fn unknown_argument(name: impl Into<String>) -> Self {
        Self::new(
            McpErrorCode::InvalidParams,
            format!("Unknown argument: {}", name.into()),
        )
    }

    /// Any other parameter validation failure (-32602).
    #[must_use]
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(
            McpErrorCode::InvalidParams,
            format!("Invalid params: {}", detail.into()),
        )
    }

    /// An uncaught handler failure (-32603).
    #[must_use]
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new(
            McpErrorCode::InternalError,
            format!("Internal error: {}", detail.into()),
        )
    }
}

impl std::fmt::Display for McpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code.code())
    }
}

impl std::error::Error for McpError {}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::internal_error(err.to_string())
    }
}

/// Result alias for protocol-level operations.
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_jsonrpc_integers() {
        assert_eq!(McpErrorCode::ParseError.code(), -32700);
        assert_eq!(McpErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(McpErrorCode::InvalidParams.code(), -32602);
        assert_eq!(McpErrorCode::InternalError.code(), -32603);
        assert_eq!(McpErrorCode::Other(-32000).code(), -32000);
    }

    #[test]
    fn code_roundtrip() {
        for code in [-32700, -32601, -32602, -32603, -32000] {
            assert_eq!(McpErrorCode::from_code(code).code(), code);
        }
    }

    #[test]
    fn argument_errors_name_the_offender() {
        let missing = McpError::missing_required_argument("name");
        assert_eq!(missing.code, McpErrorCode::InvalidParams);
        assert!(missing.message.contains("name"));

        let unknown = McpError::unknown_argument("extra");
        assert_eq!(unknown.code, McpErrorCode::InvalidParams);
        assert!(unknown.message.contains("extra"));
    }

    #[test]
    fn not_implemented_reads_as_method_not_found() {
        let err = McpError::not_implemented();
        assert_eq!(err.code, McpErrorCode::MethodNotFound);
        assert_eq!(err.message, "Method not found");
    }
}
