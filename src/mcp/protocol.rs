//! JSON-RPC 2.0 message types for the MCP protocol.
//!
//! Incoming lines are either requests (carry an `id`, expect a reply) or
//! notifications (no `id`, never answered). Every reply is a
//! [`JsonRpcResponse`] whose outcome is either a `result` or an `error`.
//!
//! MCP narrows JSON-RPC slightly: request ids are strings or integers, never
//! `null`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The JSON-RPC version string every message carries.
pub const JSONRPC_VERSION: &str = "2.0";

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported during initialisation.
pub const SERVER_NAME: &str = "youtube-transcript-mcp";

/// A request id: integer or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// A request expecting a response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Request identifier, echoed in the response.
    pub id: RequestId,
    /// The method to invoke.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Deserialises the params into `T`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-params error if the params are missing or malformed.
    pub fn parse_params<T: serde::de::DeserializeOwned>(
        &self,
        what: &str,
    ) -> Result<T, JsonRpcResponse> {
        let params = self.params.clone().ok_or_else(|| {
            JsonRpcResponse::invalid_params(self.id.clone(), format!("Missing {what} params"))
        })?;
        serde_json::from_value(params).map_err(|e| {
            JsonRpcResponse::invalid_params(self.id.clone(), format!("Invalid {what} params: {e}"))
        })
    }
}

/// A one-way message from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcNotification {
    /// The notification method.
    pub method: String,
    /// Notification parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// A parsed incoming line.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    /// A request expecting a response.
    Request(JsonRpcRequest),
    /// A notification (no response expected).
    Notification(JsonRpcNotification),
}

impl IncomingMessage {
    /// Returns the method name of this message.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Request(req) => &req.method,
            Self::Notification(notif) => &notif.method,
        }
    }

    /// Returns the request ID if this is a request.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(&req.id),
            Self::Notification(_) => None,
        }
    }
}

/// Standard JSON-RPC 2.0 error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    /// The error code.
    pub code: i32,
    /// A short description of the error.
    pub message: String,
    /// Additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Either side of a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The method succeeded.
    Result(Value),
    /// The method failed.
    Error(ErrorObject),
}

/// A reply to a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,
    /// The request this answers; `null` when the request could not be read.
    pub id: Option<RequestId>,
    /// `result` or `error`.
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl JsonRpcResponse {
    /// Creates a success response.
    #[must_use]
    pub const fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id),
            outcome: Outcome::Result(result),
        }
    }

    /// Creates an error response with a custom message.
    #[must_use]
    pub fn error(id: Option<RequestId>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Error(ErrorObject {
                code: code.code(),
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Creates a parse error response (ID cannot be determined).
    #[must_use]
    pub fn parse_error() -> Self {
        Self::error(None, ErrorCode::ParseError, ErrorCode::ParseError.default_message())
    }

    /// Creates an invalid request error response.
    #[must_use]
    pub fn invalid_request(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::error(id, ErrorCode::InvalidRequest, message)
    }

    /// Creates a method not found error response.
    #[must_use]
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::error(
            Some(id),
            ErrorCode::MethodNotFound,
            format!("Method not found: {method}"),
        )
    }

    /// Creates an invalid params error response.
    #[must_use]
    pub fn invalid_params(id: RequestId, message: impl Into<String>) -> Self {
        Self::error(Some(id), ErrorCode::InvalidParams, message)
    }

    /// Creates an internal error response.
    #[must_use]
    pub fn internal_error(id: RequestId, message: impl Into<String>) -> Self {
        Self::error(Some(id), ErrorCode::InternalError, message)
    }

    /// The error object, if this is an error response.
    #[must_use]
    pub const fn error_object(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Error(e) => Some(e),
            Outcome::Result(_) => None,
        }
    }
}

fn request_id(obj: &Map<String, Value>) -> Option<RequestId> {
    obj.get("id")
        .cloned()
        .and_then(|id| serde_json::from_value(id).ok())
}

/// Parses one line into an incoming message.
///
/// # Errors
///
/// Returns the error response to send back: parse error for anything that is
/// not a JSON object, invalid request for objects that are not JSON-RPC 2.0
/// requests or notifications.
pub fn parse_message(line: &str) -> Result<IncomingMessage, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line).map_err(|_| JsonRpcResponse::parse_error())?;
    let Value::Object(obj) = value else {
        return Err(JsonRpcResponse::parse_error());
    };

    let id = request_id(&obj);

    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(JsonRpcResponse::invalid_request(
            id,
            "jsonrpc field must be \"2.0\"",
        ));
    }

    let has_id = obj.contains_key("id");
    let value = Value::Object(obj);

    if has_id {
        let request: JsonRpcRequest = serde_json::from_value(value).map_err(|e| {
            JsonRpcResponse::invalid_request(id.clone(), format!("Invalid request: {e}"))
        })?;
        if request.method.is_empty() {
            return Err(JsonRpcResponse::invalid_request(
                Some(request.id),
                "method field cannot be empty",
            ));
        }
        Ok(IncomingMessage::Request(request))
    } else {
        let notification: JsonRpcNotification = serde_json::from_value(value).map_err(|e| {
            JsonRpcResponse::invalid_request(None, format!("Invalid notification: {e}"))
        })?;
        Ok(IncomingMessage::Notification(notification))
    }
}
