//! JSON-RPC 2.0 wire types for the HTTP gateway.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Layer 3: Internal
// (none)

/// Standard JSON-RPC 2.0 error codes used by this gateway.
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const APPLICATION_ERROR: i64 = -32000;
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
            id,
        }
    }
}

/// Splits a JSON-RPC `method` of the form `"actor.receive_name"` into its
/// two parts, mirroring the worker's `send` builtin destination syntax.
pub fn split_method(method: &str) -> Result<(String, String), JsonRpcError> {
    match method.rsplit_once('.') {
        Some((actor, receive)) if !actor.is_empty() && !receive.is_empty() => Ok((actor.to_string(), receive.to_string())),
        _ => Err(JsonRpcError {
            code: error_codes::METHOD_NOT_FOUND,
            message: format!("method '{method}' must be of the form 'actor.receive_name'"),
            data: None,
        }),
    }
}
