//! The HTTP/JSON-RPC gateway: the node's external request surface.
//!
//! `/eval` spawns a fresh ephemeral worker per request via the supervisor,
//! evaluates the posted source against it, and tears it down afterward —
//! the only gateway endpoint that owns an actor's lifecycle end to end.
//! `/rpc` instead addresses an already-running, named actor directly.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router as AxumRouter};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Layer 3: Internal
use crate::config::NodeConfig;
use crate::gateway::ws::{PeerDirectory, PeerGatewayHandle};
use crate::jsonrpc::{error_codes, split_method, JsonRpcRequest, JsonRpcResponse};
use crate::message::{types, Message};
use crate::router::Router;
use crate::supervisor::KIND_SERVER_ACTOR;

/// Shared state handed to every axum handler. Cloning is cheap: every
/// field is itself a handle (`Arc`-backed or a plain string/config copy).
#[derive(Clone)]
pub struct GatewayState {
    pub router: Router,
    pub supervisor_name: String,
    pub ws_gateway_name: String,
    pub ws_gateway_handle: PeerGatewayHandle,
    pub peer_directory: PeerDirectory,
    pub config: NodeConfig,
}

pub fn build_router(state: GatewayState) -> AxumRouter {
    AxumRouter::new()
        .route("/eval", post(eval_handler))
        .route("/rpc", post(rpc_handler))
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/registry", get(registry_handler))
        .route("/registry/peers", get(registry_peers_handler))
        .route("/ws", get(ws_upgrade_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn spawn_ephemeral_worker(state: &GatewayState) -> Result<String, (StatusCode, String)> {
    let (msg, rx) = Message::new(state.supervisor_name.clone(), "http-gateway", Message::create_child_type(KIND_SERVER_ACTOR), Value::Null).with_reply();
    state.router.send(msg);

    match tokio::time::timeout(state.config.gateway_timeout, rx).await {
        Ok(Ok(reply)) => reply
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| (StatusCode::INTERNAL_SERVER_ERROR, "spawn reply was missing a name".to_string())),
        Ok(Err(_)) => Err((StatusCode::INTERNAL_SERVER_ERROR, "supervisor dropped the spawn reply".to_string())),
        Err(_) => Err((StatusCode::GATEWAY_TIMEOUT, "spawn timed out".to_string())),
    }
}

async fn eval_handler(State(state): State<GatewayState>, body: String) -> Response {
    let worker_name = match spawn_ephemeral_worker(&state).await {
        Ok(name) => name,
        Err((code, msg)) => return (code, msg).into_response(),
    };

    let (msg, rx) = Message::new(worker_name.clone(), "http-gateway", types::EVAL, json!(body)).with_reply();
    state.router.send(msg);

    let result = match tokio::time::timeout(state.config.gateway_timeout, rx).await {
        Ok(Ok(reply)) => interpret_eval_reply(reply),
        Ok(Err(_)) => Err((StatusCode::INTERNAL_SERVER_ERROR, "worker dropped the eval reply".to_string())),
        Err(_) => Err((StatusCode::GATEWAY_TIMEOUT, "eval timed out".to_string())),
    };

    state.router.send(Message::new(state.supervisor_name.clone(), "http-gateway", types::STOP_CHILD, json!(worker_name)));

    match result {
        Ok(text) => (StatusCode::OK, text).into_response(),
        Err((code, msg)) => (code, msg).into_response(),
    }
}

fn interpret_eval_reply(reply: Value) -> Result<String, (StatusCode, String)> {
    match reply.get("type").and_then(Value::as_str) {
        Some(types::EVAL_RESULT) => Ok(value_to_text(reply.get("value").cloned().unwrap_or(Value::Null))),
        Some(types::EVAL_ERROR) => Err((StatusCode::BAD_REQUEST, reply.get("error").and_then(Value::as_str).unwrap_or("evaluation error").to_string())),
        _ => Err((StatusCode::INTERNAL_SERVER_ERROR, "malformed eval reply".to_string())),
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

async fn rpc_handler(State(state): State<GatewayState>, Json(req): Json<JsonRpcRequest>) -> Json<JsonRpcResponse> {
    let id = req.id.clone().unwrap_or(Value::Null);

    if req.jsonrpc != "2.0" {
        return Json(JsonRpcResponse::failure(id, error_codes::INVALID_REQUEST, "jsonrpc must be \"2.0\"", None));
    }

    let (actor_name, receive_name) = match split_method(&req.method) {
        Ok(parts) => parts,
        Err(err) => return Json(JsonRpcResponse::failure(id, err.code, err.message, err.data)),
    };

    if !state.router.has_actor(&actor_name) {
        return Json(JsonRpcResponse::failure(id, error_codes::METHOD_NOT_FOUND, format!("actor '{actor_name}' is not registered"), None));
    }

    let (msg, rx) = Message::new(actor_name, "http-gateway", receive_name, req.params).with_reply();
    state.router.send(msg);

    match tokio::time::timeout(state.config.gateway_timeout, rx).await {
        Ok(Ok(reply)) => Json(interpret_rpc_reply(id, reply)),
        Ok(Err(_)) => Json(JsonRpcResponse::failure(id, error_codes::INTERNAL_ERROR, "actor dropped the reply", None)),
        Err(_) => Json(JsonRpcResponse::failure(id, error_codes::INTERNAL_ERROR, "request timed out", None)),
    }
}

fn interpret_rpc_reply(id: Value, reply: Value) -> JsonRpcResponse {
    match reply.get("type").and_then(Value::as_str) {
        Some(types::RECEIVE_RESULT) => JsonRpcResponse::success(id, reply.get("value").cloned().unwrap_or(Value::Null)),
        Some(types::RECEIVE_ERROR) => {
            JsonRpcResponse::failure(id, error_codes::APPLICATION_ERROR, reply.get("error").and_then(Value::as_str).unwrap_or("handler error").to_string(), None)
        }
        _ => JsonRpcResponse::success(id, reply),
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn info_handler(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({
        "node_id": state.config.node_id,
        "port": state.config.port,
        "peer_count": state.peer_directory.count(),
        "actor_count": state.router.actor_count(),
    }))
}

async fn registry_handler(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({ "actors": state.router.actor_names() }))
}

async fn registry_peers_handler(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({ "peers": state.peer_directory.list() }))
}

async fn ws_upgrade_handler(State(state): State<GatewayState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        let remote_id = format!("inbound-{}", crate::util::ActorId::new());
        state.ws_gateway_handle.register_inbound(remote_id, socket, state.router.clone(), state.ws_gateway_name.clone());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ws::PeerGatewayActor;

    fn test_state() -> GatewayState {
        let (_actor, handle) = PeerGatewayActor::new(PeerDirectory::new());
        GatewayState {
            router: Router::new(),
            supervisor_name: "supervisor".to_string(),
            ws_gateway_name: "ws-gateway".to_string(),
            ws_gateway_handle: handle,
            peer_directory: PeerDirectory::new(),
            config: NodeConfig::default(),
        }
    }

    #[test]
    fn value_to_text_unwraps_strings_without_quoting() {
        assert_eq!(value_to_text(Value::String("hi".to_string())), "hi");
        assert_eq!(value_to_text(json!(15)), "15");
    }

    #[test]
    fn interpret_eval_reply_maps_eval_error_to_bad_request() {
        let reply = json!({"type": types::EVAL_ERROR, "error": "boom"});
        let (code, msg) = interpret_eval_reply(reply).unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "boom");
    }

    #[test]
    fn interpret_eval_reply_maps_eval_result_to_ok_text() {
        let reply = json!({"type": types::EVAL_RESULT, "value": 15});
        let text = interpret_eval_reply(reply).expect("ok");
        assert_eq!(text, "15");
    }

    #[tokio::test]
    async fn rpc_handler_reports_method_not_found_for_unregistered_actor() {
        let state = test_state();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "ghost.inc".to_string(),
            params: Value::Null,
            id: Some(json!(1)),
        };

        let Json(resp) = rpc_handler(State(state), Json(req)).await;
        let err = resp.error.expect("error present");
        assert_eq!(err.code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn rpc_handler_rejects_non_2_0_jsonrpc_version() {
        let state = test_state();
        let req = JsonRpcRequest {
            jsonrpc: "1.0".to_string(),
            method: "x.y".to_string(),
            params: Value::Null,
            id: None,
        };

        let Json(resp) = rpc_handler(State(state), Json(req)).await;
        let err = resp.error.expect("error present");
        assert_eq!(err.code, error_codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn health_handler_reports_ok() {
        let Json(body) = health_handler().await;
        assert_eq!(body["status"], json!("ok"));
    }

    #[tokio::test]
    async fn info_handler_reports_node_id_and_counts() {
        let state = test_state();
        let Json(body) = info_handler(State(state)).await;
        assert_eq!(body["node_id"], json!("relay-node"));
        assert_eq!(body["peer_count"], json!(0));
    }
}
