//! Crate-level error taxonomy.

// Layer 1: Standard library
use std::time::Duration;

// Layer 2: Third-party
use thiserror::Error;

// Layer 3: Internal
// (none)

/// Errors raised by the mailbox/actor layer.
#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("mailbox for actor '{0}' is closed")]
    Closed(String),
}

/// Errors raised by the router.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("actor '{0}' is already registered")]
    DuplicateRegistration(String),

    #[error("actor '{0}' is not registered")]
    NotFound(String),
}

/// Errors raised by the supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("unknown child kind '{0}'")]
    UnknownKind(String),

    #[error("child '{0}' is not managed by this supervisor")]
    UnknownChild(String),

    #[error("router error: {0}")]
    Router(#[from] RouterError),

    #[error("timed out waiting for child spawn after {0:?}")]
    SpawnTimeout(Duration),
}

/// Errors raised inside a worker actor.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("evaluation error: {0}")]
    Eval(String),

    #[error("no handler registered for message type '{0}'")]
    UnknownHandler(String),

    #[error("timed out waiting for reply after {0:?}")]
    ReplyTimeout(Duration),

    #[error("destination '{0}' is unreachable: not local and no peer gateway configured")]
    UnreachableDestination(String),

    #[error("message data for type '{0}' is not JSON-encodable: {1}")]
    NonSerializableMessage(String, String),

    #[error("router error: {0}")]
    Router(#[from] RouterError),
}

/// Errors raised by the peer (WebSocket) gateway.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("failed to connect to peer at '{0}': {1}")]
    ConnectFailed(String, String),

    #[error("peer link '{0}' closed")]
    LinkClosed(String),

    #[error("malformed peer frame: {0}")]
    MalformedFrame(String),

    #[error("nested forward_message frames are not allowed")]
    NestedForward,

    #[error("io error on peer link '{0}': {1}")]
    Io(String, String),
}

/// Errors raised at the HTTP/JSON-RPC gateway boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("spawn timed out after {0:?}")]
    SpawnTimeout(Duration),

    #[error("eval timed out after {0:?}")]
    EvalTimeout(Duration),

    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),

    #[error("invalid JSON-RPC request: {0}")]
    InvalidRequest(String),
}

/// Crate-wide error type composing every module's narrower error.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Mailbox(#[from] MailboxError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_error_displays_actor_name() {
        let err = RouterError::NotFound("echo".to_string());
        assert!(err.to_string().contains("echo"));
    }

    #[test]
    fn relay_error_wraps_worker_error_via_from() {
        let worker_err = WorkerError::UnknownHandler("ping".to_string());
        let relay_err: RelayError = worker_err.into();
        assert!(relay_err.to_string().contains("ping"));
    }

    #[test]
    fn gateway_error_wraps_supervisor_error() {
        let sup_err = SupervisorError::UnknownKind("Bogus".to_string());
        let gw_err: GatewayError = sup_err.into();
        assert!(matches!(gw_err, GatewayError::Supervisor(_)));
    }

    #[test]
    fn supervisor_error_wraps_router_error_via_from() {
        let router_err = RouterError::DuplicateRegistration("x".to_string());
        let sup_err: SupervisorError = router_err.into();
        assert!(matches!(sup_err, SupervisorError::Router(_)));
    }
}
