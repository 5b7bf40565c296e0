//! CLI entry point: wires a [`relay_rt::Router`], a supervisor, and the
//! HTTP/JSON-RPC and WebSocket peer gateways into one runnable node.

// Layer 1: Standard library
use std::net::SocketAddr;
use std::process::ExitCode;

// Layer 2: Third-party
use clap::Parser;
use tracing_subscriber::EnvFilter;

// Layer 3: Internal
use relay_rt::actor;
use relay_rt::config::NodeConfig;
use relay_rt::gateway::{self, GatewayState, PeerDirectory, PeerGatewayActor};
use relay_rt::message::{types, Message};
use relay_rt::router::Router;
use relay_rt::supervisor::SupervisorActor;

const WS_GATEWAY_NAME: &str = "ws-gateway";
const SUPERVISOR_NAME: &str = "supervisor";

/// A Relay federation node: actor runtime, HTTP/JSON-RPC gateway, and
/// WebSocket peer links in one process.
#[derive(Parser, Debug)]
#[command(name = "relay-node", version, about)]
struct Args {
    /// Listen port for the HTTP and WebSocket gateways.
    #[arg(long = "port", default_value_t = relay_rt::config::DEFAULT_PORT)]
    port: u16,

    /// This node's advertised identity.
    #[arg(long = "node-id", default_value = "relay-node")]
    node_id: String,

    /// A peer URL to dial at startup. Repeatable.
    #[arg(long = "add-peer")]
    add_peer: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let config = match NodeConfig::builder().with_port(args.port).with_node_id(args.node_id).with_initial_peers(args.add_peer).build() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    run(config).await
}

async fn run(config: NodeConfig) -> ExitCode {
    let router = Router::new();

    let supervisor = SupervisorActor::new(Some(WS_GATEWAY_NAME.to_string()), config.mailbox_capacity);
    let _supervisor_handle = actor::spawn_with_capacity(SUPERVISOR_NAME, router.clone(), Box::new(supervisor), config.mailbox_capacity);

    let peer_directory = PeerDirectory::new();
    let (ws_actor, ws_handle) = PeerGatewayActor::new(peer_directory.clone());
    let _ws_gateway_handle = actor::spawn_with_capacity(WS_GATEWAY_NAME, router.clone(), Box::new(ws_actor), config.mailbox_capacity);

    for peer_url in &config.initial_peers {
        router.send(Message::new(WS_GATEWAY_NAME, "relay-node", types::CONNECT_TO_PEER, serde_json::Value::String(peer_url.clone())));
    }

    let state = GatewayState {
        router: router.clone(),
        supervisor_name: SUPERVISOR_NAME.to_string(),
        ws_gateway_name: WS_GATEWAY_NAME.to_string(),
        ws_gateway_handle: ws_handle,
        peer_directory,
        config: config.clone(),
    };

    let app = gateway::build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(addr = %addr, node_id = %config.node_id, "relay-node listening");

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        tracing::error!(error = %e, "gateway server exited with an error");
        return ExitCode::FAILURE;
    }

    tracing::info!("shutting down actors");
    match tokio::time::timeout(config.shutdown_timeout, router.stop_all()).await {
        Ok(()) => {}
        Err(_) => tracing::warn!(timeout = ?config.shutdown_timeout, "graceful shutdown timed out; exiting anyway"),
    }

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received ctrl-c, starting graceful shutdown"),
        Err(e) => tracing::error!(error = %e, "failed to install ctrl-c handler"),
    }
}
