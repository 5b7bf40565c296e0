//! The node's two external surfaces: the HTTP/JSON-RPC request gateway
//! and the WebSocket peer-link gateway.

pub mod http;
pub mod ws;

pub use http::{build_router, GatewayState};
pub use ws::{PeerDirectory, PeerGatewayActor, PeerGatewayHandle};
