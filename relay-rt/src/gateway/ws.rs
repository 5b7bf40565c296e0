//! The WebSocket peer gateway: maintains outbound-dialed and
//! inbound-accepted peer links, serializes local messages to JSON for
//! forwarding across them, and re-injects decoded inbound frames into the
//! local router.
//!
//! A live socket cannot be carried as `Message` data, so registering an
//! inbound (axum-accepted) connection happens through [`PeerGatewayHandle`]
//! — a direct call from the HTTP gateway's `/ws` upgrade handler — rather
//! than through the actor mailbox. Outbound dialing and broadcast
//! forwarding, which only ever need JSON-encodable arguments, go through
//! [`PeerGatewayActor`] like any other message-driven actor.

// Layer 1: Standard library
use std::sync::Arc;

// Layer 2: Third-party
use async_trait::async_trait;
use axum::extract::ws::{Message as AxumWsMessage, WebSocket};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;

// Layer 3: Internal
use crate::actor::{ActorBehavior, ActorContext};
use crate::error::{PeerError, RelayError};
use crate::message::{types, Message, PeerFrame};
use crate::router::Router;

/// Writes one outbound text frame to a peer link, regardless of whether
/// the underlying socket was dialed out (tokio-tungstenite) or accepted
/// inbound (axum's `ws` upgrade).
#[async_trait]
trait PeerWriter: Send {
    async fn write_text(&mut self, text: String) -> Result<(), PeerError>;
}

struct OutboundWriter(futures::stream::SplitSink<tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>, TungsteniteMessage>);

#[async_trait]
impl PeerWriter for OutboundWriter {
    async fn write_text(&mut self, text: String) -> Result<(), PeerError> {
        self.0
            .send(TungsteniteMessage::Text(text.into()))
            .await
            .map_err(|e| PeerError::Io("outbound".to_string(), e.to_string()))
    }
}

struct InboundWriter(futures::stream::SplitSink<WebSocket, AxumWsMessage>);

#[async_trait]
impl PeerWriter for InboundWriter {
    async fn write_text(&mut self, text: String) -> Result<(), PeerError> {
        self.0
            .send(AxumWsMessage::Text(text.into()))
            .await
            .map_err(|e| PeerError::Io("inbound".to_string(), e.to_string()))
    }
}

/// A read-mostly listing of currently connected peer remote ids, shared
/// between the gateway and the HTTP introspection endpoints. Cheap to
/// clone, same pattern as [`crate::router::Router`].
#[derive(Clone, Default)]
pub struct PeerDirectory {
    remotes: Arc<DashMap<String, ()>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&self, remote: &str) {
        self.remotes.insert(remote.to_string(), ());
    }

    fn remove(&self, remote: &str) {
        self.remotes.remove(remote);
    }

    pub fn list(&self) -> Vec<String> {
        self.remotes.iter().map(|e| e.key().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.remotes.len()
    }
}

type SharedWriter = Arc<AsyncMutex<Box<dyn PeerWriter>>>;

struct PeerGatewayCore {
    links: DashMap<String, SharedWriter>,
    directory: PeerDirectory,
}

impl PeerGatewayCore {
    fn new(directory: PeerDirectory) -> Self {
        Self {
            links: DashMap::new(),
            directory,
        }
    }

    async fn connect_outbound(&self, router: Router, gateway_name: String, url: String) {
        let directory = self.directory.clone();

        match tokio_tungstenite::connect_async(&url).await {
            Ok((stream, _response)) => {
                let (sink, stream) = stream.split();
                let writer: SharedWriter = Arc::new(AsyncMutex::new(Box::new(OutboundWriter(sink))));
                self.links.insert(url.clone(), writer);
                directory.add(&url);

                tokio::spawn(read_loop_outbound(stream, url, router, gateway_name));
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to connect to peer");
            }
        }
    }

    async fn broadcast(&self, inner_frame: Value) {
        let encoded = match serde_json::to_string(&inner_frame) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "forward_message payload was not valid JSON; dropping broadcast");
                return;
            }
        };

        let snapshot: Vec<(String, SharedWriter)> = self.links.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
        for (remote, writer) in snapshot {
            let mut guard = writer.lock().await;
            if let Err(e) = guard.write_text(encoded.clone()).await {
                tracing::warn!(remote = %remote, error = %e, "forward to peer failed; link left for the read-loop to clean up");
            }
        }
    }

    fn register_inbound(&self, remote_id: String, socket: WebSocket, router: Router, gateway_name: String) {
        let (sink, stream) = socket.split();
        let writer: SharedWriter = Arc::new(AsyncMutex::new(Box::new(InboundWriter(sink))));
        self.links.insert(remote_id.clone(), writer);
        self.directory.add(&remote_id);

        tokio::spawn(read_loop_inbound(stream, remote_id, router, gateway_name));
    }

    fn drop_link(&self, remote: &str) {
        self.links.remove(remote);
        self.directory.remove(remote);
    }
}

/// Held by the HTTP gateway so its `/ws` upgrade handler can register a
/// freshly accepted socket without going through the actor mailbox.
#[derive(Clone)]
pub struct PeerGatewayHandle(Arc<PeerGatewayCore>);

impl PeerGatewayHandle {
    pub fn register_inbound(&self, remote_id: String, socket: WebSocket, router: Router, gateway_name: String) {
        self.0.register_inbound(remote_id, socket, router, gateway_name);
    }
}

/// The peer gateway's message-driven behavior: dials outbound links and
/// broadcasts forwarded frames. Construct via [`PeerGatewayActor::new`],
/// which also returns the [`PeerGatewayHandle`] sharing the same link
/// table for inbound registration.
pub struct PeerGatewayActor(Arc<PeerGatewayCore>);

impl PeerGatewayActor {
    pub fn new(directory: PeerDirectory) -> (Self, PeerGatewayHandle) {
        let core = Arc::new(PeerGatewayCore::new(directory));
        (Self(core.clone()), PeerGatewayHandle(core))
    }
}

async fn read_loop_outbound(
    mut stream: futures::stream::SplitStream<tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>>,
    remote: String,
    router: Router,
    gateway_name: String,
) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(TungsteniteMessage::Text(text)) => handle_inbound_frame(&text, &router, &gateway_name),
            Ok(TungsteniteMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(remote = %remote, error = %e, "peer link read error");
                break;
            }
        }
    }
    drop_link_via_router(&router, &gateway_name, &remote);
}

async fn read_loop_inbound(mut stream: futures::stream::SplitStream<WebSocket>, remote: String, router: Router, gateway_name: String) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(AxumWsMessage::Text(text)) => handle_inbound_frame(&text, &router, &gateway_name),
            Ok(AxumWsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(remote = %remote, error = %e, "peer link read error");
                break;
            }
        }
    }
    drop_link_via_router(&router, &gateway_name, &remote);
}

/// The read-loops only have a [`Router`] handle, not the gateway's own
/// [`PeerGatewayCore`], so link cleanup on disconnect is routed back
/// through the actor mailbox as a message rather than a direct call.
fn drop_link_via_router(router: &Router, gateway_name: &str, remote: &str) {
    tracing::info!(remote = %remote, "peer link closed");
    router.send(Message::new(gateway_name, gateway_name, types::internal::DROP_LINK, Value::from(remote)));
}

fn handle_inbound_frame(text: &str, router: &Router, gateway_name: &str) {
    match PeerFrame::decode(text) {
        Ok(frame) => {
            let msg: Message = frame.into();
            router.send(msg);
        }
        Err(e) => {
            tracing::warn!(gateway = %gateway_name, error = %e, "malformed inbound peer frame; dropping");
        }
    }
}

#[async_trait]
impl ActorBehavior for PeerGatewayActor {
    async fn handle(&mut self, msg: Message, ctx: &ActorContext) -> Result<(), RelayError> {
        match msg.msg_type.as_str() {
            types::CONNECT_TO_PEER => {
                let url = msg.data.as_str().unwrap_or_default().to_string();
                self.0.connect_outbound(ctx.router().clone(), ctx.name().to_string(), url).await;
                Ok(())
            }
            types::FORWARD_MESSAGE => {
                self.0.broadcast(msg.data).await;
                Ok(())
            }
            types::internal::DROP_LINK => {
                let remote = msg.data.as_str().unwrap_or_default();
                self.0.drop_link(remote);
                Ok(())
            }
            other => {
                tracing::warn!(gateway = %ctx.name(), msg_type = %other, "peer gateway received an unrecognized message type");
                Ok(())
            }
        }
    }
}
