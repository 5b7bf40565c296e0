//! The uniform message envelope exchanged between actors, and the
//! reply-channel rendezvous used to correlate a caller with a callee's
//! response.
//!
//! Unlike a generic `Message` trait parameterized over a payload type, every
//! actor in this runtime exchanges the *same* concrete envelope. The router
//! must be able to dispatch heterogeneous actor kinds (supervisor, worker,
//! gateway) purely by the `to` name and the string `type`, and any message
//! that might cross a peer link must already be JSON-encodable — so the
//! payload is carried as a `serde_json::Value` rather than a generic `M`.

// Layer 1: Standard library
use std::fmt;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

// Layer 3: Internal
use crate::util::MessageId;

/// Well-known message type names recognized by the built-in actors.
///
/// User-defined `receive` handlers are addressed by arbitrary type strings
/// that do not appear here; the worker actor falls through to handler
/// lookup for any type it does not recognize (see [`crate::worker`]).
pub mod types {
    pub const EVAL: &str = "eval";
    pub const EVAL_RESULT: &str = "eval_result";
    pub const EVAL_ERROR: &str = "eval_error";
    pub const STOP: &str = "stop";
    pub const CREATE_CHILD: &str = "create_child";
    pub const CHILD_CREATED: &str = "child_created";
    pub const STOP_CHILD: &str = "stop_child";
    pub const RECEIVE_RESULT: &str = "receive_result";
    pub const RECEIVE_ERROR: &str = "receive_error";
    pub const FORWARD_MESSAGE: &str = "forward_message";
    pub const CONNECT_TO_PEER: &str = "connect_to_peer";

    /// Message types an actor only ever sends to itself, never exposed
    /// across the HTTP/JSON-RPC or peer-link surfaces.
    pub mod internal {
        /// Sent by a peer link's read-loop task back to its own gateway
        /// actor to remove a closed link, since the read-loop only holds a
        /// [`crate::router::Router`] handle and not the gateway's private
        /// link table.
        pub const DROP_LINK: &str = "__drop_link";
    }
}

/// A `create_child:<Kind>` message carries this prefix followed by the kind
/// name, e.g. `"create_child:RelayServerActor"`.
pub const CREATE_CHILD_PREFIX: &str = "create_child:";

/// One-shot rendezvous through which a callee delivers exactly one reply to
/// a caller awaiting it.
pub type ReplyChannel = oneshot::Sender<Value>;
pub type ReplyReceiver = oneshot::Receiver<Value>;

/// The message envelope routed between actors.
///
/// `reply_channel` is never serialized: it is meaningless once a message
/// crosses a peer link, since correlation across nodes is handled by the
/// caller blocking locally on its own `send` builtin invocation rather than
/// by forwarding the channel itself.
#[derive(Serialize, Deserialize)]
pub struct Message {
    pub to: String,
    pub from: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub data: Value,

    #[serde(skip)]
    pub reply_channel: Option<ReplyChannel>,

    #[serde(skip, default = "MessageId::new")]
    pub id: MessageId,
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("to", &self.to)
            .field("from", &self.from)
            .field("msg_type", &self.msg_type)
            .field("data", &self.data)
            .field("has_reply_channel", &self.reply_channel.is_some())
            .field("id", &self.id)
            .finish()
    }
}

impl Message {
    /// Construct a message with no reply channel (fire-and-forget).
    pub fn new(to: impl Into<String>, from: impl Into<String>, msg_type: impl Into<String>, data: Value) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            msg_type: msg_type.into(),
            data,
            reply_channel: None,
            id: MessageId::new(),
        }
    }

    /// Attach a reply channel, returning it alongside the envelope so the
    /// caller retains the receiving half.
    pub fn with_reply(mut self) -> (Self, ReplyReceiver) {
        let (tx, rx) = oneshot::channel();
        self.reply_channel = Some(tx);
        (self, rx)
    }

    /// Consume a provided reply channel and send `data` on it. A dropped or
    /// already-timed-out receiver causes this to be silently ignored: per
    /// the reply-channel contract, a late reply to an unread channel is
    /// discarded, not an error.
    pub fn reply_with(channel: ReplyChannel, data: Value) {
        let _ = channel.send(data);
    }

    /// Build the `create_child:<Kind>` type string.
    pub fn create_child_type(kind: &str) -> String {
        format!("{CREATE_CHILD_PREFIX}{kind}")
    }

    /// If this message's type is `create_child:<Kind>`, return `<Kind>`.
    pub fn child_kind(&self) -> Option<&str> {
        self.msg_type.strip_prefix(CREATE_CHILD_PREFIX)
    }

    /// Wrap this message as the payload of a `forward_message` envelope
    /// addressed to a peer gateway.
    ///
    /// Returns an error if this message's own `data` is itself shaped like a
    /// `forward_message` payload, per the invariant that forwarded frames
    /// may not nest (see [`crate::error::PeerError::NestedForward`]).
    pub fn into_forward_envelope(self, gateway_to: impl Into<String>, gateway_from: impl Into<String>) -> Result<Message, crate::error::PeerError> {
        if is_forward_shaped(&self.data) {
            return Err(crate::error::PeerError::NestedForward);
        }
        let inner = PeerFrame::from(&self);
        let data = serde_json::to_value(inner).map_err(|e| crate::error::PeerError::MalformedFrame(e.to_string()))?;
        Ok(Message::new(gateway_to, gateway_from, types::FORWARD_MESSAGE, data))
    }
}

fn is_forward_shaped(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.contains_key("to") && obj.contains_key("from") && obj.contains_key("type") && obj.contains_key("data"))
        .unwrap_or(false)
}

/// The wire shape of a [`Message`] as it crosses a peer link: identical to
/// `Message` minus the (unserializable, meaningless cross-node) reply
/// channel and internal id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerFrame {
    pub to: String,
    pub from: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub data: Value,
}

impl From<&Message> for PeerFrame {
    fn from(m: &Message) -> Self {
        Self {
            to: m.to.clone(),
            from: m.from.clone(),
            msg_type: m.msg_type.clone(),
            data: m.data.clone(),
        }
    }
}

impl From<PeerFrame> for Message {
    fn from(f: PeerFrame) -> Self {
        Message::new(f.to, f.from, f.msg_type, f.data)
    }
}

impl PeerFrame {
    /// Decode a single JSON frame received over a peer link, rejecting
    /// frames whose `data` is itself forward-message-shaped.
    pub fn decode(raw: &str) -> Result<Self, crate::error::PeerError> {
        let frame: PeerFrame = serde_json::from_str(raw).map_err(|e| crate::error::PeerError::MalformedFrame(e.to_string()))?;
        if frame.msg_type != types::FORWARD_MESSAGE && is_forward_shaped(&frame.data) {
            return Err(crate::error::PeerError::NestedForward);
        }
        Ok(frame)
    }

    pub fn encode(&self) -> Result<String, crate::error::PeerError> {
        serde_json::to_string(self).map_err(|e| crate::error::PeerError::MalformedFrame(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_message_has_no_reply_channel() {
        let msg = Message::new("echo", "client", "ping", json!({"msg": "hi"}));
        assert!(msg.reply_channel.is_none());
    }

    #[test]
    fn with_reply_attaches_channel_and_delivers_once() {
        let (msg, rx) = Message::new("echo", "client", "ping", json!(null)).with_reply();
        let channel = msg.reply_channel.expect("reply channel attached");
        Message::reply_with(channel, json!("hi"));
        let received = rx.try_recv().expect("reply delivered");
        assert_eq!(received, json!("hi"));
    }

    #[test]
    fn reply_to_dropped_receiver_does_not_panic() {
        let (msg, rx) = Message::new("echo", "client", "ping", json!(null)).with_reply();
        drop(rx);
        let channel = msg.reply_channel.expect("reply channel attached");
        Message::reply_with(channel, json!("ignored"));
    }

    #[test]
    fn create_child_type_and_child_kind_round_trip() {
        let t = Message::create_child_type("RelayServerActor");
        let msg = Message::new("supervisor", "gateway", t, json!(null));
        assert_eq!(msg.child_kind(), Some("RelayServerActor"));
    }

    #[test]
    fn child_kind_is_none_for_unrelated_type() {
        let msg = Message::new("worker", "caller", "eval", json!("1 + 1"));
        assert_eq!(msg.child_kind(), None);
    }

    #[test]
    fn peer_frame_round_trips_through_json() {
        let msg = Message::new("echo", "b-node", "ping", json!({"msg": "hi"}));
        let frame = PeerFrame::from(&msg);
        let encoded = frame.encode().expect("encodes");
        let decoded = PeerFrame::decode(&encoded).expect("decodes");
        assert_eq!(decoded.to, "echo");
        assert_eq!(decoded.data, json!({"msg": "hi"}));
    }

    #[test]
    fn into_forward_envelope_wraps_inner_message() {
        let inner = Message::new("echo", "b-node", "ping", json!({"msg": "hi"}));
        let wrapped = inner.into_forward_envelope("ws-gateway", "worker-1").expect("wraps");
        assert_eq!(wrapped.msg_type, types::FORWARD_MESSAGE);
        assert_eq!(wrapped.data["to"], json!("echo"));
    }

    #[test]
    fn into_forward_envelope_rejects_nested_forward_shaped_data() {
        let already_forward_shaped = json!({"to": "x", "from": "y", "type": "z", "data": {}});
        let inner = Message::new("ws-gateway", "worker", types::FORWARD_MESSAGE, already_forward_shaped);
        let result = inner.into_forward_envelope("ws-gateway-2", "worker");
        assert!(matches!(result, Err(crate::error::PeerError::NestedForward)));
    }

    #[test]
    fn decode_rejects_nested_forward_frame() {
        let nested = json!({
            "to": "ws-gateway", "from": "worker", "type": "other",
            "data": {"to": "x", "from": "y", "type": "z", "data": {}}
        });
        let raw = nested.to_string();
        let result = PeerFrame::decode(&raw);
        assert!(matches!(result, Err(crate::error::PeerError::NestedForward)));
    }

    #[test]
    fn message_debug_does_not_require_reply_channel_debug() {
        let msg = Message::new("a", "b", "c", json!(null));
        let debug = format!("{msg:?}");
        assert!(debug.contains("has_reply_channel"));
    }
}
