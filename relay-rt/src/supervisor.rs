//! The supervisor actor: owns the right to instantiate and terminate
//! worker actors. Dynamic, message-driven child lifecycle — no restart
//! policy.

// Layer 1: Standard library
use std::collections::HashMap;

// Layer 2: Third-party
use async_trait::async_trait;
use serde_json::{json, Value};

// Layer 3: Internal
use crate::actor::{self, ActorBehavior, ActorContext, ActorHandle};
use crate::error::{RelayError, SupervisorError};
use crate::message::{types, Message};
use crate::router::Router;
use crate::util::generate_child_name;
use crate::worker::{ServerInitData, WorkerActor};

/// Child kinds the supervisor knows how to instantiate.
///
/// `RelayServerActor` covers both the ephemeral per-request workers the
/// HTTP gateway spawns and named user-defined server blocks; the
/// difference is only whether `data` carries a [`ServerInitData`] or is
/// empty.
pub const KIND_SERVER_ACTOR: &str = "RelayServerActor";

struct ChildRecord {
    handle: ActorHandle,
    kind: String,
}

/// The supervisor's behavior. Construct with [`SupervisorActor::new`] and
/// spawn it like any other actor via [`crate::actor::spawn`].
pub struct SupervisorActor {
    children: HashMap<String, ChildRecord>,
    ws_gateway: Option<String>,
    mailbox_capacity: usize,
}

impl SupervisorActor {
    pub fn new(ws_gateway: Option<String>, mailbox_capacity: usize) -> Self {
        Self {
            children: HashMap::new(),
            ws_gateway,
            mailbox_capacity,
        }
    }

    fn spawn_child(&mut self, kind: &str, name: String, router: &Router, supervisor_name: &str, init: Option<ServerInitData>) -> Result<ActorHandle, SupervisorError> {
        match kind {
            KIND_SERVER_ACTOR => {
                let behavior = WorkerActor::new(supervisor_name.to_string(), self.ws_gateway.clone(), init);
                let handle = actor::spawn_with_capacity(name.clone(), router.clone(), Box::new(behavior), self.mailbox_capacity);
                self.children.insert(
                    name,
                    ChildRecord {
                        handle: handle.clone(),
                        kind: kind.to_string(),
                    },
                );
                Ok(handle)
            }
            other => Err(SupervisorError::UnknownKind(other.to_string())),
        }
    }

    async fn handle_create_child(&mut self, kind: &str, data: Value, reply: Option<crate::message::ReplyChannel>, router: &Router, supervisor_name: &str) {
        let init: Option<ServerInitData> = if data.is_null() {
            None
        } else {
            match serde_json::from_value(data) {
                Ok(init) => Some(init),
                Err(e) => {
                    tracing::warn!(kind = %kind, error = %e, "create_child payload did not match ServerInitData; spawning a transient worker instead");
                    None
                }
            }
        };

        let name = init
            .as_ref()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| generate_child_name(kind));

        match self.spawn_child(kind, name.clone(), router, supervisor_name, init) {
            Ok(_handle) => {
                if let Some(reply) = reply {
                    Message::reply_with(reply, json!({ "name": name }));
                }
            }
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "failed to spawn child");
                if let Some(reply) = reply {
                    Message::reply_with(reply, json!({ "error": e.to_string() }));
                }
            }
        }
    }

    async fn handle_stop_child(&mut self, name: &str) {
        match self.children.remove(name) {
            Some(record) => {
                record.handle.stop().await;
            }
            None => {
                tracing::warn!(child = %name, "stop_child for an unmanaged name; ignoring");
            }
        }
    }
}

#[async_trait]
impl ActorBehavior for SupervisorActor {
    async fn handle(&mut self, msg: Message, ctx: &ActorContext) -> Result<(), RelayError> {
        if let Some(kind) = msg.child_kind() {
            self.handle_create_child(kind, msg.data, msg.reply_channel, ctx.router(), ctx.name()).await;
            return Ok(());
        }

        match msg.msg_type.as_str() {
            types::STOP_CHILD => {
                let name = msg.data.as_str().map(str::to_string).unwrap_or_default();
                self.handle_stop_child(&name).await;
                Ok(())
            }
            other => Err(RelayError::Supervisor(SupervisorError::UnknownKind(other.to_string()))),
        }
    }

    async fn post_stop(&mut self, _ctx: &ActorContext) -> Result<(), RelayError> {
        let handles: Vec<ActorHandle> = self.children.values().map(|c| c.handle.clone()).collect();
        futures::future::join_all(handles.iter().map(|h| h.stop())).await;
        self.children.clear();
        Ok(())
    }
}
