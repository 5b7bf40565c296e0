//! The language-runtime ("worker") actor: owns an evaluator, dispatches
//! `eval` and dynamic `receive`-handler messages, and exposes the `send`
//! builtin that issues outbound actor messages (locally or across a peer
//! link).

// Layer 1: Standard library
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// Layer 3: Internal
use crate::actor::{ActorBehavior, ActorContext};
use crate::error::{RelayError, WorkerError};
use crate::message::{types, Message};
use crate::worker::evaluator::{ArithmeticEvaluator, Evaluator};

/// Default bound on how long the `send` builtin waits for a reply before
/// raising a timeout error to the caller.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialization data for a named, user-defined `server` block, captured
/// at spawn time by the supervisor and handed to the worker that will
/// host it.
///
/// `receives` names the `receive` handlers the block declares; the real
/// evaluator resolves these to callables. The arithmetic stand-in never
/// populates any, since it has no `server` syntax of its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInitData {
    pub name: String,
    #[serde(default)]
    pub receives: Vec<String>,
}

/// The worker actor's behavior.
pub struct WorkerActor {
    supervisor_name: String,
    ws_gateway: Option<String>,
    #[allow(dead_code)]
    init: Option<ServerInitData>,
    evaluator: Box<dyn Evaluator>,
    send_timeout: Duration,
}

impl WorkerActor {
    pub fn new(supervisor_name: String, ws_gateway: Option<String>, init: Option<ServerInitData>) -> Self {
        Self::with_evaluator(supervisor_name, ws_gateway, init, Box::new(ArithmeticEvaluator::new()))
    }

    pub fn with_evaluator(supervisor_name: String, ws_gateway: Option<String>, init: Option<ServerInitData>, evaluator: Box<dyn Evaluator>) -> Self {
        Self {
            supervisor_name,
            ws_gateway,
            init,
            evaluator,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    fn request_child_spawn(&self, ctx: &ActorContext, init: ServerInitData) {
        let msg = Message::new(
            self.supervisor_name.clone(),
            ctx.name().to_string(),
            Message::create_child_type(crate::supervisor::KIND_SERVER_ACTOR),
            serde_json::to_value(init).unwrap_or(Value::Null),
        );
        ctx.router().send(msg);
    }

    async fn handle_eval(&mut self, ctx: &ActorContext, source: &str, reply: Option<crate::message::ReplyChannel>) {
        match self.evaluator.evaluate(source) {
            Ok(value) => {
                for pending in self.evaluator.take_pending_spawns() {
                    self.request_child_spawn(ctx, pending);
                }
                if let Some(reply) = reply {
                    Message::reply_with(reply, tagged_ok(types::EVAL_RESULT, value));
                }
            }
            Err(e) => {
                tracing::warn!(actor = %ctx.name(), error = %e, "eval failed");
                if let Some(reply) = reply {
                    Message::reply_with(reply, tagged_err(types::EVAL_ERROR, e.to_string()));
                }
            }
        }
    }

    async fn handle_receive(&mut self, ctx: &ActorContext, handler_name: &str, data: Value, reply: Option<crate::message::ReplyChannel>) {
        if !self.evaluator.has_handler(handler_name) {
            tracing::warn!(actor = %ctx.name(), handler = %handler_name, "no such receive handler; dropping");
            return;
        }

        let args: HashMap<String, Value> = data.as_object().cloned().map(|m| m.into_iter().collect()).unwrap_or_default();

        match self.evaluator.call_handler(handler_name, args) {
            Ok(value) => {
                if let Some(reply) = reply {
                    Message::reply_with(reply, tagged_ok(types::RECEIVE_RESULT, value));
                }
            }
            Err(e) => {
                if let Some(reply) = reply {
                    Message::reply_with(reply, tagged_err(types::RECEIVE_ERROR, e.to_string()));
                }
            }
        }
    }

    /// The `send(destination, payload)` builtin: split `destination` on
    /// its last `.` into actor name and method, route locally if known,
    /// else forward to the configured peer gateway, and block (within
    /// this handler invocation only — see the actor spawn loop's
    /// subordinate-task design) until a reply arrives or `timeout`
    /// elapses.
    pub async fn send_builtin(ctx: &ActorContext, ws_gateway: Option<&str>, destination: &str, payload: Value, timeout: Duration) -> Result<Value, WorkerError> {
        let (actor_name, method) = split_destination(destination)?;

        let (msg, rx) = Message::new(actor_name.clone(), ctx.name().to_string(), method, payload).with_reply();

        if ctx.router().has_actor(&actor_name) {
            ctx.router().send(msg);
        } else if let Some(gateway) = ws_gateway {
            let wrapped = msg
                .into_forward_envelope(gateway, ctx.name())
                .map_err(|e| WorkerError::NonSerializableMessage(actor_name.clone(), e.to_string()))?;
            ctx.router().send(wrapped);
        } else {
            return Err(WorkerError::UnreachableDestination(destination.to_string()));
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => interpret_reply(reply),
            Ok(Err(_)) => Err(WorkerError::UnreachableDestination(destination.to_string())),
            Err(_) => Err(WorkerError::ReplyTimeout(timeout)),
        }
    }
}

fn split_destination(destination: &str) -> Result<(String, String), WorkerError> {
    match destination.rsplit_once('.') {
        Some((actor, method)) if !actor.is_empty() && !method.is_empty() => Ok((actor.to_string(), method.to_string())),
        _ => Err(WorkerError::Eval(format!("'{destination}' is not of the form 'actor.method'"))),
    }
}

fn tagged_ok(tag: &str, value: Value) -> Value {
    json!({ "type": tag, "value": value })
}

fn tagged_err(tag: &str, error: String) -> Value {
    json!({ "type": tag, "error": error })
}

fn interpret_reply(reply: Value) -> Result<Value, WorkerError> {
    if let Some(err) = reply.get("error").and_then(Value::as_str) {
        return Err(WorkerError::Eval(err.to_string()));
    }
    Ok(reply.get("value").cloned().unwrap_or(Value::Null))
}

#[async_trait]
impl ActorBehavior for WorkerActor {
    /// Installs the `send` builtin as a global the evaluator can call by
    /// name from a `receive` handler body, bridging `call_handler`'s
    /// synchronous interface to `send_builtin`'s async reply wait via
    /// `block_in_place` — see [`crate::worker::evaluator::GlobalFn`].
    async fn pre_start(&mut self, ctx: &ActorContext) -> Result<(), RelayError> {
        let ctx = ctx.clone();
        let ws_gateway = self.ws_gateway.clone();
        let timeout = self.send_timeout;

        self.evaluator.set_global(
            "send",
            Arc::new(move |args: Vec<Value>| {
                let destination = args.first().and_then(Value::as_str).unwrap_or_default().to_string();
                let payload = args.get(1).cloned().unwrap_or(Value::Null);
                tokio::task::block_in_place(|| {
                    tokio::runtime::Handle::current().block_on(WorkerActor::send_builtin(&ctx, ws_gateway.as_deref(), &destination, payload, timeout))
                })
            }),
        );

        Ok(())
    }

    async fn handle(&mut self, msg: Message, ctx: &ActorContext) -> Result<(), RelayError> {
        match msg.msg_type.as_str() {
            types::EVAL => {
                let source = msg.data.as_str().unwrap_or_default().to_string();
                self.handle_eval(ctx, &source, msg.reply_channel).await;
                Ok(())
            }
            types::STOP => {
                if let Some(handle) = ctx.router().get(ctx.name()) {
                    handle.request_stop();
                }
                Ok(())
            }
            other => {
                self.handle_receive(ctx, other, msg.data, msg.reply_channel).await;
                Ok(())
            }
        }
    }
}
