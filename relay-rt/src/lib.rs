//! # relay-rt — actor runtime and federation fabric for the Relay
//! scripting language
//!
//! A node hosts a tree of actors reachable by name through a process-wide
//! [`Router`]: a [`SupervisorActor`] spawns and tears down the
//! language-runtime ("worker") actors that evaluate source text and host
//! `server` blocks, an HTTP/JSON-RPC gateway exposes `/eval` and named
//! `actor.receive` calls to the outside world, and a WebSocket peer
//! gateway forwards messages addressed to actors living on other nodes.
//!
//! # Quick Start
//!
//! ```rust
//! use relay_rt::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::new();
//!     let supervisor = actor::spawn("supervisor", router.clone(), Box::new(SupervisorActor::new(None, 10)));
//!
//!     let (msg, rx) = Message::new("supervisor", "main", Message::create_child_type(KIND_SERVER_ACTOR), json!(null)).with_reply();
//!     router.send(msg);
//!     let reply = rx.await.expect("supervisor replies");
//!     let worker_name = reply["name"].as_str().expect("name field").to_string();
//!
//!     let (msg, rx) = Message::new(worker_name, "main", "eval", json!("10 + 5")).with_reply();
//!     router.send(msg);
//!     let reply = rx.await.expect("worker replies");
//!     assert_eq!(reply["value"], json!(15));
//!
//!     supervisor.stop().await;
//! }
//! ```
//!
//! # Module Organization
//!
//! ## Core actor system
//! - [`actor`] — the [`actor::ActorBehavior`] trait, spawn loop, mailbox, and handle
//! - [`message`] — the concrete [`message::Message`] envelope and wire frame
//! - [`router`] — the name-to-handle registry every actor is dispatched through
//!
//! ## Built-in actors
//! - [`supervisor`] — spawns and stops worker actors; no restart policy
//! - [`worker`] — the language-runtime actor and its `Evaluator` collaborator interface
//!
//! ## External interfaces
//! - [`gateway`] — the HTTP/JSON-RPC request surface and the WebSocket peer-link surface
//! - [`jsonrpc`] — JSON-RPC 2.0 wire types shared by the HTTP gateway
//!
//! ## Infrastructure
//! - [`config`] — per-node configuration, mirrored by the `relay-node` CLI flags
//! - [`error`] — the crate-wide error taxonomy
//! - [`util`] — identifiers (`ActorId`, `MessageId`) and serde helpers
//!
//! # Design Notes
//!
//! This runtime has no supervision restart policy: a handler error is
//! logged and the actor keeps running, so there is no `ErrorAction`
//! decision to make (contrast a BEAM-style one-for-one/one-for-all
//! strategy). See [`DESIGN.md`](https://github.com/relay-lang/relay) in
//! the repository root for the full set of grounding and design
//! decisions.

pub mod actor;
pub mod config;
pub mod error;
pub mod gateway;
pub mod jsonrpc;
pub mod message;
pub mod prelude;
pub mod router;
pub mod supervisor;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use actor::{ActorBehavior, ActorContext, ActorHandle, ActorLifecycle, ActorState};
pub use config::NodeConfig;
pub use error::{GatewayError, MailboxError, PeerError, RelayError, RouterError, SupervisorError, WorkerError};
pub use message::Message;
pub use router::Router;
pub use supervisor::{SupervisorActor, KIND_SERVER_ACTOR};
pub use util::{ActorId, MessageId};
pub use worker::{Evaluator, ServerInitData, WorkerActor};
