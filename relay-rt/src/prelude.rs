//! Convenience re-exports for building on top of `relay-rt`.
//!
//! ```rust
//! use relay_rt::prelude::*;
//! ```

// Core actor system
pub use crate::actor::{self, ActorBehavior, ActorContext, ActorHandle, ActorLifecycle, ActorState};

// Messaging
pub use crate::message::{types, Message, PeerFrame};

// Routing
pub use crate::router::Router;

// Built-in actors
pub use crate::supervisor::{SupervisorActor, KIND_SERVER_ACTOR};
pub use crate::worker::{ArithmeticEvaluator, Evaluator, GlobalFn, ServerInitData, WorkerActor};

// Gateways
pub use crate::gateway::{build_router, GatewayState, PeerDirectory, PeerGatewayActor, PeerGatewayHandle};
pub use crate::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

// Configuration
pub use crate::config::NodeConfig;

// Errors
pub use crate::error::{GatewayError, MailboxError, PeerError, RelayError, RouterError, SupervisorError, WorkerError};

// Utilities
pub use crate::util::{ActorId, MessageId};
