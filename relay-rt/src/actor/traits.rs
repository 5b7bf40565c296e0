//! The behavior every actor kind (supervisor, worker, gateway) implements.
//!
//! A single concrete [`crate::message::Message`] replaces the teacher
//! lineage's `Actor<Message: Message, Error>` associated-type pair: the
//! router must dispatch to supervisor, worker and gateway actors
//! uniformly, so actor behaviors are stored as `Box<dyn ActorBehavior>`
//! rather than monomorphized per message type.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use async_trait::async_trait;

// Layer 3: Internal
use super::context::ActorContext;
use crate::message::Message;

/// Implemented by every actor kind. `handle` is the only required method;
/// `pre_start`/`post_stop` default to no-ops.
///
/// There is no `on_error`/`ErrorAction` supervision hook here: this
/// runtime has no restart policy (see the supervisor's design notes), so
/// a handler error is simply logged by the drainer and the actor keeps
/// running — there is no decision to make.
#[async_trait]
pub trait ActorBehavior: Send + 'static {
    /// Process one inbound message. Errors are logged by the drainer and
    /// do not stop the actor.
    async fn handle(&mut self, msg: Message, ctx: &ActorContext) -> Result<(), crate::error::RelayError>;

    /// Called once before the actor's mailbox starts draining.
    async fn pre_start(&mut self, _ctx: &ActorContext) -> Result<(), crate::error::RelayError> {
        Ok(())
    }

    /// Called once after the mailbox has been drained and closed.
    async fn post_stop(&mut self, _ctx: &ActorContext) -> Result<(), crate::error::RelayError> {
        Ok(())
    }
}
