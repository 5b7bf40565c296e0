//! Per-invocation context handed to an actor's behavior: its own identity
//! plus a handle to the router it is registered with.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use chrono::{DateTime, Utc};

// Layer 3: Internal
use crate::router::Router;
use crate::util::ActorId;

/// Metadata and router access available to an actor while it handles a
/// message.
///
/// Unlike a design where the router is a true global singleton, this
/// context carries the router by handle: a fresh [`Router`] can be built
/// per test, and nothing in the actor implementations reaches for a
/// process-wide static.
#[derive(Clone)]
pub struct ActorContext {
    name: String,
    id: ActorId,
    router: Router,
    created_at: DateTime<Utc>,
}

impl ActorContext {
    pub fn new(name: impl Into<String>, router: Router) -> Self {
        Self {
            name: name.into(),
            id: ActorId::new(),
            router,
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_exposes_name_and_router() {
        let router = Router::new();
        let ctx = ActorContext::new("worker-1", router.clone());
        assert_eq!(ctx.name(), "worker-1");
        assert!(!ctx.router().has_actor("anything"));
    }
}
