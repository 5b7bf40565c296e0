//! The process-wide (but handle-passed, never a true global singleton)
//! registry mapping actor name to actor handle.

// Layer 1: Standard library
use std::sync::Arc;

// Layer 2: Third-party
use dashmap::DashMap;

// Layer 3: Internal
use crate::actor::ActorHandle;
use crate::error::RouterError;
use crate::message::Message;

/// Maps actor names to their handles. Cheaply `Clone`-able: every clone
/// shares the same underlying table via `Arc`.
///
/// # Examples
///
/// ```rust
/// use relay_rt::Router;
///
/// let router = Router::new();
/// assert!(!router.has_actor("missing"));
/// ```
#[derive(Clone)]
pub struct Router {
    table: Arc<DashMap<String, ActorHandle>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            table: Arc::new(DashMap::new()),
        }
    }

    /// Register a newly spawned actor. Rejects a name that is already
    /// registered to a live actor rather than silently overwriting it —
    /// per the router's monotonic-identity invariant, a name is never
    /// remapped until explicitly unregistered.
    pub fn register(&self, name: impl Into<String>, handle: ActorHandle) {
        let name = name.into();
        if self.table.contains_key(&name) {
            tracing::warn!(actor = %name, "register called for an already-registered name; ignoring");
            return;
        }
        self.table.insert(name, handle);
    }

    /// Try to register, surfacing the duplicate as an error instead of a
    /// logged no-op. Used by callers (the supervisor) that need to report
    /// the conflict to their own caller.
    pub fn try_register(&self, name: impl Into<String>, handle: ActorHandle) -> Result<(), RouterError> {
        let name = name.into();
        if self.table.contains_key(&name) {
            return Err(RouterError::DuplicateRegistration(name));
        }
        self.table.insert(name, handle);
        Ok(())
    }

    pub fn unregister(&self, name: &str) {
        self.table.remove(name);
    }

    /// Look up `msg.to` and enqueue on that actor's mailbox. If the name
    /// is not registered locally, the message is logged and dropped — the
    /// worker's `send` builtin is responsible for deciding whether to
    /// forward to a peer gateway instead of calling this directly in that
    /// case (see [`crate::worker`]).
    pub fn send(&self, msg: Message) {
        match self.table.get(&msg.to) {
            Some(handle) => handle.send(msg),
            None => {
                tracing::warn!(to = %msg.to, msg_type = %msg.msg_type, "dropped message: no such actor");
            }
        }
    }

    pub fn has_actor(&self, name: &str) -> bool {
        self.table.get(name).map(|h| !h.is_stopped()).unwrap_or(false)
    }

    pub fn get(&self, name: &str) -> Option<ActorHandle> {
        self.table.get(name).map(|entry| entry.value().clone())
    }

    pub fn actor_count(&self) -> usize {
        self.table.len()
    }

    pub fn actor_names(&self) -> Vec<String> {
        self.table.iter().map(|e| e.key().clone()).collect()
    }

    /// Snapshot every registered actor, stop them all concurrently, and
    /// wait for each to finish.
    pub async fn stop_all(&self) {
        let handles: Vec<ActorHandle> = self.table.iter().map(|e| e.value().clone()).collect();
        let stops = handles.iter().map(|h| h.stop());
        futures::future::join_all(stops).await;
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{spawn, ActorBehavior, ActorContext};
    use async_trait::async_trait;
    use serde_json::json;

    struct NoOp;

    #[async_trait]
    impl ActorBehavior for NoOp {
        async fn handle(&mut self, _msg: Message, _ctx: &ActorContext) -> Result<(), crate::error::RelayError> {
            Ok(())
        }
    }

    #[test]
    fn new_router_has_no_actors() {
        let router = Router::new();
        assert_eq!(router.actor_count(), 0);
        assert!(!router.has_actor("anything"));
    }

    #[tokio::test]
    async fn register_then_has_actor_is_true() {
        let router = Router::new();
        let handle = spawn("a", router.clone(), Box::new(NoOp));
        assert!(router.has_actor("a"));
        handle.stop().await;
    }

    #[tokio::test]
    async fn try_register_duplicate_name_errors() {
        let router = Router::new();
        let _handle = spawn("dup", router.clone(), Box::new(NoOp));

        let (tx, _rx) = crate::actor::mailbox::bounded("dup", 10);
        let (_stop_tx, stop_rx) = tokio::sync::watch::channel(false);
        let second = crate::actor::ActorHandle::new("dup".to_string(), tx, stop_rx);

        let result = router.try_register("dup", second);
        assert!(matches!(result, Err(RouterError::DuplicateRegistration(_))));
    }

    #[tokio::test]
    async fn send_to_unknown_actor_does_not_panic() {
        let router = Router::new();
        router.send(Message::new("ghost", "x", "ping", json!(null)));
    }

    #[tokio::test]
    async fn stop_all_removes_every_registration() {
        let router = Router::new();
        spawn("a", router.clone(), Box::new(NoOp));
        spawn("b", router.clone(), Box::new(NoOp));
        assert_eq!(router.actor_count(), 2);

        router.stop_all().await;
        assert_eq!(router.actor_count(), 0);
    }

    #[tokio::test]
    async fn unregister_removes_a_single_actor() {
        let router = Router::new();
        let handle = spawn("solo", router.clone(), Box::new(NoOp));
        router.unregister("solo");
        assert!(!router.has_actor("solo"));
        handle.stop().await;
    }
}
