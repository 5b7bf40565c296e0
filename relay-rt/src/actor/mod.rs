//! The actor abstraction: a named task draining a bounded mailbox of
//! concrete [`crate::message::Message`] values through an
//! [`ActorBehavior`], one message at a time, with private ownership of
//! whatever state that behavior closes over.
//!
//! # Module layout
//!
//! - `traits.rs` — [`ActorBehavior`], the trait every actor kind implements
//! - `context.rs` — [`ActorContext`], the router handle + identity passed to `handle`
//! - `lifecycle.rs` — [`ActorLifecycle`] / [`ActorState`] bookkeeping
//! - `mailbox.rs` — the bounded, drop-on-full mailbox
//! - `handle.rs` — [`ActorHandle`], the cheap-clone reference other actors and the router hold

pub mod context;
pub mod handle;
pub mod lifecycle;
pub mod mailbox;
pub mod traits;

pub use context::ActorContext;
pub use handle::ActorHandle;
pub use lifecycle::{ActorLifecycle, ActorState};
pub use mailbox::DEFAULT_MAILBOX_CAPACITY;
pub use traits::ActorBehavior;

use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::router::Router;

/// Spawn a new actor: register it with `router`, start its drainer task,
/// and return a handle to it.
///
/// The drainer dispatches each inbound message to its own subordinate
/// task rather than awaiting `behavior.handle` inline, so a panicking
/// handler can't take the drainer down with it. Mutual exclusion over the
/// behavior's internal state is preserved by an async mutex guarding the
/// behavior object itself, and — critically for per-mailbox FIFO — the
/// drainer acquires that mutex itself, in mailbox order, *before* spawning
/// each subordinate task and hands over the already-held guard. A
/// subordinate task never races another for the lock, so handler
/// invocation N is always already underway before N+1's task is even
/// spawned, regardless of how the runtime schedules the two tasks.
pub fn spawn(name: impl Into<String>, router: Router, behavior: Box<dyn ActorBehavior>) -> ActorHandle {
    spawn_with_capacity(name, router, behavior, DEFAULT_MAILBOX_CAPACITY)
}

/// As [`spawn`], with an explicit mailbox capacity.
pub fn spawn_with_capacity(
    name: impl Into<String>,
    router: Router,
    behavior: Box<dyn ActorBehavior>,
    capacity: usize,
) -> ActorHandle {
    let name = name.into();
    let (sender, mut mailbox) = mailbox::bounded(name.clone(), capacity);
    let (stopped_tx, stopped_rx) = watch::channel(false);
    let handle = ActorHandle::new(name.clone(), sender, stopped_rx);

    router.register(name.clone(), handle.clone());

    let ctx = ActorContext::new(name.clone(), router.clone());
    let behavior = std::sync::Arc::new(tokio::sync::Mutex::new(behavior));

    tokio::spawn(async move {
        {
            let mut guard = behavior.lock().await;
            if let Err(e) = guard.pre_start(&ctx).await {
                tracing::error!(actor = %ctx.name(), error = %e, "pre_start failed");
            }
        }

        let mut in_flight: JoinSet<()> = JoinSet::new();

        while let Some(msg) = mailbox.recv().await {
            // Acquired here, in mailbox order, rather than inside the
            // spawned task: that's what fixes the invocation-order hazard.
            // Acquiring it inside the task instead would let two tasks
            // race the mutex in whatever order the scheduler happens to
            // poll them, which can invert enqueue order.
            let mut guard = behavior.clone().lock_owned().await;
            let ctx = ctx.clone();
            let actor_name = ctx.name().to_string();
            in_flight.spawn(async move {
                if let Err(e) = guard.handle(msg, &ctx).await {
                    tracing::error!(actor = %actor_name, error = %e, "handler returned an error");
                }
            });

            // Bound concurrent in-flight handler tasks so a burst of
            // non-blocking messages doesn't spawn unboundedly; completed
            // tasks are reaped opportunistically without blocking intake
            // of the next message.
            while in_flight.len() > capacity {
                if let Some(res) = in_flight.join_next().await {
                    if let Err(join_err) = res {
                        tracing::error!(actor = %name, error = %join_err, "actor handler task panicked");
                    }
                }
            }
        }

        while let Some(res) = in_flight.join_next().await {
            if let Err(join_err) = res {
                tracing::error!(actor = %name, error = %join_err, "actor handler task panicked during drain");
            }
        }

        {
            let mut guard = behavior.lock().await;
            if let Err(e) = guard.post_stop(&ctx).await {
                tracing::error!(actor = %ctx.name(), error = %e, "post_stop failed");
            }
        }

        router.unregister(&name);
        let _ = stopped_tx.send(true);
    });

    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct EchoBehavior {
        seen: Arc<AtomicU32>,
    }

    #[async_trait]
    impl ActorBehavior for EchoBehavior {
        async fn handle(&mut self, _msg: Message, _ctx: &ActorContext) -> Result<(), crate::error::RelayError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn spawn_registers_actor_with_router() {
        let router = Router::new();
        let seen = Arc::new(AtomicU32::new(0));
        let handle = spawn("echo", router.clone(), Box::new(EchoBehavior { seen: seen.clone() }));

        assert!(router.has_actor("echo"));
        handle.stop().await;
        assert!(!router.has_actor("echo"));
    }

    #[tokio::test]
    async fn messages_are_processed_and_actor_stops_cleanly() {
        let router = Router::new();
        let seen = Arc::new(AtomicU32::new(0));
        let handle = spawn("echo", router.clone(), Box::new(EchoBehavior { seen: seen.clone() }));

        handle.send(Message::new("echo", "x", "ping", json!(null)));
        handle.send(Message::new("echo", "x", "ping", json!(null)));

        handle.stop().await;
        assert!(handle.is_stopped());
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    struct PanickingBehavior;

    #[async_trait]
    impl ActorBehavior for PanickingBehavior {
        async fn handle(&mut self, _msg: Message, _ctx: &ActorContext) -> Result<(), crate::error::RelayError> {
            panic!("intentional failure for drainer-resilience test");
        }
    }

    #[tokio::test]
    async fn panicking_handler_does_not_crash_the_drainer() {
        let router = Router::new();
        let handle = spawn("panicky", router.clone(), Box::new(PanickingBehavior));

        handle.send(Message::new("panicky", "x", "boom", json!(null)));
        handle.stop().await;
        assert!(handle.is_stopped());
    }

    struct OrderRecordingBehavior {
        order: Arc<tokio::sync::Mutex<Vec<u32>>>,
    }

    #[async_trait]
    impl ActorBehavior for OrderRecordingBehavior {
        async fn handle(&mut self, msg: Message, _ctx: &ActorContext) -> Result<(), crate::error::RelayError> {
            let n = msg.data.as_u64().unwrap_or_default() as u32;
            // Stagger completion times so a scheduler that starts handlers
            // out of order would also record them out of order.
            if n % 2 == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
            self.order.lock().await.push(n);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn messages_are_handled_in_enqueue_order_even_under_scheduler_races() {
        let router = Router::new();
        let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let handle = spawn("orderer", router.clone(), Box::new(OrderRecordingBehavior { order: order.clone() }));

        for n in 0..10u32 {
            handle.send(Message::new("orderer", "x", "tick", json!(n)));
        }

        handle.stop().await;
        assert_eq!(*order.lock().await, (0..10).collect::<Vec<u32>>());
    }
}
