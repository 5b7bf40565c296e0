//! The cheaply-cloneable handle the router and other actors hold to an
//! actor: enough to send it messages and to ask it to stop.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use tokio::sync::watch;

// Layer 3: Internal
use super::mailbox::MailboxSender;
use crate::message::Message;

/// A reference to a running actor.
///
/// Cloning an `ActorHandle` is cheap (an `Arc`-backed sender clone plus a
/// `watch::Receiver` clone); many parts of the system hold one concurrently
/// — the router's registry, a supervisor's child records, a worker's
/// reply-forwarding path.
#[derive(Clone)]
pub struct ActorHandle {
    name: String,
    sender: MailboxSender,
    stopped: watch::Receiver<bool>,
}

impl ActorHandle {
    pub(crate) fn new(name: String, sender: MailboxSender, stopped: watch::Receiver<bool>) -> Self {
        Self { name, sender, stopped }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue a message for this actor. Non-blocking; see
    /// [`MailboxSender::send`] for the drop-on-full/closed policy.
    pub fn send(&self, msg: Message) {
        self.sender.send(msg);
    }

    /// True once this actor has fully stopped (its drainer has exited).
    pub fn is_stopped(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Close the mailbox without waiting for the drainer to exit.
    ///
    /// Used for self-stop (a worker's `stop` message handler closing its
    /// own mailbox): calling the blocking [`Self::stop`] from inside a
    /// handler invocation would wait on itself, since the drainer does
    /// not consider that handler task finished until it returns.
    pub fn request_stop(&self) {
        self.sender.close();
    }

    /// Ask the actor to stop and wait until its drainer has exited.
    /// Idempotent: stopping an already-stopped actor returns immediately.
    pub async fn stop(&self) {
        if self.is_stopped() {
            return;
        }
        self.sender.close();

        let mut stopped = self.stopped.clone();
        if *stopped.borrow() {
            return;
        }
        // The drainer closes the mailbox's sender side is not enough by
        // itself to unblock `recv`; it exits once it observes the closed
        // flag with an empty queue, then flips this watch to true.
        let _ = stopped.wait_for(|v| *v).await;
    }
}

#[cfg(test)]
mod tests {
    use super::super::mailbox::bounded;
    use super::*;

    #[tokio::test]
    async fn stop_on_already_stopped_handle_is_idempotent() {
        let (tx, _rx) = bounded("a", 10);
        let (stop_tx, stop_rx) = watch::channel(true);
        drop(stop_tx);
        let handle = ActorHandle::new("a".to_string(), tx, stop_rx);

        assert!(handle.is_stopped());
        handle.stop().await;
        handle.stop().await;
    }

    #[tokio::test]
    async fn stop_waits_until_watch_flips_true() {
        let (tx, _rx) = bounded("a", 10);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = ActorHandle::new("a".to_string(), tx, stop_rx);

        let handle2 = handle.clone();
        let waiter = tokio::spawn(async move {
            handle2.stop().await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        stop_tx.send(true).expect("watch still has a receiver");
        waiter.await.expect("waiter task completes");
        assert!(handle.is_stopped());
    }
}
