//! Bounded, single-consumer mailbox with a hard-coded drop-on-full policy.
//!
//! The only backpressure strategy this runtime implements is "drop and
//! log" — senders never block the router, and a full mailbox is always an
//! observable-via-logs event rather than a propagated error.

// Layer 1: Standard library
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Layer 2: Third-party
use tokio::sync::mpsc;

// Layer 3: Internal
use crate::message::Message;

/// Default bounded mailbox capacity when a node does not override it.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 10;

/// The consuming half of a mailbox, owned exclusively by the actor that
/// drains it.
pub struct Mailbox {
    rx: mpsc::Receiver<Message>,
    closed: Arc<AtomicBool>,
}

/// The cheaply-cloneable producing half of a mailbox.
#[derive(Clone)]
pub struct MailboxSender {
    tx: mpsc::Sender<Message>,
    closed: Arc<AtomicBool>,
    actor_name: Arc<str>,
}

/// Construct a bounded mailbox pair with the given capacity.
pub fn bounded(actor_name: impl Into<Arc<str>>, capacity: usize) -> (MailboxSender, Mailbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let closed = Arc::new(AtomicBool::new(false));
    (
        MailboxSender {
            tx,
            closed: closed.clone(),
            actor_name: actor_name.into(),
        },
        Mailbox { rx, closed },
    )
}

impl MailboxSender {
    /// Enqueue a message without blocking. If the mailbox is closed or
    /// full, the message is dropped and a warning is logged; the caller
    /// never observes an error.
    pub fn send(&self, msg: Message) {
        if self.closed.load(Ordering::Acquire) {
            tracing::warn!(actor = %self.actor_name, msg_type = %msg.msg_type, "dropped message: mailbox closed");
            return;
        }

        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(m)) => {
                tracing::warn!(actor = %self.actor_name, msg_type = %m.msg_type, "dropped message: mailbox full");
            }
            Err(mpsc::error::TrySendError::Closed(m)) => {
                tracing::warn!(actor = %self.actor_name, msg_type = %m.msg_type, "dropped message: mailbox closed");
            }
        }
    }

    /// Mark the mailbox closed. Already-enqueued messages are still
    /// drained by the owning actor; only new sends are rejected from this
    /// point on.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Mailbox {
    /// Receive the next message, or `None` once the mailbox is closed and
    /// drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}
