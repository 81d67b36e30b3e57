//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes facts that already committed (activity entries) to any
//! number of listeners: a live activity page, a notifier, a test probe.
//!
//! ## Delivery
//!
//! - **After commit only**: publishers hand messages to the bus once the unit
//!   of work that produced them is durable, so listeners never see rolled-back
//!   facts.
//! - **Best effort**: the store is the source of truth. A listener that falls
//!   behind or disconnects can always re-read the activity log.
//! - **Ordered per publisher**: messages from one publisher arrive in publish
//!   order. Publishers on different threads are not ordered against each
//!   other unless they serialise their publishes themselves.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// A subscription to an event stream.
///
/// Each subscription gets its own copy of every message published after it was
/// created (broadcast semantics).
///
/// ```ignore
/// let feed = library.subscribe_activity();
/// library.borrow(user_id, book_id)?;
/// for entry in feed.drain() {
///     println!("{}", entry.description);
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain everything currently queued without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Transport-agnostic pub/sub contract.
///
/// `publish()` can fail (e.g. a poisoned lock); the caller decides whether that
/// matters. Since messages describe already-committed state, a failed publish
/// never invalidates the write that produced it.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
