//! Broadcast signals with explicit subscriptions.
//!
//! A view layer owns a [`Signal`] and emits events into it; consumers hold a
//! [`Subscription`] and stop receiving once it is dropped (or
//! [`Subscription::unsubscribe`]d).

use tokio::sync::broadcast;

/// Buffered events per subscriber before old ones are dropped.
const CHANNEL_CAPACITY: usize = 32;

/// Emitter side of a signal.
#[derive(Debug)]
pub struct Signal<E> {
    tx: broadcast::Sender<E>,
}

impl<E> Clone for Signal<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E: Clone> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> Signal<E> {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Deliver an event to every live subscription. Returns how many
    /// subscriptions received it.
    pub fn emit(&self, event: E) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription<E> {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live registration on a [`Signal`].
#[derive(Debug)]
pub struct Subscription<E> {
    rx: broadcast::Receiver<E>,
}

impl<E: Clone> Subscription<E> {
    /// Next event, or `None` once every emitter is gone. Events missed while
    /// the subscriber lagged are skipped.
    pub async fn next(&mut self) -> Option<E> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::trace!(skipped, "Subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-queued event without waiting.
    pub fn try_next(&mut self) -> Option<E> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::trace!(skipped, "Subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
