//! Single-producer/single-consumer handoff with a kill switch.
//!
//! Killing the queue never discards what was already enqueued: consumers
//! drain the remaining items first and only then observe end-of-stream.

use crossbeam_channel::{unbounded, Receiver, Sender};

pub struct TransferQueue;

impl TransferQueue {
    #[allow(clippy::new_ret_no_self)]
    pub fn new<T>() -> (QueueProducer<T>, QueueConsumer<T>) {
        let (tx, rx) = unbounded();
        (QueueProducer { tx: Some(tx) }, QueueConsumer { rx })
    }
}

/// Returned by [`QueueProducer::enqueue`] when the queue can no longer
/// deliver anything, either because it was killed or because every
/// consumer is gone. Carries the rejected item back.
#[derive(Debug)]
pub struct Closed<T>(pub T);

pub struct QueueProducer<T> {
    tx: Option<Sender<T>>,
}

impl<T> QueueProducer<T> {
    /// Appends an item. Never blocks.
    pub fn enqueue(&self, item: T) -> Result<(), Closed<T>> {
        match self.tx.as_ref() {
            Some(tx) => tx.send(item).map_err(|err| Closed(err.into_inner())),
            None => Err(Closed(item)),
        }
    }

    /// Marks the end of the stream and wakes any blocked consumer.
    /// Idempotent.
    pub fn kill(&mut self) {
        if self.tx.take().is_some() {
            tracing::trace!("transfer queue killed");
        }
    }
}

impl<T> Drop for QueueProducer<T> {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Consuming end. Clones share the same queue: each item is delivered to
/// exactly one of them.
#[derive(Clone)]
pub struct QueueConsumer<T> {
    rx: Receiver<T>,
}

impl<T> QueueConsumer<T> {
    /// Blocks until an item is available. Returns `None` once the queue
    /// was killed and drained, and on every call after that.
    pub fn dequeue(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Drops every pending item without blocking and returns how many
    /// there were.
    pub fn discard(&self) -> usize {
        self.rx.try_iter().count()
    }
}
