//! Multi-producer, single-consumer result queue.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

/// Clonable handle that workers use to push into a [`ConcurrentQueue`].
pub struct QueueProducer<T> {
    sender: Sender<T>,
}

impl<T> QueueProducer<T> {
    /// Push an item. Returns `false` if the consumer is gone.
    pub fn push(&self, item: T) -> bool {
        self.sender.send(item).is_ok()
    }
}

impl<T> Clone for QueueProducer<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Unbounded queue carrying finished work back to its owner.
///
/// No ordering is guaranteed between different producers.
pub struct ConcurrentQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T> ConcurrentQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self { sender, receiver }
    }

    pub fn producer(&self) -> QueueProducer<T> {
        QueueProducer {
            sender: self.sender.clone(),
        }
    }

    /// Pop without blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Block until an item arrives.
    pub fn pop(&self) -> T {
        loop {
            if let Ok(item) = self.receiver.recv() {
                return item;
            }
        }
    }

    /// Block for at most `timeout`.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        self.receiver.recv_timeout(timeout).ok()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
