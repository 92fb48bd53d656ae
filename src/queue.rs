//! Bounded, thread-safe FIFO queue with blocking producers and consumers.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// A synchronized FIFO conduit between pipeline stages.
///
/// Producers block while the queue is full (backpressure); consumers block
/// while it is empty. Closing wakes everyone: blocked producers get their
/// item back, consumers drain what remains and then observe `None`.
pub struct BoundedQueue<T> {
    inner: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

struct QueueState<T> {
    queue: VecDeque<T>,
    capacity: usize,
    closed: bool,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "queue capacity must be > 0");
        Self {
            inner: Mutex::new(QueueState {
                queue: VecDeque::with_capacity(capacity),
                capacity,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Push an item, blocking while the queue is at capacity.
    ///
    /// Returns the item back if the queue is closed, including when the
    /// close happens while the producer is blocked waiting for room.
    pub fn push_blocking(&self, item: T) -> Result<(), T> {
        let mut guard = self.inner.lock().expect("queue mutex poisoned");
        loop {
            if guard.closed {
                return Err(item);
            }
            if guard.queue.len() < guard.capacity {
                guard.queue.push_back(item);
                self.not_empty.notify_one();
                return Ok(());
            }
            guard = self.not_full.wait(guard).expect("condvar wait failed");
        }
    }

    /// Try to pop immediately without blocking.
    pub fn try_pop(&self) -> Option<T> {
        let mut guard = self.inner.lock().expect("queue mutex poisoned");
        let item = guard.queue.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Block until an item is available or the queue is closed and drained.
    ///
    /// Items pushed before the close are still delivered; `None` means the
    /// queue is closed *and* empty, which is the consumer's only
    /// termination signal.
    pub fn pop_blocking_or_closed(&self) -> Option<T> {
        let mut guard = self.inner.lock().expect("queue mutex poisoned");
        loop {
            if let Some(item) = guard.queue.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if guard.closed {
                return None;
            }
            // Wait releases the lock and re-acquires it before returning.
            guard = self.not_empty.wait(guard).expect("condvar wait failed");
        }
    }

    /// Close the queue and wake all blocked producers and consumers.
    pub fn close(&self) {
        let mut guard = self.inner.lock().expect("queue mutex poisoned");
        guard.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Current number of queued items.
    pub fn len(&self) -> usize {
        let guard = self.inner.lock().expect("queue mutex poisoned");
        guard.queue.len()
    }
}
