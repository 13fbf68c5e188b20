//! Fixed-capacity FIFO queue with blocking-with-timeout put/get semantics.
//!
//! [`BoundedQueue`] connects adjacent pipeline stages. Producers block (with a
//! timeout and retry) when the queue is full, consumers block (with a timeout)
//! when it is momentarily empty. "Empty" is distinct from "closed": an empty
//! queue may still receive items, a closed queue never will again. The queue
//! itself never drops an item; only producers and consumers decide to drop
//! payloads.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::{ErrorKind, IngestResult};

/// Error returned by [`BoundedQueue::put_timeout`], handing the item back to the caller.
#[derive(Debug)]
pub enum PutTimeoutError<T> {
    /// The queue stayed at capacity for the whole timeout. Callers retry.
    Full(T),
    /// The queue was closed; no further items will be accepted.
    Closed(T),
}

/// Error returned by [`BoundedQueue::get_timeout`].
#[derive(Debug, PartialEq, Eq)]
pub enum GetTimeoutError {
    /// No item arrived within the timeout. The queue may still receive items.
    Empty,
    /// The queue was closed and fully drained.
    Closed,
}

#[derive(Debug)]
struct QueueInner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Fixed-capacity FIFO channel between two pipeline stages.
///
/// Capacity is fixed at construction to bound peak memory. Safe to share across
/// threads behind an [`std::sync::Arc`]; all operations take `&self`.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    inner: Mutex<QueueInner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Returns the fixed capacity of the queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of items currently queued.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns `true` if no items are currently queued.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Returns `true` once [`Self::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Closes the queue.
    ///
    /// Queued items remain retrievable; once drained, consumers observe
    /// [`GetTimeoutError::Closed`]. Producers are rejected immediately.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;

        // Wake everyone so blocked producers and consumers observe the close.
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Attempts to enqueue an item, blocking up to `timeout` for capacity.
    ///
    /// On timeout the item is handed back via [`PutTimeoutError::Full`] so the
    /// caller can retry without cloning.
    pub fn put_timeout(&self, item: T, timeout: Duration) -> Result<(), PutTimeoutError<T>> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();

        loop {
            if inner.closed {
                return Err(PutTimeoutError::Closed(item));
            }

            if inner.items.len() < self.capacity {
                inner.items.push_back(item);
                self.not_empty.notify_one();

                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(PutTimeoutError::Full(item));
            }

            inner = self.wait(&self.not_full, inner, deadline - now);
        }
    }

    /// Enqueues an item, retrying [`Self::put_timeout`] until it succeeds.
    ///
    /// This is the blocking-put contract used by every producer in the pipeline:
    /// a full queue is backpressure, not an error. Fails only if the queue is
    /// closed, which no stage does while producers are alive.
    pub fn put(&self, item: T, timeout: Duration) -> IngestResult<()> {
        let mut item = item;

        loop {
            match self.put_timeout(item, timeout) {
                Ok(()) => return Ok(()),
                Err(PutTimeoutError::Full(returned)) => {
                    item = returned;
                }
                Err(PutTimeoutError::Closed(_)) => {
                    crate::bail!(
                        ErrorKind::QueueClosed,
                        "Queue closed while a producer was still writing"
                    );
                }
            }
        }
    }

    /// Dequeues the next item in FIFO order, blocking up to `timeout`.
    ///
    /// Returns [`GetTimeoutError::Empty`] when the timeout elapses with the
    /// queue still open, and [`GetTimeoutError::Closed`] only once the queue is
    /// both closed and drained.
    pub fn get_timeout(&self, timeout: Duration) -> Result<T, GetTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();

        loop {
            if let Some(item) = inner.items.pop_front() {
                self.not_full.notify_one();

                return Ok(item);
            }

            if inner.closed {
                return Err(GetTimeoutError::Closed);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(GetTimeoutError::Empty);
            }

            inner = self.wait(&self.not_empty, inner, deadline - now);
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner<T>> {
        // A poisoned lock means a holder panicked mid-operation; the queue state
        // itself is still coherent since every mutation is a single push or pop.
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn wait<'a>(
        &self,
        condvar: &Condvar,
        guard: MutexGuard<'a, QueueInner<T>>,
        timeout: Duration,
    ) -> MutexGuard<'a, QueueInner<T>> {
        let (guard, _timed_out) = condvar
            .wait_timeout(guard, timeout)
            .unwrap_or_else(|err| err.into_inner());

        guard
    }
}
