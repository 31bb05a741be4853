//! Per-connection outbound queue.
//!
//! Broadcasts enqueue serialized frames without blocking; the connection's
//! writer task drains the queue onto the socket. The queue is bounded and
//! applies an [`OverflowPolicy`] when a slow client falls behind.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::domain::OverflowPolicy;

/// Result of offering a frame to a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Frame accepted.
    Queued,
    /// Frame accepted after evicting the oldest pending frame.
    QueuedDroppedOldest,
    /// Queue was already closed; frame discarded.
    Closed,
    /// Queue was full under `Disconnect`; the queue is now closed.
    Overflowed,
}

impl Delivery {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Delivery::Queued | Delivery::QueuedDroppedOldest)
    }
}

/// Bounded single-consumer frame queue.
#[derive(Debug)]
pub struct OutboundQueue {
    frames: Mutex<VecDeque<Arc<str>>>,
    capacity: usize,
    policy: OverflowPolicy,
    closed: AtomicBool,
    notify: Notify,
    dropped: AtomicU64,
}

impl OutboundQueue {
    /// Create a queue holding at most `capacity` frames (minimum 1).
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
            policy,
            closed: AtomicBool::new(false),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Offer a frame. Never blocks.
    pub fn push(&self, frame: Arc<str>) -> Delivery {
        if self.is_closed() {
            return Delivery::Closed;
        }

        let outcome = {
            let mut frames = self.frames.lock();
            if frames.len() < self.capacity {
                frames.push_back(frame);
                Delivery::Queued
            } else {
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        frames.pop_front();
                        frames.push_back(frame);
                        Delivery::QueuedDroppedOldest
                    }
                    OverflowPolicy::Disconnect => Delivery::Overflowed,
                }
            }
        };

        match outcome {
            Delivery::Overflowed => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.close();
            }
            Delivery::QueuedDroppedOldest => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.notify.notify_one();
            }
            _ => self.notify.notify_one(),
        }

        outcome
    }

    /// Wait for the next frame. Returns `None` once the queue is closed.
    ///
    /// Cancel safe: a frame is only removed when it is returned.
    pub async fn pop(&self) -> Option<Arc<str>> {
        loop {
            if self.is_closed() {
                return None;
            }
            if let Some(frame) = self.frames.lock().pop_front() {
                return Some(frame);
            }
            self.notify.notified().await;
        }
    }

    /// Close the queue and wake the writer. Pending frames are discarded.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.frames.lock().clear();
        }
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Frames lost to overflow so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
