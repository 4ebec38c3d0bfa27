//! Change notification for merged records.
//!
//! Every merge that changes at least one record appends an event to a
//! bounded in-memory log. Observers drain the log to react to cache writes
//! (refresh watched queries, invalidate derived state); the engine itself
//! never consumes it.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{counter, gauge};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::key::IdentityKey;
use crate::lock::mutex_lock;

const SOURCE: &str = "changes";

pub(crate) const METRIC_CHANGE_DROPPED_TOTAL: &str = "trama_change_dropped_total";
pub(crate) const METRIC_CHANGE_LOG_LEN: &str = "trama_change_log_len";

/// Monotonic epoch for ordering change events within this process.
pub type Epoch = u64;

/// One merge's worth of changed keys.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Unique identifier for idempotent consumers.
    pub id: Uuid,
    /// Monotonic ordering within this process.
    pub epoch: Epoch,
    /// Keys whose record value actually changed.
    pub keys: Vec<IdentityKey>,
    /// When the merge committed.
    pub timestamp: OffsetDateTime,
}

/// Bounded FIFO log of change events.
///
/// A mutex-guarded queue is enough here: publishes happen once per merge,
/// not once per record.
pub struct ChangeLog {
    queue: Mutex<VecDeque<ChangeEvent>>,
    epoch_counter: AtomicU64,
    limit: usize,
    dropped: AtomicU64,
}

impl ChangeLog {
    pub fn new(limit: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
            limit,
            dropped: AtomicU64::new(0),
        }
    }

    /// Get the next epoch number.
    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Append an event covering `keys`.
    ///
    /// Oldest events are dropped once the log exceeds its limit; drops are
    /// counted rather than silently discarded.
    pub fn publish(&self, keys: Vec<IdentityKey>) {
        if keys.is_empty() {
            return;
        }
        let epoch = self.next_epoch();
        let event = ChangeEvent {
            id: Uuid::new_v4(),
            epoch,
            keys,
            timestamp: OffsetDateTime::now_utc(),
        };

        debug!(
            event_id = %event.id,
            event_epoch = event.epoch,
            changed = event.keys.len(),
            "Change event enqueued"
        );

        let mut queue = mutex_lock(&self.queue, SOURCE, "publish");
        queue.push_back(event);
        while queue.len() > self.limit {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
            counter!(METRIC_CHANGE_DROPPED_TOTAL).increment(1);
        }
        gauge!(METRIC_CHANGE_LOG_LEN).set(queue.len() as f64);
    }

    /// Drain up to `limit` events in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<ChangeEvent> {
        let mut queue = mutex_lock(&self.queue, SOURCE, "drain");
        let count = limit.min(queue.len());
        let events: Vec<ChangeEvent> = queue.drain(..count).collect();
        gauge!(METRIC_CHANGE_LOG_LEN).set(queue.len() as f64);
        events
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.queue, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        mutex_lock(&self.queue, SOURCE, "clear").clear();
    }

    /// Events dropped to overflow since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
