//! The shared record store.
//!
//! A mapping from identity key to flat record, merged field-wise by the
//! network path and read by every fetch strategy. Two backends sit behind
//! one API: a sharded concurrent map for the unbounded default (lookups do
//! not block each other; merges serialize per shard, so per key) and an
//! LRU-indexed map when a record bound is configured (recency promotion
//! happens inside the same critical section as the read). Readers always
//! clone records out: a read racing a merge on the same key observes the
//! record wholly before or wholly after the merge, never a mix.

use std::collections::HashSet;
use std::sync::RwLock;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lru::LruCache;
use metrics::counter;
use tracing::{debug, trace};

use crate::changes::ChangeLog;
use crate::config::CacheConfig;
use crate::denormalize::RecordSource;
use crate::eviction::EvictionPolicy;
use crate::key::IdentityKey;
use crate::lock::{rw_read, rw_write};
use crate::normalize::NormalizedDocument;
use crate::record::Record;

const SOURCE: &str = "store";

pub(crate) const METRIC_STORE_HIT_TOTAL: &str = "trama_store_hit_total";
pub(crate) const METRIC_STORE_MISS_TOTAL: &str = "trama_store_miss_total";
pub(crate) const METRIC_STORE_EVICT_TOTAL: &str = "trama_store_evict_total";

enum Backend {
    Unbounded(DashMap<IdentityKey, Record>),
    Lru(RwLock<LruCache<IdentityKey, Record>>),
}

/// Identity key → record, with merge-write, eviction, and change reporting.
pub struct RecordStore {
    backend: Backend,
    policy: EvictionPolicy,
    changes: ChangeLog,
}

impl RecordStore {
    /// Store with the given eviction policy and change-log bound.
    pub fn new(policy: EvictionPolicy, change_log_limit: usize) -> Self {
        let backend = match policy.capacity() {
            None => Backend::Unbounded(DashMap::new()),
            Some(capacity) => Backend::Lru(RwLock::new(LruCache::new(capacity))),
        };
        Self {
            backend,
            policy,
            changes: ChangeLog::new(change_log_limit),
        }
    }

    /// Store configured from a [`CacheConfig`].
    pub fn with_config(config: &CacheConfig) -> Self {
        Self::new(config.eviction_policy(), config.change_log_limit)
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Change-notification hook: merges append the keys they changed here.
    pub fn changes(&self) -> &ChangeLog {
        &self.changes
    }

    /// Current record under `key`, cloned out.
    ///
    /// On the bounded backend the lookup also promotes the key's recency,
    /// inside the same critical section, so concurrent reads never lose
    /// bookkeeping updates.
    pub fn get(&self, key: &IdentityKey) -> Option<Record> {
        let record = match &self.backend {
            Backend::Unbounded(map) => map.get(key).map(|entry| entry.value().clone()),
            Backend::Lru(cache) => rw_write(cache, SOURCE, "get").get(key).cloned(),
        };
        match &record {
            Some(_) => counter!(METRIC_STORE_HIT_TOTAL).increment(1),
            None => counter!(METRIC_STORE_MISS_TOTAL).increment(1),
        }
        trace!(%key, hit = record.is_some(), "Record lookup");
        record
    }

    /// Whether `key` currently has a record, without touching recency.
    pub fn contains(&self, key: &IdentityKey) -> bool {
        match &self.backend {
            Backend::Unbounded(map) => map.contains_key(key),
            Backend::Lru(cache) => rw_read(cache, SOURCE, "contains").contains(key),
        }
    }

    /// Merge a normalized document into the store, field by field.
    ///
    /// A field present in an incoming record overwrites; a field the
    /// triggering query did not request is left untouched, so later partial
    /// queries never erase earlier ones. Returns the keys whose record
    /// actually changed value; the same keys are appended to the change
    /// log. On the bounded backend, inserts that cross the record limit
    /// evict the least-recently-touched keys within the same critical
    /// section as the merge.
    pub fn merge(&self, document: &NormalizedDocument) -> HashSet<IdentityKey> {
        let mut changed = HashSet::new();
        match &self.backend {
            Backend::Unbounded(map) => {
                for (key, incoming) in document.records() {
                    let record_changed = match map.entry(key.clone()) {
                        Entry::Occupied(mut occupied) => occupied.get_mut().merge_from(incoming),
                        Entry::Vacant(vacant) => {
                            vacant.insert(incoming.clone());
                            true
                        }
                    };
                    if record_changed {
                        changed.insert(key.clone());
                    }
                }
            }
            Backend::Lru(cache) => {
                let mut cache = rw_write(cache, SOURCE, "merge");
                for (key, incoming) in document.records() {
                    // Pop-then-push: the merged key becomes most-recent.
                    let record_changed = match cache.pop(key) {
                        Some(mut existing) => {
                            let record_changed = existing.merge_from(incoming);
                            cache.push(key.clone(), existing);
                            record_changed
                        }
                        None => {
                            if let Some((evicted, _)) = cache.push(key.clone(), incoming.clone()) {
                                debug!(key = %evicted, "Evicted least-recently-touched record");
                                counter!(METRIC_STORE_EVICT_TOTAL).increment(1);
                            }
                            true
                        }
                    };
                    if record_changed {
                        changed.insert(key.clone());
                    }
                }
            }
        }

        if !changed.is_empty() {
            debug!(changed = changed.len(), "Merge committed");
            self.changes.publish(changed.iter().cloned().collect());
        }
        changed
    }

    /// Drop the record under `key`. Returns whether one was present.
    ///
    /// Management surface for explicit invalidation; the fetch state machine
    /// never calls this.
    pub fn invalidate(&self, key: &IdentityKey) -> bool {
        let removed = match &self.backend {
            Backend::Unbounded(map) => map.remove(key).is_some(),
            Backend::Lru(cache) => rw_write(cache, SOURCE, "invalidate").pop(key).is_some(),
        };
        if removed {
            debug!(%key, "Record invalidated");
        }
        removed
    }

    /// Drop every record.
    pub fn clear(&self) {
        match &self.backend {
            Backend::Unbounded(map) => map.clear(),
            Backend::Lru(cache) => rw_write(cache, SOURCE, "clear").clear(),
        }
        debug!("Record store cleared");
    }

    pub fn len(&self) -> usize {
        match &self.backend {
            Backend::Unbounded(map) => map.len(),
            Backend::Lru(cache) => rw_read(cache, SOURCE, "len").len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSource for RecordStore {
    fn record(&self, key: &IdentityKey) -> Option<Record> {
        self.get(key)
    }
}
