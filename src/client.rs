//! Query client: per-request fetch orchestration over one shared store.
//!
//! The client owns the record store, the key resolver, and the transport
//! seam, and runs the per-policy state machine for every fetch request:
//! cache lookup and/or network round, normalize, merge, denormalize,
//! deliver exactly once.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use bytes::Bytes;
use dashmap::DashMap;
use metrics::{counter, histogram};
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::denormalize::denormalize;
use crate::error::{CacheMiss, FetchError, TransportError};
use crate::fetch::{FetchHandle, FetchOutcome, FetchPolicy};
use crate::key::IdentityKey;
use crate::lock::mutex_lock;
use crate::normalize::normalize;
use crate::query::Query;
use crate::resolver::KeyResolver;
use crate::response::ResponseObject;
use crate::store::RecordStore;
use crate::transport::Transport;

const SOURCE: &str = "client";

pub(crate) const METRIC_FETCH_TOTAL: &str = "trama_fetch_total";
pub(crate) const METRIC_FETCH_MS: &str = "trama_fetch_ms";

/// Entry point for callers: one shared cache, many concurrent queries.
///
/// Cloning is cheap; clones share the store, the root index, and the
/// transport. The client carries no ambient global state: construct it,
/// pass it around, clear or drop it when done.
#[derive(Clone)]
pub struct QueryClient {
    config: CacheConfig,
    resolver: KeyResolver,
    store: Arc<RecordStore>,
    transport: Arc<dyn Transport>,
    /// Operation name → root key of the last merged result. A cache read
    /// cannot run the resolver (it has no response values yet), so this
    /// index remembers where each operation's tree is rooted.
    roots: Arc<DashMap<String, IdentityKey>>,
}

impl QueryClient {
    pub fn new(config: CacheConfig, resolver: KeyResolver, transport: Arc<dyn Transport>) -> Self {
        let store = Arc::new(RecordStore::with_config(&config));
        Self {
            config,
            resolver,
            store,
            transport,
            roots: Arc::new(DashMap::new()),
        }
    }

    /// The shared record store, for direct inspection.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    /// Root key a cache read of `query` starts from: the key recorded by
    /// the last merge of this operation, or the operation's synthesized
    /// root if it has never been fetched.
    pub fn root_key(&self, query: &Query) -> IdentityKey {
        match self.roots.get(query.operation_name()) {
            Some(entry) => entry.value().clone(),
            None => IdentityKey::new(query.root_path()),
        }
    }

    /// Drop one record. Management surface; fetch strategies never call
    /// this.
    pub fn invalidate(&self, key: &IdentityKey) -> bool {
        self.store.invalidate(key)
    }

    /// Drop every record and forget all operation roots.
    pub fn clear(&self) {
        self.store.clear();
        self.roots.clear();
    }

    /// Serve `query` from the store alone: a full hit or a structured miss.
    pub fn cache_only_read(&self, query: &Query) -> Result<ResponseObject, CacheMiss> {
        denormalize(self.store.as_ref(), &self.root_key(query), query.selection())
    }

    /// Run `query` under `policy` to its single terminal outcome.
    pub async fn fetch(&self, query: Query, policy: FetchPolicy) -> FetchOutcome {
        let started_at = Instant::now();
        let outcome = self.dispatch(&query, policy).await;

        histogram!(METRIC_FETCH_MS, "policy" => policy.as_str())
            .record(started_at.elapsed().as_secs_f64() * 1000.0);
        counter!(
            METRIC_FETCH_TOTAL,
            "policy" => policy.as_str(),
            "outcome" => if outcome.is_ok() { "success" } else { "failure" }
        )
        .increment(1);

        outcome
    }

    /// Spawn `query` as a background fetch request.
    ///
    /// The request runs to completion even if the handle is dropped, so a
    /// merge in flight at cancellation time still commits; only delivery is
    /// abandoned. At most one outcome ever reaches the handle.
    pub fn enqueue(&self, query: Query, policy: FetchPolicy) -> FetchHandle {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        debug!(
            request_id = %id,
            policy = %policy,
            operation = query.operation_name(),
            "Fetch request enqueued"
        );

        let client = self.clone();
        tokio::spawn(async move {
            let outcome = client.fetch(query, policy).await;
            if tx.send(outcome).is_err() {
                debug!(request_id = %id, "Fetch outcome dropped: caller cancelled before delivery");
            }
        });

        FetchHandle::new(id, rx)
    }

    async fn dispatch(&self, query: &Query, policy: FetchPolicy) -> FetchOutcome {
        match policy {
            FetchPolicy::NetworkOnly => self.network_round(query).await,
            FetchPolicy::CacheOnly => self.cache_only_read(query).map_err(FetchError::from),
            FetchPolicy::CacheFirst => match self.cache_only_read(query) {
                Ok(tree) => Ok(tree),
                Err(miss) => {
                    debug!(
                        %miss,
                        operation = query.operation_name(),
                        "Cache-first fell through to network"
                    );
                    self.network_round(query).await
                }
            },
            FetchPolicy::NetworkFirst => match self.network_round(query).await {
                Ok(tree) => Ok(tree),
                Err(err) => {
                    warn!(
                        %err,
                        operation = query.operation_name(),
                        "Network-first fell back to cache"
                    );
                    self.cache_only_read(query).map_err(FetchError::from)
                }
            },
            FetchPolicy::Race => self.race(query).await,
        }
    }

    /// One full network round: execute, parse, normalize, merge, then
    /// rebuild the delivered tree from the fresh document rather than the
    /// shared store, which other requests may be merging into concurrently.
    async fn network_round(&self, query: &Query) -> FetchOutcome {
        let body = self.execute_transport(query).await?;
        let tree = ResponseObject::from_json_bytes(&body)?;

        let document = normalize(&tree, &self.resolver, &query.root_path());
        let root_key = document.root_key().clone();
        let changed = self.store.merge(&document);
        self.roots
            .insert(query.operation_name().to_string(), root_key.clone());
        debug!(
            operation = query.operation_name(),
            root = %root_key,
            records = document.len(),
            changed = changed.len(),
            "Network result merged"
        );

        denormalize(&document, &root_key, query.selection()).map_err(FetchError::from)
    }

    async fn execute_transport(&self, query: &Query) -> Result<Bytes, FetchError> {
        match self.config.network_timeout() {
            None => self.transport.execute(query).await.map_err(FetchError::from),
            Some(limit) => match tokio::time::timeout(limit, self.transport.execute(query)).await {
                Ok(result) => result.map_err(FetchError::from),
                Err(_) => Err(FetchError::Transport(TransportError::timeout(
                    limit.as_millis() as u64,
                ))),
            },
        }
    }

    /// Cache and network legs race through a single completion gate,
    /// first-writer-wins.
    ///
    /// The cache leg only claims the gate on a full hit; a miss declines
    /// and leaves the gate to the network leg. The network leg merges its
    /// result before touching the gate, so a losing network response still
    /// refreshes the store (field-wise, most recent merge wins) without
    /// ever being delivered. At most one outcome reaches the caller.
    async fn race(&self, query: &Query) -> FetchOutcome {
        let (tx, rx) = oneshot::channel::<FetchOutcome>();
        let gate = Arc::new(Mutex::new(Some(tx)));

        let cache_gate = Arc::clone(&gate);
        let cache_client = self.clone();
        let cache_query = query.clone();
        tokio::spawn(async move {
            match cache_client.cache_only_read(&cache_query) {
                Ok(tree) => deliver(&cache_gate, Ok(tree), "cache"),
                Err(miss) => debug!(
                    %miss,
                    operation = cache_query.operation_name(),
                    "Race: cache leg missed; leaving the gate to the network"
                ),
            }
        });

        let network_gate = Arc::clone(&gate);
        let network_client = self.clone();
        let network_query = query.clone();
        tokio::spawn(async move {
            let outcome = network_client.network_round(&network_query).await;
            deliver(&network_gate, outcome, "network");
        });

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Cancelled),
        }
    }
}

/// First writer through the gate delivers; later results are dropped after
/// their side effects (the network leg's merge) have already committed.
fn deliver(
    gate: &Mutex<Option<oneshot::Sender<FetchOutcome>>>,
    outcome: FetchOutcome,
    leg: &'static str,
) {
    let sender = mutex_lock(gate, SOURCE, "race.deliver").take();
    match sender {
        Some(tx) => {
            if tx.send(outcome).is_err() {
                debug!(leg, "Race outcome dropped: caller cancelled before delivery");
            }
        }
        None => debug!(leg, "Race leg finished after delivery; result not re-delivered"),
    }
}
