//! Fetch policies and the caller's handle on an in-flight request.

use std::fmt;

use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::error::FetchError;
use crate::response::ResponseObject;

/// Cache-vs-network precedence for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Skip the cache lookup; merge and deliver the network result.
    NetworkOnly,
    /// Serve from the store or fail with a miss; never touch the network.
    CacheOnly,
    /// Deliver a full cache hit, otherwise behave like `NetworkOnly`.
    CacheFirst,
    /// Deliver the network result, falling back to `CacheOnly` on failure.
    NetworkFirst,
    /// Run the cache lookup and the network call concurrently; the first
    /// success wins, and a losing network result still refreshes the store
    /// without reaching the caller.
    Race,
}

impl FetchPolicy {
    /// Label used in metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchPolicy::NetworkOnly => "network_only",
            FetchPolicy::CacheOnly => "cache_only",
            FetchPolicy::CacheFirst => "cache_first",
            FetchPolicy::NetworkFirst => "network_first",
            FetchPolicy::Race => "race",
        }
    }
}

impl fmt::Display for FetchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a fetch request: exactly one per caller-visible call.
pub type FetchOutcome = Result<ResponseObject, FetchError>;

/// Caller's end of an enqueued fetch request.
///
/// Dropping the handle, or calling [`FetchHandle::cancel`], abandons
/// delivery only: work already in flight runs to completion, and a merge
/// that started before cancellation still commits to the store.
pub struct FetchHandle {
    id: Uuid,
    rx: oneshot::Receiver<FetchOutcome>,
}

impl FetchHandle {
    pub(crate) fn new(id: Uuid, rx: oneshot::Receiver<FetchOutcome>) -> Self {
        Self { id, rx }
    }

    /// Identifier of this request, matching the engine's log fields.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Await the single terminal outcome.
    pub async fn outcome(self) -> FetchOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Cancelled),
        }
    }

    /// Abandon delivery. The underlying request is not interrupted.
    pub fn cancel(self) {
        debug!(request_id = %self.id, "Fetch request cancelled by caller");
        drop(self.rx);
    }
}
