//! The consumed network seam.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use crate::query::Query;

/// Executes queries against the backing service.
///
/// The engine only sees bytes in and structured errors out; request
/// encoding, HTTP, retries, and authentication all live behind this seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `query`, returning the raw response body.
    async fn execute(&self, query: &Query) -> Result<Bytes, TransportError>;
}
