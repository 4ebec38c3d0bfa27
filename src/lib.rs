//! trama: a normalized response cache for structured query clients.
//!
//! Responses to hierarchical queries are decomposed into flat,
//! identity-keyed records, merged field-wise into a shared record store,
//! and reassembled on read:
//!
//! - **Key resolution**: a [`KeyResolver`] derives a stable, type-scoped
//!   [`IdentityKey`] for each object from its field values, so the same
//!   logical entity lands on the same record regardless of query shape.
//! - **Normalize / denormalize**: [`normalize`] flattens a response tree
//!   into records, [`denormalize`] rebuilds a tree against a field
//!   selection and reports a structured [`CacheMiss`] instead of a partial
//!   result.
//! - **Record store**: [`RecordStore`] merges records field-wise (a later
//!   partial query never erases fields it did not request) with per-key
//!   atomicity under concurrency and optional LRU eviction.
//! - **Fetch strategies**: [`QueryClient`] orchestrates each query under a
//!   [`FetchPolicy`] (network-only, cache-only, cache-first, network-first,
//!   or racing both), delivering exactly one terminal outcome per request.
//!
//! ## Configuration
//!
//! [`CacheConfig`] deserializes with defaults, so host applications can
//! embed it in their own configuration files:
//!
//! ```toml
//! [cache]
//! record_limit = 10000        # 0 = unbounded, no eviction
//! change_log_limit = 1024
//! network_timeout_ms = 5000
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let client = QueryClient::new(CacheConfig::default(), KeyResolver::id(), transport);
//! let hero = client.fetch(query, FetchPolicy::CacheFirst).await?;
//! ```

pub mod changes;
pub mod client;
pub mod config;
pub mod denormalize;
pub mod error;
pub mod eviction;
pub mod fetch;
pub mod key;
mod lock;
pub mod normalize;
pub mod query;
pub mod record;
pub mod resolver;
pub mod response;
pub mod store;
pub mod telemetry;
pub mod transport;

pub use changes::{ChangeEvent, ChangeLog, Epoch};
pub use client::QueryClient;
pub use config::CacheConfig;
pub use denormalize::{RecordSource, denormalize};
pub use error::{CacheMiss, FetchError, TelemetryError, TransportError};
pub use eviction::EvictionPolicy;
pub use fetch::{FetchHandle, FetchOutcome, FetchPolicy};
pub use key::IdentityKey;
pub use normalize::{NormalizedDocument, normalize};
pub use query::{FieldSelection, Query, SelectionSet};
pub use record::{FieldValue, Record, ScalarValue, TYPENAME_FIELD};
pub use resolver::KeyResolver;
pub use response::{ResponseObject, ResponseValue};
pub use store::RecordStore;
pub use telemetry::LogFormat;
pub use transport::Transport;
