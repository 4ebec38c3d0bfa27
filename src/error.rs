//! Error taxonomy for the cache engine.
//!
//! Cache misses are signalled outcomes, not failures: they drive per-policy
//! fallthrough and only become terminal when no strategy leg is left.
//! Transport failures surface to the caller unless the strategy falls
//! through to the cache. No error ever aborts the record store itself.

use thiserror::Error;

use crate::key::IdentityKey;

/// Failures of the consumed network layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {message}")]
    Connection { message: String },
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
    #[error("server responded with status {status}")]
    Server { status: u16 },
    #[error("malformed payload: {message}")]
    Malformed { message: String },
}

impl TransportError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn timeout(elapsed_ms: u64) -> Self {
        Self::Timeout { elapsed_ms }
    }

    pub fn server(status: u16) -> Self {
        Self::Server { status }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// A structured cache miss: which key, and field, was unresolved.
///
/// Also covers malformed stored shapes (a record missing its type tag, a
/// scalar where the selection expects an object): the offending read fails,
/// the store stays intact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheMiss {
    #[error("record `{key}` is absent from the store")]
    AbsentRecord { key: IdentityKey },
    #[error("field `{field}` of record `{key}` is unresolved")]
    UnresolvedField { key: IdentityKey, field: String },
}

impl CacheMiss {
    pub fn record(key: &IdentityKey) -> Self {
        Self::AbsentRecord { key: key.clone() }
    }

    pub fn field(key: &IdentityKey, field: impl Into<String>) -> Self {
        Self::UnresolvedField {
            key: key.clone(),
            field: field.into(),
        }
    }

    /// The key the miss occurred on.
    pub fn key(&self) -> &IdentityKey {
        match self {
            Self::AbsentRecord { key } => key,
            Self::UnresolvedField { key, .. } => key,
        }
    }
}

/// Terminal failure of a fetch request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Miss(#[from] CacheMiss),
    #[error("fetch request was cancelled before delivery")]
    Cancelled,
}

/// Telemetry installation failures.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log directive `{directive}`")]
    Directive { directive: String },
    #[error("failed to install tracing subscriber: {message}")]
    Install { message: String },
}
