//! Identity keys for cached records.
//!
//! Every record in the store lives under exactly one key. Identifiable
//! entities key as `{typename}:{id}` so two normalizations of the same
//! logical entity land on the same record regardless of which query shape
//! produced them; non-identifiable nodes key under a synthesized path
//! rooted at the owning query.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, type-scoped identifier for a cacheable entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Wrap a raw key string (path keys, roots, test fixtures).
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Key for an identifiable entity: `{typename}:{id}`.
    ///
    /// The typename prefix keeps identity type-scoped; two entities of
    /// different types never collide even when their id values match.
    pub fn entity(typename: &str, id: &str) -> Self {
        Self(format!("{typename}:{id}"))
    }

    /// The raw key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for IdentityKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
