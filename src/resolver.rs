//! Cache-key resolution strategies.

use crate::key::IdentityKey;
use crate::response::{ResponseObject, ResponseValue};

/// How identity keys are derived from response objects.
///
/// A closed set of strategies chosen at client construction. Resolution is
/// pure and deterministic: it never consults the record store and never
/// fails. An object without a usable identity (declared field missing, null,
/// or structured) is simply not identifiable and is normalized inline under
/// a synthesized path key instead of being stored independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolver {
    /// Key objects by a declared identity field: `{typename}:{value}`.
    IdField { field: String },
    /// Nothing is identifiable; every record stores under a path key, so
    /// distinct queries never share entity records.
    None,
}

impl KeyResolver {
    /// Resolver keyed on the conventional `id` field.
    pub fn id() -> Self {
        Self::id_field("id")
    }

    pub fn id_field(field: impl Into<String>) -> Self {
        Self::IdField {
            field: field.into(),
        }
    }

    /// Derive the identity key for an object node, or `None` when the node
    /// is not identifiable.
    pub fn resolve(&self, object: &ResponseObject) -> Option<IdentityKey> {
        match self {
            KeyResolver::IdField { field } => match object.get(field) {
                Some(ResponseValue::Scalar(scalar)) => Some(IdentityKey::entity(
                    object.typename(),
                    &scalar.as_key_segment(),
                )),
                // Null, absent, or structured identity values all mean
                // "not identifiable" rather than an error.
                _ => None,
            },
            KeyResolver::None => None,
        }
    }
}
