//! Response denormalization: flat records back into hierarchical trees.

use crate::error::CacheMiss;
use crate::key::IdentityKey;
use crate::normalize::NormalizedDocument;
use crate::query::{FieldSelection, SelectionSet};
use crate::record::{FieldValue, Record, TYPENAME_FIELD};
use crate::response::{ResponseObject, ResponseValue};

/// Read access to a set of records.
///
/// Implemented by the shared record store and by a freshly normalized
/// document, so network-delivered results can be rebuilt from their own
/// fresh data without racing concurrent merges into the store.
pub trait RecordSource {
    /// The current record under `key`, cloned out, or `None`.
    fn record(&self, key: &IdentityKey) -> Option<Record>;
}

impl RecordSource for NormalizedDocument {
    fn record(&self, key: &IdentityKey) -> Option<Record> {
        NormalizedDocument::record(self, key).cloned()
    }
}

/// Rebuild the tree rooted at `root` for the requested selection.
///
/// Depth-first mirror of the normalizer. The first absent record, absent
/// requested field, or malformed stored shape aborts the read with a
/// structured miss naming the key and field; a partially-filled object is
/// never returned silently, so callers can distinguish a complete hit from
/// any miss and decide whether to fall through to the network.
pub fn denormalize<S>(
    source: &S,
    root: &IdentityKey,
    selection: &SelectionSet,
) -> Result<ResponseObject, CacheMiss>
where
    S: RecordSource + ?Sized,
{
    read_object(source, root, selection)
}

fn read_object<S>(
    source: &S,
    key: &IdentityKey,
    selection: &SelectionSet,
) -> Result<ResponseObject, CacheMiss>
where
    S: RecordSource + ?Sized,
{
    let record = source.record(key).ok_or_else(|| CacheMiss::record(key))?;

    // A record without its type tag cannot be reconstructed; a miss, not a
    // crash.
    let Some(typename) = record.typename() else {
        return Err(CacheMiss::field(key, TYPENAME_FIELD));
    };

    let mut object = ResponseObject::new(typename);
    for field in selection.fields() {
        let Some(value) = record.get(field.name()) else {
            return Err(CacheMiss::field(key, field.name()));
        };
        let value = read_value(source, key, field, value)?;
        object.set(field.name(), value);
    }
    Ok(object)
}

fn read_value<S>(
    source: &S,
    parent: &IdentityKey,
    field: &FieldSelection,
    value: &FieldValue,
) -> Result<ResponseValue, CacheMiss>
where
    S: RecordSource + ?Sized,
{
    match value {
        FieldValue::Null => Ok(ResponseValue::Null),
        FieldValue::Scalar(scalar) => {
            if field.is_leaf() {
                Ok(ResponseValue::Scalar(scalar.clone()))
            } else {
                // Subselection over a scalar: the stored shape no longer
                // matches the query.
                Err(CacheMiss::field(parent, field.name()))
            }
        }
        FieldValue::Reference(key) => {
            if field.is_leaf() {
                Err(CacheMiss::field(parent, field.name()))
            } else {
                Ok(ResponseValue::Object(read_object(
                    source,
                    key,
                    field.selection(),
                )?))
            }
        }
        FieldValue::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(read_value(source, parent, field, item)?);
            }
            Ok(ResponseValue::List(values))
        }
    }
}
